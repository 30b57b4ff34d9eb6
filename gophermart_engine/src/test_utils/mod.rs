#[cfg(feature = "sqlite")]
pub mod prepare_env;

/// Appends a Luhn check digit to `seed`, giving a valid order number. Handy for generating lots of distinct orders.
pub fn valid_order_number(seed: u64) -> String {
    let body = seed.to_string();
    let sum: u32 = body
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, c)| {
            let d = u32::from(c - b'0');
            // The check digit will sit at position 0, so the body's rightmost digit is doubled
            if i % 2 == 0 {
                let d = d * 2;
                if d > 9 {
                    d - 9
                } else {
                    d
                }
            } else {
                d
            }
        })
        .sum();
    let check = (10 - sum % 10) % 10;
    format!("{body}{check}")
}
