/// Checks a string of decimal digits against the Luhn (mod 10) checksum.
///
/// Every second digit, counting leftwards from the check digit, is doubled, and 9 is subtracted from doubled values
/// above 9. The number is valid when the sum of all digits is a multiple of 10.
///
/// Empty strings and strings containing anything other than ASCII digits are never valid.
pub fn is_valid_luhn(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (i, c) in number.bytes().rev().enumerate() {
        if !c.is_ascii_digit() {
            return false;
        }
        let mut digit = u32::from(c - b'0');
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}
