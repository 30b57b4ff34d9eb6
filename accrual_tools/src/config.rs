use std::time::Duration;

use log::*;

pub const DEFAULT_ACCRUAL_ADDRESS: &str = "http://127.0.0.1:8081";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Base URL of the accrual service, e.g. `http://localhost:8081`.
    pub base_url: String,
    pub request_timeout: Duration,
    /// How long to back off after a 429 that carries no usable `Retry-After` header.
    pub default_retry_after: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ACCRUAL_ADDRESS.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            default_retry_after: DEFAULT_RETRY_AFTER,
        }
    }
}

impl AccrualConfig {
    pub fn new(address: &str) -> Self {
        Self { base_url: normalize_base_url(address), ..Default::default() }
    }

    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("ACCRUAL_SYSTEM_ADDRESS").map(|s| normalize_base_url(&s)).unwrap_or_else(|_| {
            warn!("🪛️ ACCRUAL_SYSTEM_ADDRESS not set, using {DEFAULT_ACCRUAL_ADDRESS}");
            DEFAULT_ACCRUAL_ADDRESS.to_string()
        });
        let request_timeout = seconds_from_env("GM_ACCRUAL_TIMEOUT", DEFAULT_REQUEST_TIMEOUT);
        let default_retry_after = seconds_from_env("GM_DEFAULT_RETRY_AFTER", DEFAULT_RETRY_AFTER);
        Self { base_url, request_timeout, default_retry_after }
    }
}

/// The accrual address is often given as a bare `host:port`. Give it a scheme and drop any trailing slash.
pub fn normalize_base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

fn seconds_from_env(var: &str, default: Duration) -> Duration {
    match std::env::var(var).ok().map(|s| s.parse::<u64>()) {
        Some(Ok(secs)) => Duration::from_secs(secs),
        Some(Err(e)) => {
            warn!("🪛️ Invalid value for {var}: {e}. Using the default of {}s", default.as_secs());
            default
        },
        None => default,
    }
}
