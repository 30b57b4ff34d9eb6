use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER},
    Client,
    StatusCode,
};

use crate::{AccrualApiError, AccrualConfig, AccrualOrder, AccrualReply};

#[derive(Clone)]
pub struct AccrualApi {
    config: AccrualConfig,
    client: Arc<Client>,
}

impl AccrualApi {
    pub fn new(config: AccrualConfig) -> Result<Self, AccrualApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AccrualApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &AccrualConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Ask the accrual service about a single order.
    ///
    /// Non-200 statuses are not errors; see [`AccrualReply`]. An error is returned only when the request could not be
    /// sent, the response could not be read, or a 200 body could not be decoded.
    pub async fn fetch_order(&self, order_number: &str) -> Result<AccrualReply, AccrualApiError> {
        if order_number.is_empty() || !order_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(AccrualApiError::InvalidOrderNumber(order_number.to_string()));
        }
        let url = self.url(&format!("/api/orders/{order_number}"));
        trace!("Querying accrual service: {url}");
        let response = self.client.get(url).send().await.map_err(|e| AccrualApiError::TransportError(e.to_string()))?;
        let status = response.status();
        match status {
            StatusCode::OK => {
                let order = response.json::<AccrualOrder>().await.map_err(|e| AccrualApiError::JsonError(e.to_string()))?;
                trace!("Accrual verdict for {order_number}: {order:?}");
                Ok(AccrualReply::Ready(order))
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let delay = retry_after(response.headers()).unwrap_or_else(|| {
                    debug!("429 for {order_number} had no usable Retry-After header");
                    self.config.default_retry_after
                });
                Ok(AccrualReply::RateLimited(delay))
            },
            StatusCode::INTERNAL_SERVER_ERROR => Ok(AccrualReply::Unavailable),
            other => {
                debug!("Accrual service replied {other} for order {order_number}");
                Ok(AccrualReply::Unexpected(other.as_u16()))
            },
        }
    }
}

/// `Retry-After` may also be an HTTP date, which the accrual service never sends. Only delay-seconds are supported.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse::<u64>().ok().map(Duration::from_secs)
}
