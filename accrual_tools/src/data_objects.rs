use std::time::Duration;

use gm_common::Points;
use serde::{Deserialize, Serialize};

/// The status vocabulary of the accrual service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    /// The order is known to the service but has not been looked at yet.
    Registered,
    /// The order will never earn points.
    Invalid,
    Processing,
    /// Final. `accrual` holds the awarded amount, if any.
    Processed,
    /// Anything this client does not know about yet.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualOrder {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
}

/// Every outcome of a single accrual query that the caller needs to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualReply {
    /// 200. The service returned a verdict for the order.
    Ready(AccrualOrder),
    /// 429. Nobody should call the service again before the given delay has passed.
    RateLimited(Duration),
    /// 500. The service is having trouble; try again on a later cycle.
    Unavailable,
    /// Any other status code, including 204 for an order the service has not registered.
    Unexpected(u16),
}
