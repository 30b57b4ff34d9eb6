use std::fmt::Display;

use chrono::{DateTime, Utc};
use gophermart_engine::db_types::{LedgerEntry, OrderStatusType, Points};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// One line of `GET /api/user/orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub number: String,
    pub status: OrderStatusType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<LedgerEntry> for OrderResult {
    fn from(entry: LedgerEntry) -> Self {
        let accrual = entry.accrual();
        Self { number: entry.order_number.as_str().to_string(), status: entry.status, accrual, uploaded_at: entry.created_at }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub order: String,
    pub sum: Points,
}

/// One line of `GET /api/user/withdrawals`. `sum` is reported as a positive number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalResult {
    pub order: String,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

impl From<LedgerEntry> for WithdrawalResult {
    fn from(entry: LedgerEntry) -> Self {
        Self { order: entry.order_number.as_str().to_string(), sum: -entry.amount, processed_at: entry.created_at }
    }
}
