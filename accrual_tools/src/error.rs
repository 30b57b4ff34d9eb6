use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccrualApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid order number for a request path: {0}")]
    InvalidOrderNumber(String),
    #[error("Request to the accrual service failed: {0}")]
    TransportError(String),
    #[error("Could not deserialize accrual response: {0}")]
    JsonError(String),
}
