use thiserror::Error;

use crate::{
    db_types::{OrderNumber, Points},
    traits::{AuthApiError, LedgerError},
};

/// Errors from submitting orders, withdrawing points and reconciling accruals.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid order number: {0}")]
    BadOrderNumber(String),
    #[error("Withdrawal amounts must be positive. Got {0}")]
    InvalidAmount(Points),
    #[error("Order {0} belongs to another user")]
    OrderClaimedByOtherUser(OrderNumber),
    #[error("Order number {0} is already in use")]
    OrderNumberInUse(OrderNumber),
    #[error("Insufficient balance. Requested {requested}, but only {available} is available")]
    InsufficientBalance { available: Points, requested: Points },
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<LedgerError> for OrderFlowError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DatabaseError(s) => Self::DatabaseError(s),
            LedgerError::AlreadyInsertedByOther(n) => Self::OrderClaimedByOtherUser(n),
            LedgerError::AlreadyInsertedBySelf(n) | LedgerError::OrderNumberInUse(n) => Self::OrderNumberInUse(n),
            LedgerError::InsufficientBalance { available, requested } => {
                Self::InsufficientBalance { available, requested }
            },
            LedgerError::OrderNotFound(n) => Self::OrderNotFound(n),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AccountError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<LedgerError> for AccountError {
    fn from(e: LedgerError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("The username {0} is already taken")]
    UsernameTaken(String),
    #[error("Invalid registration details: {0}")]
    InvalidInput(String),
    #[error("Could not hash password: {0}")]
    PasswordHashError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AuthApiError> for AuthError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::DatabaseError(s) => Self::DatabaseError(s),
            AuthApiError::UserAlreadyExists(name) => Self::UsernameTaken(name),
        }
    }
}
