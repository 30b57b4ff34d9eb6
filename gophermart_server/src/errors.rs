use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use gophermart_engine::{AccountError, OrderFlowError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Unsupported content type. Expected {0}")]
    UnsupportedContentType(&'static str),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    InsufficientBalance(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedContentType(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::CouldNotIssueToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InsufficientBalance(_) => StatusCode::PAYMENT_REQUIRED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Backend details stay in the log
        let message = if status.is_server_error() {
            error!("💻️ {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": message }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No session token was provided.")]
    MissingToken,
    #[error("Session token is invalid. {0}")]
    ValidationError(String),
    #[error("Session token has expired.")]
    ExpiredToken,
    #[error("Session token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Invalid login or password.")]
    InvalidCredentials,
    #[error("Could not issue a session token. {0}")]
    CouldNotIssueToken(String),
}

impl From<gophermart_engine::AuthError> for ServerError {
    fn from(e: gophermart_engine::AuthError) -> Self {
        use gophermart_engine::AuthError as E;
        match e {
            E::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            E::UsernameTaken(_) => Self::Conflict(e.to_string()),
            E::InvalidInput(_) => Self::InvalidRequestBody(e.to_string()),
            E::PasswordHashError(_) | E::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

/// The mapping used for order submissions. Withdrawals remap a few of these, see
/// [`crate::routes::withdraw`].
impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::BadOrderNumber(_) | OrderFlowError::InvalidAmount(_) => {
                Self::UnprocessableEntity(e.to_string())
            },
            OrderFlowError::OrderClaimedByOtherUser(_) | OrderFlowError::OrderNumberInUse(_) => {
                Self::Conflict(e.to_string())
            },
            OrderFlowError::InsufficientBalance { .. } => Self::InsufficientBalance(e.to_string()),
            OrderFlowError::OrderNotFound(_) | OrderFlowError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<AccountError> for ServerError {
    fn from(e: AccountError) -> Self {
        Self::BackendError(e.to_string())
    }
}
