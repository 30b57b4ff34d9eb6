use std::future::Future;

use thiserror::Error;

use crate::db_types::{NewUser, User};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The username {0} is already taken")]
    UserAlreadyExists(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// Storage of user credentials. Hashing and token issuance happen above this layer.
pub trait AuthManagement: Clone + Send + Sync + 'static {
    /// Creates a new user. Usernames are unique; a clash results in [`AuthApiError::UserAlreadyExists`].
    fn create_user(&self, user: NewUser) -> impl Future<Output = Result<User, AuthApiError>> + Send;

    fn fetch_user_by_username(&self, username: &str) -> impl Future<Output = Result<Option<User>, AuthApiError>> + Send;

    fn fetch_user(&self, user_id: i64) -> impl Future<Output = Result<Option<User>, AuthApiError>> + Send;
}
