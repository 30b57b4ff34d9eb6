use std::fmt::Debug;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2,
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
};
use log::*;

use crate::{
    db_types::{NewUser, User},
    traits::AuthManagement,
    AuthError,
};

pub const MAX_USERNAME_LENGTH: usize = 64;

/// Registration and login. Passwords are stored as argon2 hashes, never in the clear.
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a new user. Fails with [`AuthError::UsernameTaken`] if the username exists.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        validate_credentials(username, password)?;
        let password_hash = hash_password(password)?;
        let user = self.db.create_user(NewUser::new(username.to_string(), password_hash)).await?;
        info!("🔑️ New user #{} registered as {}", user.id, user.username);
        Ok(user)
    }

    /// Checks the username and password. Unknown users and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = self.db.fetch_user_by_username(username).await?.ok_or_else(|| {
            debug!("🔑️ Login attempt for unknown user {username}");
            AuthError::InvalidCredentials
        })?;
        if verify_password(password, &user.password_hash) {
            debug!("🔑️ User #{} logged in", user.id);
            Ok(user)
        } else {
            debug!("🔑️ Wrong password for user #{}", user.id);
            Err(AuthError::InvalidCredentials)
        }
    }

    pub async fn user(&self, user_id: i64) -> Result<Option<User>, AuthError> {
        Ok(self.db.fetch_user(user_id).await?)
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() || username.trim() != username {
        return Err(AuthError::InvalidInput("usernames cannot be blank or padded with whitespace".into()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidInput(format!("usernames are limited to {MAX_USERNAME_LENGTH} bytes")));
    }
    if password.is_empty() {
        return Err(AuthError::InvalidInput("the password cannot be empty".into()));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHashError(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}
