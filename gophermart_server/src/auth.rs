//! Session tokens.
//!
//! Users get an HS256-signed JWT when they register or log in. The token is returned in the `Authorization` header
//! (as `Bearer <token>`) and in a cookie of the same name, and is accepted from either on later requests.
use std::future::{ready, Ready};

use actix_web::{
    cookie::{Cookie, SameSite},
    dev::Payload,
    http::header::AUTHORIZATION,
    web,
    FromRequest,
    HttpRequest,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const AUTH_COOKIE: &str = "Authorization";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.signing_key.reveal().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let ttl = chrono::Duration::from_std(config.token_ttl).unwrap_or_else(|_| chrono::Duration::minutes(10));
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn issue_token(&self, user_id: i64) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims =
            JwtClaims { sub: user_id.to_string(), iat: now.timestamp(), exp: (now + self.ttl).timestamp() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))
    }

    /// Checks the signature and expiry of `token` and returns the user id it was issued for.
    pub fn validate_token(&self, token: &str) -> Result<i64, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        data.claims.sub.parse::<i64>().map_err(|e| AuthError::ValidationError(format!("Invalid subject. {e}")))
    }

    /// The cookie that carries a freshly issued token.
    pub fn cookie<'c>(&self, token: &str) -> Cookie<'c> {
        Cookie::build(AUTH_COOKIE, token.to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .max_age(actix_web::cookie::time::Duration::seconds(self.ttl.num_seconds()))
            .finish()
    }
}

/// Pulls the token out of the `Authorization: Bearer` header, falling back to the `Authorization` cookie.
pub fn session_token(req: &HttpRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(|t| t.trim().to_string());
    from_header.or_else(|| {
        req.cookie(AUTH_COOKIE).map(|c| {
            let value = c.value();
            value.strip_prefix("Bearer ").unwrap_or(value).to_string()
        })
    })
}

/// The user a request was made on behalf of. Handlers that take this as an argument reject requests without a valid
/// session with a 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::InitializeError("No token issuer has been configured".into()))?;
    let token = session_token(req).ok_or(AuthError::MissingToken)?;
    let user_id = issuer.validate_token(&token).map_err(|e| {
        debug!("🔑️ Rejected session token. {e}");
        e
    })?;
    trace!("🔑️ Request authenticated for user #{user_id}");
    Ok(AuthenticatedUser { user_id })
}
