//! Session token codec and cookie plumbing.
//!
//! The in-progress intake travels as an HS256-signed token in the
//! `register_session` cookie: a [`Claims`] payload wrapping the core
//! [`Session`] value object plus expiry. The domain crate never sees
//! cookies; everything transport-shaped lives here.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use register_core::session::Session;

use crate::error::AppError;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "register_session";

/// Default session lifetime in hours.
const DEFAULT_EXPIRY_HOURS: i64 = 12;

/// Claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The intake session itself.
    #[serde(flatten)]
    pub session: Session,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Configuration for session token generation and validation.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Session lifetime in hours (default: 12).
    pub expiry_hours: i64,
}

impl SessionConfig {
    /// Load session configuration from environment variables.
    ///
    /// | Env Var                | Required | Default |
    /// |------------------------|----------|---------|
    /// | `SESSION_SECRET`       | **yes**  | --      |
    /// | `SESSION_EXPIRY_HOURS` | no       | `12`    |
    ///
    /// # Panics
    ///
    /// Panics if `SESSION_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("SESSION_SECRET").expect("SESSION_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "SESSION_SECRET must not be empty");

        let expiry_hours: i64 = std::env::var("SESSION_EXPIRY_HOURS")
            .unwrap_or_else(|_| DEFAULT_EXPIRY_HOURS.to_string())
            .parse()
            .expect("SESSION_EXPIRY_HOURS must be a valid i64");

        Self {
            secret,
            expiry_hours,
        }
    }
}

/// Sign a session into a token string.
pub fn encode_session(
    session: &Session,
    config: &SessionConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        session: session.clone(),
        exp: now + config.expiry_hours * 3600,
        iat: now,
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode a session token.
///
/// Validates the signature and expiration automatically.
pub fn decode_session(
    token: &str,
    config: &SessionConfig,
) -> Result<Session, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims.session)
}

/// `Set-Cookie` value carrying a freshly signed session.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value that clears the session on the client.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// The intake session extracted from the `register_session` cookie.
///
/// Use this as an extractor parameter in any handler that requires an
/// in-progress intake. A missing, malformed, or expired cookie rejects
/// with 401 `SESSION_EXPIRED`.
#[derive(Debug, Clone)]
pub struct SessionCookie(pub Session);

impl FromRequestParts<AppState> for SessionCookie {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie_header = parts
            .headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::SessionExpired("Missing session cookie".into()))?;

        let token = find_cookie(cookie_header, SESSION_COOKIE)
            .ok_or_else(|| AppError::SessionExpired("Missing session cookie".into()))?;

        let session = decode_session(token, &state.config.session)
            .map_err(|_| AppError::SessionExpired("Invalid or expired session".into()))?;

        Ok(SessionCookie(session))
    }
}

/// Pull one cookie value out of a `Cookie` header.
fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}
