//! Session error types.

use fleethire_core::error::FleetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Token fails the 8-4-4-4-12 shape check.
    #[error("invalid token")]
    InvalidToken,

    #[error("session not found")]
    NotFound,

    #[error("session expired")]
    Expired,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("account already exists")]
    AlreadyExists,

    #[error("invalid registration: {0}")]
    InvalidRegistration(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<SessionError> for FleetError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidToken => FleetError::InvalidToken,
            SessionError::NotFound => FleetError::SessionNotFound,
            SessionError::Expired => FleetError::SessionExpired,
            SessionError::InvalidCredentials | SessionError::AccountDisabled => {
                FleetError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            SessionError::AlreadyExists => FleetError::AlreadyExists {
                entity: "user".into(),
            },
            SessionError::InvalidRegistration(message) => FleetError::InvalidInput { message },
            SessionError::Crypto(msg) => FleetError::Provider(msg),
        }
    }
}
