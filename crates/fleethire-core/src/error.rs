//! Error types for the FLEETHIRE system.

use thiserror::Error;

pub type FleetResult<T> = Result<T, FleetError>;

#[derive(Debug, Error)]
pub enum FleetError {
    // Input / format errors — rejected before storage is touched.
    #[error("invalid session token")]
    InvalidToken,

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    // Precondition / business errors — expected, reported verbatim.
    #[error("booking not ready")]
    BookingNotReady,

    #[error("booking duration out of bounds")]
    OutOfBounds,

    #[error("booking already canceled")]
    AlreadyCancelled,

    #[error("no payment needed")]
    NoPaymentNeeded,

    #[error("extension of this amount not allowed")]
    ExtensionNotAllowed,

    #[error("booking has overlap")]
    Overlap,

    #[error("session expired")]
    SessionExpired,

    #[error("session not found")]
    SessionNotFound,

    #[error("user is blacklisted")]
    UserBlacklisted,

    #[error("user does not meet age requirements")]
    AgeRequirement,

    #[error("car is not available")]
    CarUnavailable,

    #[error("cannot make a late booking without repeat status")]
    LateReturnNotAllowed,

    // Authorization errors — always fail closed.
    #[error("authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("user is not admin")]
    NotAdmin,

    #[error("this booking does not belong to this user")]
    NotOwner,

    // External-provider errors — distinguished so the caller can
    // trigger blacklisting/notification side effects.
    #[error("invalid licence")]
    InvalidLicence,

    #[error("fraudulent claim")]
    FraudulentClaim,

    #[error("driver is blacklisted")]
    DriverBlacklisted,

    // Infrastructure errors — propagated, never retried internally.
    #[error("entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("provider error: {0}")]
    Provider(String),
}
