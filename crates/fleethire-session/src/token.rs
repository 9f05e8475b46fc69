//! Session token generation and shape validation.
//!
//! Tokens are opaque 36-character identifiers in 8-4-4-4-12
//! hyphenated groups. The shape is checked before the store is
//! touched so malformed input fails fast.

use uuid::Uuid;

use crate::error::SessionError;

const TOKEN_LEN: usize = 36;
const GROUP_LENGTHS: [usize; 5] = [8, 4, 4, 4, 12];

/// Generate a fresh random session token.
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}

/// Validate the 8-4-4-4-12 token shape.
pub fn validate_format(token: &str) -> Result<(), SessionError> {
    if token.len() != TOKEN_LEN {
        return Err(SessionError::InvalidToken);
    }
    if token.bytes().filter(|&b| b == b'-').count() != 4 {
        return Err(SessionError::InvalidToken);
    }

    for (part, expected) in token.split('-').zip(GROUP_LENGTHS) {
        if part.len() != expected {
            return Err(SessionError::InvalidToken);
        }
    }

    Ok(())
}
