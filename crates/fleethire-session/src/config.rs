//! Session and account-service configuration.

use chrono::Duration;

/// Configuration for the session store and account service.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a session may sit idle before the next lookup reaps
    /// it (default: 1 hour).
    pub idle_timeout: Duration,
    /// Optional pepper prepended to passwords before Argon2id
    /// hashing/verification.
    pub pepper: Option<String>,
    /// Minimum password length for registration (default: 8).
    pub min_password_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::hours(1),
            pepper: None,
            min_password_length: 8,
        }
    }
}
