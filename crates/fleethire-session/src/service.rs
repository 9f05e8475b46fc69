//! Account service — login, logout and session validation
//! orchestration.

use std::sync::Arc;

use fleethire_core::error::{FleetError, FleetResult};
use fleethire_core::models::user::{CreateUser, User};
use fleethire_core::repository::UserRepository;
use chrono::NaiveDate;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::password;
use crate::store::SessionStore;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Opaque session token (8-4-4-4-12 shape).
    pub token: String,
    pub user: User,
}

/// Input for account registration.
#[derive(Debug)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub dob: NaiveDate,
}

/// Account service.
///
/// Generic over the user repository so that the session layer has no
/// dependency on the database crate. Owns a shared [`SessionStore`].
pub struct AccountService<U: UserRepository> {
    users: U,
    sessions: Arc<SessionStore>,
    config: SessionConfig,
}

impl<U: UserRepository> AccountService<U> {
    pub fn new(users: U, sessions: Arc<SessionStore>, config: SessionConfig) -> Self {
        Self {
            users,
            sessions,
            config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Authenticate with email + password.
    ///
    /// If the identity already holds a live session its token is
    /// reused (one live session per identity); otherwise a fresh
    /// session is created.
    pub async fn login(&self, input: LoginInput) -> FleetResult<LoginOutput> {
        // 1. Prefer the cached profile when a live session exists.
        let (user, existing_token) = match self.sessions.get_by_email(&input.email) {
            Ok(view) => (view.user, Some(view.token)),
            Err(SessionError::NotFound | SessionError::Expired) => {
                let user = self
                    .users
                    .get_by_email(&input.email)
                    .await
                    .map_err(|e| match e {
                        FleetError::NotFound { .. } => SessionError::InvalidCredentials.into(),
                        other => other,
                    })?;
                (user, None)
            }
            Err(other) => return Err(other.into()),
        };

        // 2. Verify password.
        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )
        .map_err(FleetError::from)?;
        if !valid {
            return Err(SessionError::InvalidCredentials.into());
        }

        // 3. Check account status.
        if user.disabled {
            return Err(SessionError::AccountDisabled.into());
        }

        // 4. Reuse or create the session.
        let token = match existing_token {
            Some(token) => token,
            None => self.sessions.create(&user),
        };

        debug!(user = %user.id, "login succeeded");
        Ok(LoginOutput { token, user })
    }

    /// Delete the caller's session.
    pub async fn logout(&self, token: &str) -> FleetResult<()> {
        self.sessions.delete(token).map_err(FleetError::from)
    }

    /// Resolve a session and refresh the cached profile from storage.
    ///
    /// Falls back to the cached copy if the re-read fails, matching
    /// the store's role as the source of truth for liveness only.
    pub async fn validate_session(&self, token: &str) -> FleetResult<User> {
        let view = self.sessions.get_by_token(token)?;

        match self.users.get_by_id(view.user.id).await {
            Ok(fresh) => {
                self.sessions.update_user(token, fresh.clone())?;
                Ok(fresh)
            }
            Err(err) => {
                debug!(user = %view.user.id, error = %err, "profile refresh failed, using cached copy");
                Ok(view.user)
            }
        }
    }

    /// Resolve the acting user for a request without touching
    /// storage. Used by the booking services.
    pub fn current_user(&self, token: &str) -> FleetResult<User> {
        Ok(self.sessions.get_by_token(token)?.user)
    }

    /// Register a new account.
    pub async fn register(&self, input: RegisterInput) -> FleetResult<User> {
        validate_email(&input.email)?;
        if input.password.len() < self.config.min_password_length {
            return Err(SessionError::InvalidRegistration(format!(
                "password must be at least {} characters",
                self.config.min_password_length
            ))
            .into());
        }

        match self.users.get_by_email(&input.email).await {
            Ok(_) => return Err(SessionError::AlreadyExists.into()),
            Err(FleetError::NotFound { .. }) => {}
            Err(other) => return Err(other),
        }

        let password_hash =
            password::hash_password(&input.password, self.config.pepper.as_deref())
                .map_err(FleetError::from)?;

        self.users
            .create(CreateUser {
                email: input.email,
                full_name: input.full_name,
                password_hash,
                dob: input.dob,
            })
            .await
    }

    /// Count of active sessions ("active users" reporting).
    pub fn active_sessions(&self) -> usize {
        self.sessions.count()
    }
}

fn validate_email(email: &str) -> Result<(), SessionError> {
    let ok = email.len() >= 3
        && email.len() <= 254
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        });
    if ok {
        Ok(())
    } else {
        Err(SessionError::InvalidRegistration("invalid email".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@missing-local.com").is_err());
        assert!(validate_email("x@.bad").is_err());
        assert!(validate_email("x@nodot").is_err());
    }
}
