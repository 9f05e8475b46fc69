//! The in-process session store.
//!
//! Sessions are dual-indexed — by token and by user identity (email)
//! — behind a single store-level reader/writer lock. Each session bag
//! additionally carries its own lock so that bumping the last-active
//! time never takes the store-wide write lock. Expiry is lazy: there
//! is no background sweep, so an abandoned session lingers until the
//! next lookup finds it stale. Both indices always point at the same
//! bag, and one identity holds at most one live session at a time
//! ([`SessionStore::create`] purges any prior session for the same
//! email before inserting).

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use fleethire_core::models::user::User;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::token;

/// Snapshot of one session returned by lookups.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub token: String,
    /// Copy of the authenticated user's profile at the time of the
    /// last refresh.
    pub user: User,
}

struct BagState {
    user: User,
    last_active: DateTime<Utc>,
}

/// One session record. The token and email are immutable for the
/// bag's lifetime; the cached profile and last-active stamp sit
/// behind the bag's own lock.
struct SessionBag {
    token: String,
    email: String,
    state: RwLock<BagState>,
}

impl SessionBag {
    fn user(&self) -> User {
        read(&self.state).user.clone()
    }

    /// Refreshes the last-active stamp if the idle window has not
    /// elapsed. Returns false when the session is stale.
    fn touch(&self, idle_timeout: Duration, now: DateTime<Utc>) -> bool {
        let mut state = write(&self.state);
        if now - state.last_active > idle_timeout {
            return false;
        }
        state.last_active = now;
        true
    }
}

#[derive(Default)]
struct Indexes {
    by_token: HashMap<String, Arc<SessionBag>>,
    by_email: HashMap<String, Arc<SessionBag>>,
}

impl Indexes {
    /// Drop `bag` from both indices. Each entry is removed only while
    /// it still points at this exact bag: a lazy reap of a stale bag
    /// must not evict a newer session inserted under the same email
    /// in the meantime.
    fn remove(&mut self, bag: &Arc<SessionBag>) {
        if self
            .by_token
            .get(&bag.token)
            .is_some_and(|current| Arc::ptr_eq(current, bag))
        {
            self.by_token.remove(&bag.token);
        }
        if self
            .by_email
            .get(&bag.email)
            .is_some_and(|current| Arc::ptr_eq(current, bag))
        {
            self.by_email.remove(&bag.email);
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe cache of active login sessions with idle-timeout
/// expiry. Injectable — own one per process, or several in tests.
pub struct SessionStore {
    inner: RwLock<Indexes>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            inner: RwLock::new(Indexes::default()),
            idle_timeout: config.idle_timeout,
        }
    }

    /// Create a session for `user` and return its token. Any prior
    /// session for the same identity is deleted first so each
    /// identity holds at most one live token.
    pub fn create(&self, user: &User) -> String {
        let tok = token::generate();
        let bag = Arc::new(SessionBag {
            token: tok.clone(),
            email: user.email.clone(),
            state: RwLock::new(BagState {
                user: user.clone(),
                last_active: Utc::now(),
            }),
        });

        let mut inner = write(&self.inner);
        if let Some(old) = inner.by_email.remove(&bag.email) {
            inner.by_token.remove(&old.token);
        }
        inner.by_token.insert(tok.clone(), Arc::clone(&bag));
        inner.by_email.insert(bag.email.clone(), bag);
        tok
    }

    /// Resolve a session by token, refreshing its last-active stamp.
    /// The token shape is validated before the store is touched.
    pub fn get_by_token(&self, tok: &str) -> Result<SessionView, SessionError> {
        token::validate_format(tok)?;
        let bag = read(&self.inner)
            .by_token
            .get(tok)
            .cloned()
            .ok_or(SessionError::NotFound)?;
        self.check_and_refresh(bag)
    }

    /// Resolve a session by user identity. Same expiry semantics as
    /// [`Self::get_by_token`].
    pub fn get_by_email(&self, email: &str) -> Result<SessionView, SessionError> {
        let bag = read(&self.inner)
            .by_email
            .get(email)
            .cloned()
            .ok_or(SessionError::NotFound)?;
        self.check_and_refresh(bag)
    }

    fn check_and_refresh(&self, bag: Arc<SessionBag>) -> Result<SessionView, SessionError> {
        if !bag.touch(self.idle_timeout, Utc::now()) {
            // Lazy expiry: reap from both indices on discovery.
            write(&self.inner).remove(&bag);
            return Err(SessionError::Expired);
        }
        Ok(SessionView {
            token: bag.token.clone(),
            user: bag.user(),
        })
    }

    /// Replace the cached profile in place (after a profile edit)
    /// without issuing a new token.
    pub fn update_user(&self, tok: &str, user: User) -> Result<(), SessionError> {
        token::validate_format(tok)?;
        let bag = read(&self.inner)
            .by_token
            .get(tok)
            .cloned()
            .ok_or(SessionError::NotFound)?;
        write(&bag.state).user = user;
        Ok(())
    }

    /// Remove a session from both indices.
    pub fn delete(&self, tok: &str) -> Result<(), SessionError> {
        token::validate_format(tok)?;
        let mut inner = write(&self.inner);
        let bag = inner.by_token.get(tok).cloned().ok_or(SessionError::NotFound)?;
        inner.remove(&bag);
        Ok(())
    }

    /// Count of currently-indexed sessions. May include sessions that
    /// are stale but not yet lazily reaped.
    pub fn count(&self) -> usize {
        read(&self.inner).by_token.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn test_user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.into(),
            full_name: "Alice Example".into(),
            password_hash: String::new(),
            dob: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            blacklisted: false,
            disabled: false,
            verified: true,
            repeat: false,
            admin: false,
            created_at: Utc::now(),
        }
    }

    fn store_with_timeout(idle: Duration) -> SessionStore {
        SessionStore::new(&SessionConfig {
            idle_timeout: idle,
            ..SessionConfig::default()
        })
    }

    #[test]
    fn round_trip_returns_same_identity() {
        let store = store_with_timeout(Duration::hours(1));
        let user = test_user("alice@example.com");
        let tok = store.create(&user);

        let view = store.get_by_token(&tok).unwrap();
        assert_eq!(view.user.id, user.id);
        assert_eq!(view.token, tok);

        let by_email = store.get_by_email("alice@example.com").unwrap();
        assert_eq!(by_email.token, tok);
    }

    #[test]
    fn malformed_token_rejected_before_lookup() {
        let store = store_with_timeout(Duration::hours(1));
        assert!(matches!(
            store.get_by_token("not-a-token"),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn unknown_token_not_found() {
        let store = store_with_timeout(Duration::hours(1));
        let phantom = token::generate();
        assert!(matches!(
            store.get_by_token(&phantom),
            Err(SessionError::NotFound)
        ));
    }

    #[test]
    fn idle_session_expires_and_leaves_both_indices() {
        let store = store_with_timeout(Duration::zero());
        let user = test_user("bob@example.com");
        let tok = store.create(&user);

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(matches!(
            store.get_by_token(&tok),
            Err(SessionError::Expired)
        ));
        // Reaped from both indices, not just the token index.
        assert!(matches!(
            store.get_by_token(&tok),
            Err(SessionError::NotFound)
        ));
        assert!(matches!(
            store.get_by_email("bob@example.com"),
            Err(SessionError::NotFound)
        ));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn create_purges_prior_session_for_same_identity() {
        let store = store_with_timeout(Duration::hours(1));
        let user = test_user("carol@example.com");
        let first = store.create(&user);
        let second = store.create(&user);

        assert_ne!(first, second);
        assert_eq!(store.count(), 1);
        // The first token no longer resolves; no orphaned entry.
        assert!(matches!(
            store.get_by_token(&first),
            Err(SessionError::NotFound)
        ));
        assert_eq!(store.get_by_email("carol@example.com").unwrap().token, second);
    }

    #[test]
    fn update_user_swaps_profile_without_new_token() {
        let store = store_with_timeout(Duration::hours(1));
        let user = test_user("dave@example.com");
        let tok = store.create(&user);

        let mut edited = user.clone();
        edited.full_name = "Dave Renamed".into();
        store.update_user(&tok, edited).unwrap();

        let view = store.get_by_token(&tok).unwrap();
        assert_eq!(view.user.full_name, "Dave Renamed");
        assert_eq!(view.token, tok);
    }

    #[test]
    fn delete_removes_both_indices() {
        let store = store_with_timeout(Duration::hours(1));
        let user = test_user("erin@example.com");
        let tok = store.create(&user);

        store.delete(&tok).unwrap();
        assert!(store.get_by_token(&tok).is_err());
        assert!(store.get_by_email("erin@example.com").is_err());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn lookups_refresh_last_active() {
        // A touch inside the window keeps the session alive past the
        // original deadline.
        let store = store_with_timeout(Duration::milliseconds(80));
        let user = test_user("faye@example.com");
        let tok = store.create(&user);

        for _ in 0..4 {
            std::thread::sleep(std::time::Duration::from_millis(30));
            store.get_by_token(&tok).unwrap();
        }
    }

    #[test]
    fn stale_reap_leaves_replacement_session_intact() {
        let store = store_with_timeout(Duration::milliseconds(50));
        let user = test_user("gina@example.com");
        let tok1 = store.create(&user);

        // A lookup clones the bag before touching it; hold that clone
        // across a re-login, as a racing thread would.
        let stale = read(&store.inner).by_token.get(&tok1).cloned().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(80));
        let tok2 = store.create(&user);

        // The stale bag's reap must not evict the fresh session.
        assert!(matches!(
            store.check_and_refresh(stale),
            Err(SessionError::Expired)
        ));
        assert_eq!(store.get_by_email("gina@example.com").unwrap().token, tok2);
        assert_eq!(store.get_by_token(&tok2).unwrap().token, tok2);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn concurrent_refreshes_do_not_lose_sessions() {
        let store = Arc::new(store_with_timeout(Duration::hours(1)));
        let tokens: Vec<String> = (0..8)
            .map(|i| store.create(&test_user(&format!("user{i}@example.com"))))
            .collect();

        let handles: Vec<_> = tokens
            .iter()
            .map(|tok| {
                let store = Arc::clone(&store);
                let tok = tok.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.get_by_token(&tok).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.count(), 8);
    }
}
