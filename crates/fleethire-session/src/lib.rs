//! FLEETHIRE Session — the in-process session store (dual-indexed,
//! lock-protected, lazy idle expiry) and the account service that
//! orchestrates it against the user repository.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

pub use config::SessionConfig;
pub use error::SessionError;
pub use service::{AccountService, LoginInput, LoginOutput, RegisterInput};
pub use store::{SessionStore, SessionView};
