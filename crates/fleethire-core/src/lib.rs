//! FLEETHIRE Core — domain models, error taxonomy, repository and
//! provider trait definitions, and the pure pricing/availability
//! engine shared across all crates.

pub mod error;
pub mod models;
pub mod pricing;
pub mod providers;
pub mod repository;

pub use error::{FleetError, FleetResult};
