//! Domain models for FLEETHIRE.
//!
//! These are the core types shared across all crates.

pub mod accessory;
pub mod booking;
pub mod car;
pub mod driver;
pub mod stage;
pub mod status;
pub mod user;
