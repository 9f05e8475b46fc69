//! Driver identity/licence record.
//!
//! Created lazily the first time a named driver is verified; mutated
//! only to set the blacklist flag; never deleted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlacklistReason {
    InvalidLicence,
    FraudulentClaim,
    Manual,
}

impl BlacklistReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            BlacklistReason::InvalidLicence => "invalid_licence",
            BlacklistReason::FraudulentClaim => "fraudulent_claim",
            BlacklistReason::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "invalid_licence" => Some(BlacklistReason::InvalidLicence),
            "fraudulent_claim" => Some(BlacklistReason::FraudulentClaim),
            "manual" => Some(BlacklistReason::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub last_name: String,
    pub other_names: String,
    pub licence_number: String,
    pub address: String,
    pub postcode: String,
    pub dob: NaiveDate,
    pub blacklisted: bool,
    pub blacklist_reason: Option<BlacklistReason>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDriver {
    pub last_name: String,
    pub other_names: String,
    pub licence_number: String,
    pub address: String,
    pub postcode: String,
    pub dob: NaiveDate,
    pub blacklisted: bool,
    pub blacklist_reason: Option<BlacklistReason>,
}
