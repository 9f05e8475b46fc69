//! Typed request structs for the booking service boundary.

use chrono::NaiveDate;
use fleethire_core::providers::DocumentKind;
use uuid::Uuid;

/// Input for creating a booking.
#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub car_id: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub late_return: bool,
    pub full_day: bool,
    /// The decimal day count the client computed and displayed; must
    /// match the server-side calculation exactly.
    pub expected_days: f64,
    pub accessory_ids: Vec<Uuid>,
}

/// Input for editing a booking before collection.
#[derive(Debug, Clone)]
pub struct EditBookingRequest {
    pub late_return: bool,
    pub full_day: bool,
    pub add_accessories: Vec<Uuid>,
    pub remove_accessories: Vec<Uuid>,
}

/// Input for extending a collected booking.
#[derive(Debug, Clone, Copy)]
pub struct ExtendBookingRequest {
    /// Whole days to extend by, 1 to 14.
    pub days: i64,
    pub late_return: bool,
    pub full_day: bool,
}

/// One identity document uploaded at collection.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

/// Input for verifying the named driver at collection.
#[derive(Debug, Clone)]
pub struct VerifyDriverRequest {
    pub last_name: String,
    pub other_names: String,
    pub licence_number: String,
    pub address: String,
    pub postcode: String,
    pub dob: NaiveDate,
    pub documents: Vec<DocumentUpload>,
}

/// Admin decision on a queried refund.
#[derive(Debug, Clone)]
pub struct RefundDecision {
    pub accept: bool,
    pub reason: Option<String>,
}

/// Account flag an admin may set on a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountFlag {
    Disabled(bool),
    Blacklisted(bool),
    Admin(bool),
}
