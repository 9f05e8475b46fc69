//! FLEETHIRE Booking — the rental lifecycle state machine.
//!
//! Customer operations (create, pay, extend, edit, cancel) and admin
//! operations (progress, driver verification, refunds, extra
//! payments) over the repository and provider traits defined in
//! `fleethire-core`. Every transition runs under a per-booking async
//! mutex so two calls can never interleave on the same booking.

mod admin;
mod locks;
pub mod requests;
mod service;

pub use requests::{
    AccountFlag, CreateBookingRequest, DocumentUpload, EditBookingRequest, ExtendBookingRequest,
    RefundDecision, VerifyDriverRequest,
};
pub use service::{BookingDetails, BookingService, BookingWithStatus, StageGroup};
