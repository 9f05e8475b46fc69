//! Booking lifecycle stages.
//!
//! Every stage carries a stable integer code (the order the original
//! rental system introduced them in, which admin screens and the
//! status log rely on). The happy path is strictly ordered by code up
//! to `BookingConfirmed`, then continues through `Collected`,
//! `Returned` and `Completed`; side stages (edits, extensions,
//! refunds, identity checks) branch off at fixed points.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    AwaitingPayment,
    PaymentAccepted,
    AwaitingConfirmation,
    BookingConfirmed,
    BookingEdited,
    EditAwaitingPayment,
    EditPaymentAccepted,
    QueryingRefund,
    RefundRejected,
    RefundIssued,
    Cancelled,
    Collected,
    Returned,
    Completed,
    Extended,
    ExtensionAwaitingPayment,
    ExtensionPaymentAccepted,
    AbiCheck,
    DvlaCheck,
}

/// Legal main-stage transitions for a booking's `process` field.
/// Cancellation from any non-terminal stage is handled separately by
/// [`Stage::can_transition`]; everything else must appear here.
const TRANSITIONS: &[(Stage, Stage)] = &[
    (Stage::AwaitingPayment, Stage::AwaitingConfirmation),
    (Stage::AwaitingConfirmation, Stage::BookingConfirmed),
    (Stage::BookingConfirmed, Stage::Collected),
    (Stage::Collected, Stage::Returned),
    (Stage::Returned, Stage::Completed),
];

impl Stage {
    pub const fn code(self) -> i64 {
        match self {
            Stage::AwaitingPayment => 1,
            Stage::PaymentAccepted => 2,
            Stage::AwaitingConfirmation => 3,
            Stage::BookingConfirmed => 4,
            Stage::BookingEdited => 5,
            Stage::EditAwaitingPayment => 6,
            Stage::EditPaymentAccepted => 7,
            Stage::QueryingRefund => 8,
            Stage::RefundRejected => 9,
            Stage::RefundIssued => 10,
            Stage::Cancelled => 11,
            Stage::Collected => 12,
            Stage::Returned => 13,
            Stage::Completed => 14,
            Stage::Extended => 15,
            Stage::ExtensionAwaitingPayment => 16,
            Stage::ExtensionPaymentAccepted => 17,
            Stage::AbiCheck => 18,
            Stage::DvlaCheck => 19,
        }
    }

    pub fn from_code(code: i64) -> Option<Stage> {
        Some(match code {
            1 => Stage::AwaitingPayment,
            2 => Stage::PaymentAccepted,
            3 => Stage::AwaitingConfirmation,
            4 => Stage::BookingConfirmed,
            5 => Stage::BookingEdited,
            6 => Stage::EditAwaitingPayment,
            7 => Stage::EditPaymentAccepted,
            8 => Stage::QueryingRefund,
            9 => Stage::RefundRejected,
            10 => Stage::RefundIssued,
            11 => Stage::Cancelled,
            12 => Stage::Collected,
            13 => Stage::Returned,
            14 => Stage::Completed,
            15 => Stage::Extended,
            16 => Stage::ExtensionAwaitingPayment,
            17 => Stage::ExtensionPaymentAccepted,
            18 => Stage::AbiCheck,
            19 => Stage::DvlaCheck,
            _ => return None,
        })
    }

    /// `Cancelled` and `Completed` admit no further progression.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Stage::Cancelled | Stage::Completed)
    }

    /// The single next stage an admin progression moves to from
    /// `self`, or `None` if progression is not defined here.
    pub fn progress_target(self) -> Option<Stage> {
        match self {
            Stage::AwaitingConfirmation => Some(Stage::BookingConfirmed),
            Stage::BookingConfirmed => Some(Stage::Collected),
            Stage::Collected => Some(Stage::Returned),
            Stage::Returned => Some(Stage::Completed),
            _ => None,
        }
    }

    /// Whether `self -> to` is a legal main-stage transition.
    pub fn can_transition(self, to: Stage) -> bool {
        if to == Stage::Cancelled {
            return !self.is_terminal();
        }
        TRANSITIONS.contains(&(self, to))
    }

    /// Happy-path ordering check, by stable code. `Collected`,
    /// `Returned` and `Completed` sort after `BookingConfirmed` by
    /// construction of the code assignment.
    pub fn at_or_past(self, other: Stage) -> bool {
        self.code() >= other.code()
    }
}
