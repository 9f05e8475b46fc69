//! Admin lifecycle: progression, driver verification, refunds and
//! account flags.

mod common;

use common::{Harness, date, setup};
use fleethire_booking::{
    AccountFlag, CreateBookingRequest, RefundDecision, VerifyDriverRequest,
};
use fleethire_core::error::FleetError;
use fleethire_core::models::driver::BlacklistReason;
use fleethire_core::models::stage::Stage;
use fleethire_core::repository::{DriverRepository, StatusRepository, UserRepository};
use fleethire_providers::{ClaimRecord, FraudTable, LicenceFlag, LicenceTable};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

fn three_day_request(car_id: Uuid) -> CreateBookingRequest {
    CreateBookingRequest {
        car_id,
        start: date(2025, 6, 1),
        end: date(2025, 6, 4),
        late_return: false,
        full_day: false,
        expected_days: 3.5,
        accessory_ids: Vec::new(),
    }
}

fn driver_request(licence: &str) -> VerifyDriverRequest {
    VerifyDriverRequest {
        last_name: "Customer".into(),
        other_names: "Regular".into(),
        licence_number: licence.into(),
        address: "2 Low Road".into(),
        postcode: "ZZ9 8YX".into(),
        dob: date(1990, 6, 20),
        documents: Vec::new(),
    }
}

async fn paid_booking(h: &Harness) -> Uuid {
    let details = h
        .service
        .create(&h.customer, three_day_request(h.car.id))
        .await
        .unwrap();
    h.service
        .make_payment(&h.customer, details.booking.id)
        .await
        .unwrap();
    details.booking.id
}

#[tokio::test]
async fn progression_requires_admin() {
    let h = setup(LicenceTable::new(), FraudTable::new()).await;
    let booking_id = paid_booking(&h).await;

    let result = h.service.progress(&h.customer, booking_id, false).await;
    assert!(matches!(result, Err(FleetError::NotAdmin)));
}

#[tokio::test]
async fn confirmation_opens_identity_checks() {
    let h = setup(LicenceTable::new(), FraudTable::new()).await;
    let booking_id = paid_booking(&h).await;

    let confirmed = h.service.progress(&h.admin, booking_id, false).await.unwrap();
    assert_eq!(confirmed.process, Stage::BookingConfirmed);

    let open = h.statuses.active_statuses(booking_id).await.unwrap();
    assert!(open.iter().any(|s| s.stage == Stage::AbiCheck));
    assert!(open.iter().any(|s| s.stage == Stage::DvlaCheck));

    // Collection is blocked until the driver has been verified.
    let result = h.service.progress(&h.admin, booking_id, false).await;
    assert!(matches!(result, Err(FleetError::BookingNotReady)));
}

#[tokio::test]
async fn clean_verification_collects_the_booking() {
    let h = setup(LicenceTable::new(), FraudTable::new()).await;
    let booking_id = paid_booking(&h).await;
    h.service.progress(&h.admin, booking_id, false).await.unwrap();

    let collected = h
        .service
        .verify_driver(&h.admin, booking_id, driver_request("CUST906206RC1AA"))
        .await
        .unwrap();
    assert_eq!(collected.process, Stage::Collected);
    assert!(collected.driver_id.is_some());

    // Both identity checks closed with the stage change.
    let open = h.statuses.active_statuses(booking_id).await.unwrap();
    assert!(!open.iter().any(|s| s.stage == Stage::AbiCheck));
    assert!(!open.iter().any(|s| s.stage == Stage::DvlaCheck));

    // Return and completion; completion marks the customer repeat.
    h.service.progress(&h.admin, booking_id, false).await.unwrap();
    let complete = h.service.progress(&h.admin, booking_id, false).await.unwrap();
    assert_eq!(complete.process, Stage::Completed);

    let customer = h.users.get_by_id(h.customer.id).await.unwrap();
    assert!(customer.repeat);

    // Terminal stages reject further progression.
    let result = h.service.progress(&h.admin, booking_id, false).await;
    assert!(matches!(result, Err(FleetError::BookingNotReady)));
}

#[tokio::test]
async fn failed_progression_blocked_while_checks_open() {
    let h = setup(LicenceTable::new(), FraudTable::new()).await;
    let booking_id = paid_booking(&h).await;
    h.service.progress(&h.admin, booking_id, false).await.unwrap();

    let open = h.statuses.active_statuses(booking_id).await.unwrap();
    assert!(open.iter().any(|s| s.stage == Stage::AbiCheck));
    assert!(open.iter().any(|s| s.stage == Stage::DvlaCheck));

    // A no-show cannot be failed out while the identity checks are
    // still open; the admin cancels the booking instead.
    let result = h.service.progress(&h.admin, booking_id, true).await;
    assert!(matches!(result, Err(FleetError::BookingNotReady)));

    let customer = h.users.get_by_id(h.customer.id).await.unwrap();
    assert!(!customer.blacklisted);
    let booking = h.service.history(&h.admin, booking_id).await.unwrap();
    assert!(!booking.iter().any(|s| s.stage == Stage::Cancelled));
}

#[tokio::test]
async fn failed_return_blacklists_and_cancels() {
    let h = setup(LicenceTable::new(), FraudTable::new()).await;
    let booking_id = paid_booking(&h).await;
    h.service.progress(&h.admin, booking_id, false).await.unwrap();
    h.service
        .verify_driver(&h.admin, booking_id, driver_request("CUST906206RC1AA"))
        .await
        .unwrap();

    let cancelled = h.service.progress(&h.admin, booking_id, true).await.unwrap();
    assert_eq!(cancelled.process, Stage::Cancelled);

    let customer = h.users.get_by_id(h.customer.id).await.unwrap();
    assert!(customer.blacklisted);

    let history = h.service.history(&h.admin, booking_id).await.unwrap();
    let failure = history
        .iter()
        .find(|s| s.stage == Stage::Cancelled)
        .unwrap();
    assert!(failure.description.contains("failed to return"));
}

#[derive(Debug, surrealdb_types::SurrealValue)]
struct CountRow {
    total: u64,
}

async fn driver_count(h: &Harness) -> u64 {
    let mut result = h
        .db
        .query("SELECT count() AS total FROM driver GROUP ALL")
        .await
        .unwrap();
    let rows: Vec<CountRow> = result.take(0).unwrap();
    rows.first().map(|r| r.total).unwrap_or(0)
}

#[tokio::test]
async fn invalid_licence_blacklists_once() {
    let mut licences = LicenceTable::new();
    licences.insert("CUST906206RC1AA", LicenceFlag::Suspended);
    let h = setup(licences, FraudTable::new()).await;
    let booking_id = paid_booking(&h).await;
    h.service.progress(&h.admin, booking_id, false).await.unwrap();

    let result = h
        .service
        .verify_driver(&h.admin, booking_id, driver_request("CUST906206RC1AA"))
        .await;
    assert!(matches!(result, Err(FleetError::InvalidLicence)));
    assert_eq!(driver_count(&h).await, 1);

    let driver = h
        .drivers
        .get_by_name("Customer", "Regular")
        .await
        .unwrap()
        .unwrap();
    assert!(driver.blacklisted);
    assert_eq!(driver.blacklist_reason, Some(BlacklistReason::InvalidLicence));

    // A second attempt fails identically without a second record.
    let result = h
        .service
        .verify_driver(&h.admin, booking_id, driver_request("CUST906206RC1AA"))
        .await;
    assert!(matches!(result, Err(FleetError::InvalidLicence)));
    assert_eq!(driver_count(&h).await, 1);

    // The booking never advanced.
    let booking = h.service.history(&h.admin, booking_id).await.unwrap();
    assert!(!booking.iter().any(|s| s.stage == Stage::Collected));
}

#[tokio::test]
async fn fraudulent_claim_blocks_the_driver() {
    let mut fraud = FraudTable::new();
    fraud.insert(ClaimRecord {
        last_name: "Customer".into(),
        other_names: "Regular".into(),
        address: "2 Low Road".into(),
        postcode: "ZZ9 8YX".into(),
        dob: date(1990, 6, 20),
    });
    let h = setup(LicenceTable::new(), fraud).await;
    let booking_id = paid_booking(&h).await;
    h.service.progress(&h.admin, booking_id, false).await.unwrap();

    let result = h
        .service
        .verify_driver(&h.admin, booking_id, driver_request("CUST906206RC1AA"))
        .await;
    assert!(matches!(result, Err(FleetError::FraudulentClaim)));

    // Future attempts hit the stored blacklist entry.
    let result = h
        .service
        .verify_driver(&h.admin, booking_id, driver_request("CUST906206RC1AA"))
        .await;
    assert!(matches!(result, Err(FleetError::DriverBlacklisted)));
}

#[tokio::test]
async fn refund_accept_and_reject() {
    let h = setup(LicenceTable::new(), FraudTable::new()).await;

    // First paid booking, cancelled: refund accepted.
    let first = paid_booking(&h).await;
    h.service.cancel(&h.customer, first).await.unwrap();

    let queue = h.service.refund_queue(&h.admin).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].booking.id, first);

    let refunded = h
        .service
        .process_refund(
            &h.admin,
            first,
            RefundDecision {
                accept: true,
                reason: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(refunded.amount_paid, 0.0);
    let history = h.service.history(&h.admin, first).await.unwrap();
    let issued = history
        .iter()
        .find(|s| s.stage == Stage::RefundIssued)
        .unwrap();
    assert_eq!(issued.extra_amount, 140.0);

    // Second paid booking, cancelled: refund rejected, money kept.
    let mut req = three_day_request(h.car.id);
    req.start = date(2025, 7, 1);
    req.end = date(2025, 7, 4);
    let second = h.service.create(&h.customer, req).await.unwrap().booking.id;
    h.service.make_payment(&h.customer, second).await.unwrap();
    h.service.cancel(&h.customer, second).await.unwrap();

    let rejected = h
        .service
        .process_refund(
            &h.admin,
            second,
            RefundDecision {
                accept: false,
                reason: Some("damage reported".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(rejected.amount_paid, 140.0);
    let history = h.service.history(&h.admin, second).await.unwrap();
    let rejection = history
        .iter()
        .find(|s| s.stage == Stage::RefundRejected)
        .unwrap();
    assert_eq!(rejection.description, "Refund Rejected - damage reported");
    assert_eq!(rejection.extra_amount, 140.0);

    // The queue is drained either way.
    assert!(h.service.refund_queue(&h.admin).await.unwrap().is_empty());
}

#[tokio::test]
async fn extra_payment_settles_edit_balance() {
    let h = setup(LicenceTable::new(), FraudTable::new()).await;
    let booking_id = paid_booking(&h).await;

    h.service
        .edit(
            &h.customer,
            booking_id,
            fleethire_booking::EditBookingRequest {
                late_return: false,
                full_day: true,
                add_accessories: Vec::new(),
                remove_accessories: Vec::new(),
            },
        )
        .await
        .unwrap();

    // The balance is settled at the desk, so the booking has to be
    // confirmed first.
    let early = h.service.process_extra_payment(&h.admin, booking_id).await;
    assert!(matches!(early, Err(FleetError::BookingNotReady)));
    h.service.progress(&h.admin, booking_id, false).await.unwrap();

    let settled = h
        .service
        .process_extra_payment(&h.admin, booking_id)
        .await
        .unwrap();
    assert_eq!(settled.amount_paid, settled.total_cost);

    let history = h.service.history(&h.admin, booking_id).await.unwrap();
    let accepted = history
        .iter()
        .find(|s| s.stage == Stage::EditPaymentAccepted)
        .unwrap();
    assert!(accepted.description.contains("on Collection"));

    // Nothing left to settle.
    let again = h.service.process_extra_payment(&h.admin, booking_id).await;
    assert!(matches!(again, Err(FleetError::NoPaymentNeeded)));
}

#[tokio::test]
async fn account_flags_and_self_demotion() {
    let h = setup(LicenceTable::new(), FraudTable::new()).await;

    h.service
        .set_user_flag(&h.admin, h.customer.id, AccountFlag::Blacklisted(true))
        .await
        .unwrap();
    let customer = h.users.get_by_id(h.customer.id).await.unwrap();
    assert!(customer.blacklisted);

    let result = h
        .service
        .set_user_flag(&h.admin, h.admin.id, AccountFlag::Admin(false))
        .await;
    assert!(matches!(result, Err(FleetError::InvalidInput { .. })));

    let result = h
        .service
        .set_user_flag(&h.customer, h.admin.id, AccountFlag::Disabled(true))
        .await;
    assert!(matches!(result, Err(FleetError::NotAdmin)));
}

#[tokio::test]
async fn upcoming_and_search_listings() {
    let h = setup(LicenceTable::new(), FraudTable::new()).await;
    let booking_id = paid_booking(&h).await;

    let upcoming = h
        .service
        .upcoming_bookings(&h.admin, Stage::AwaitingConfirmation, 50)
        .await
        .unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, booking_id);

    let found = h.service.search_bookings(&h.admin, "regular").await.unwrap();
    assert_eq!(found.len(), 1);

    let none = h.service.search_bookings(&h.admin, "nobody").await.unwrap();
    assert!(none.is_empty());
}
