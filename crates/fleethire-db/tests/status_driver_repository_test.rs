//! Integration tests for the booking status and driver repositories
//! using in-memory SurrealDB.

use chrono::NaiveDate;
use fleethire_core::models::driver::{BlacklistReason, CreateDriver};
use fleethire_core::models::stage::Stage;
use fleethire_core::repository::{DriverRepository, StatusRepository};
use fleethire_db::repository::{SurrealDriverRepository, SurrealStatusRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    fleethire_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn insert_and_fetch_latest_status() {
    let db = setup().await;
    let repo = SurrealStatusRepository::new(db);
    let booking_id = Uuid::new_v4();

    let status = repo
        .insert(
            booking_id,
            Stage::AwaitingPayment,
            None,
            true,
            200.0,
            "Need to pay £200.00",
        )
        .await
        .unwrap();

    assert!(status.active);
    assert!(status.admin_id.is_none());
    assert_eq!(status.extra_amount, 200.0);

    let latest = repo
        .latest(booking_id, Stage::AwaitingPayment)
        .await
        .unwrap()
        .expect("status should exist");
    assert_eq!(latest.id, status.id);

    let none = repo.latest(booking_id, Stage::Collected).await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn deactivate_all_leaves_history() {
    let db = setup().await;
    let repo = SurrealStatusRepository::new(db);
    let booking_id = Uuid::new_v4();
    let admin_id = Uuid::new_v4();

    repo.insert(booking_id, Stage::AwaitingPayment, None, true, 0.0, "")
        .await
        .unwrap();
    repo.insert(
        booking_id,
        Stage::AwaitingConfirmation,
        Some(admin_id),
        true,
        0.0,
        "",
    )
    .await
    .unwrap();
    // Unrelated booking must not be touched.
    let other_booking = Uuid::new_v4();
    repo.insert(other_booking, Stage::AwaitingPayment, None, true, 0.0, "")
        .await
        .unwrap();

    repo.deactivate_all(booking_id).await.unwrap();

    assert!(repo.active_statuses(booking_id).await.unwrap().is_empty());
    assert_eq!(repo.history(booking_id).await.unwrap().len(), 2);
    assert_eq!(repo.active_statuses(other_booking).await.unwrap().len(), 1);
}

#[tokio::test]
async fn set_active_flips_single_row() {
    let db = setup().await;
    let repo = SurrealStatusRepository::new(db);
    let booking_id = Uuid::new_v4();

    let status = repo
        .insert(booking_id, Stage::AbiCheck, None, true, 0.0, "")
        .await
        .unwrap();
    repo.set_active(status.id, false).await.unwrap();

    let latest = repo
        .latest(booking_id, Stage::AbiCheck)
        .await
        .unwrap()
        .unwrap();
    assert!(!latest.active);
}

fn driver(last_name: &str, other_names: &str) -> CreateDriver {
    CreateDriver {
        last_name: last_name.into(),
        other_names: other_names.into(),
        licence_number: "SMITH912160AB1CD".into(),
        address: "1 High Street".into(),
        postcode: "AB1 2CD".into(),
        dob: NaiveDate::from_ymd_opt(1991, 2, 16).unwrap(),
        blacklisted: false,
        blacklist_reason: None,
    }
}

#[tokio::test]
async fn create_and_find_driver_by_name() {
    let db = setup().await;
    let repo = SurrealDriverRepository::new(db);

    let created = repo.create(driver("Smith", "John")).await.unwrap();
    assert!(!created.blacklisted);

    let found = repo
        .get_by_name("Smith", "John")
        .await
        .unwrap()
        .expect("driver should be found");
    assert_eq!(found.id, created.id);

    let missing = repo.get_by_name("Smith", "Jane").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn blacklist_keeps_reason() {
    let db = setup().await;
    let repo = SurrealDriverRepository::new(db);

    let created = repo.create(driver("Doe", "Jane")).await.unwrap();
    repo.blacklist(created.id, BlacklistReason::InvalidLicence)
        .await
        .unwrap();

    let fetched = repo.get(created.id).await.unwrap();
    assert!(fetched.blacklisted);
    assert_eq!(
        fetched.blacklist_reason,
        Some(BlacklistReason::InvalidLicence)
    );
}
