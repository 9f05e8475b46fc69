//! Shared test harness: in-memory SurrealDB, table-backed providers,
//! one admin, one customer and one car.

use std::sync::Arc;

use chrono::NaiveDate;
use fleethire_booking::BookingService;
use fleethire_core::models::car::{Car, CreateCar};
use fleethire_core::models::user::{CreateUser, User};
use fleethire_core::repository::{CarRepository, UserRepository};
use fleethire_db::repository::{
    SurrealBookingRepository, SurrealCarRepository, SurrealDriverRepository,
    SurrealStatusRepository, SurrealUserRepository,
};
use fleethire_providers::{
    FraudTable, LicenceTable, MemoryDocumentStore, TableFraudProvider, TableLicenceProvider,
    TracingNotifier,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

pub type Db = surrealdb::engine::local::Db;

pub type Service = BookingService<
    SurrealUserRepository<Db>,
    SurrealCarRepository<Db>,
    SurrealBookingRepository<Db>,
    SurrealStatusRepository<Db>,
    SurrealDriverRepository<Db>,
    TableLicenceProvider,
    TableFraudProvider,
    TracingNotifier,
    MemoryDocumentStore,
>;

pub struct Harness {
    pub db: Surreal<Db>,
    pub service: Service,
    pub users: SurrealUserRepository<Db>,
    pub bookings: SurrealBookingRepository<Db>,
    pub statuses: SurrealStatusRepository<Db>,
    pub drivers: SurrealDriverRepository<Db>,
    pub admin: User,
    pub customer: User,
    pub car: Car,
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn setup(licence_table: LicenceTable, fraud_table: FraudTable) -> Harness {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    fleethire_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let cars = SurrealCarRepository::new(db.clone());
    let bookings = SurrealBookingRepository::new(db.clone());
    let statuses = SurrealStatusRepository::new(db.clone());
    let drivers = SurrealDriverRepository::new(db.clone());

    let admin = users
        .create(CreateUser {
            email: "staff@fleethire.test".into(),
            full_name: "Staff Member".into(),
            password_hash: "$argon2id$test".into(),
            dob: date(1985, 4, 1),
        })
        .await
        .unwrap();
    users.set_admin(admin.id, true).await.unwrap();
    let admin = users.get_by_id(admin.id).await.unwrap();

    let customer = users
        .create(CreateUser {
            email: "customer@fleethire.test".into(),
            full_name: "Regular Customer".into(),
            password_hash: "$argon2id$test".into(),
            dob: date(1990, 6, 20),
        })
        .await
        .unwrap();

    let car = cars
        .create(CreateCar {
            description: "Ford Focus".into(),
            daily_rate: 40.0,
            disabled: false,
            over_25: false,
            seats: 5,
            fuel_type: 1,
            gear_type: 1,
            body_type: 2,
            size: 2,
            colour: 1,
            image: "focus.jpg".into(),
        })
        .await
        .unwrap();

    let service = BookingService::new(
        users.clone(),
        cars.clone(),
        bookings.clone(),
        statuses.clone(),
        drivers.clone(),
        TableLicenceProvider::new(licence_table),
        TableFraudProvider::new(fraud_table),
        Arc::new(TracingNotifier::new()),
        MemoryDocumentStore::new(),
    );

    Harness {
        db,
        service,
        users,
        bookings,
        statuses,
        drivers,
        admin,
        customer,
        car,
    }
}
