//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async and return `FleetResult`
//! futures. The service crates are generic over these traits so they
//! carry no dependency on the database crate.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::FleetResult;
use crate::models::{
    accessory::Accessory,
    booking::{Booking, CreateBooking, UpdateBookingTerms},
    car::{Car, CreateCar, UpdateCar},
    driver::{BlacklistReason, CreateDriver, Driver},
    stage::Stage,
    status::BookingStatus,
    user::{CreateUser, User},
};

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = FleetResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FleetResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = FleetResult<User>> + Send;
    fn set_blacklisted(
        &self,
        id: Uuid,
        value: bool,
    ) -> impl Future<Output = FleetResult<()>> + Send;
    /// Marks the user a repeat customer (gates late returns).
    fn set_repeat(&self, id: Uuid) -> impl Future<Output = FleetResult<()>> + Send;
    fn set_disabled(&self, id: Uuid, value: bool) -> impl Future<Output = FleetResult<()>> + Send;
    fn set_admin(&self, id: Uuid, value: bool) -> impl Future<Output = FleetResult<()>> + Send;
    fn search(&self, term: &str) -> impl Future<Output = FleetResult<Vec<User>>> + Send;
}

pub trait CarRepository: Send + Sync {
    fn create(&self, input: CreateCar) -> impl Future<Output = FleetResult<Car>> + Send;
    fn get(&self, id: Uuid) -> impl Future<Output = FleetResult<Car>> + Send;
    fn list(&self) -> impl Future<Output = FleetResult<Vec<Car>>> + Send;
    fn update(&self, id: Uuid, input: UpdateCar) -> impl Future<Output = FleetResult<Car>> + Send;
}

pub trait BookingRepository: Send + Sync {
    fn create(&self, input: CreateBooking) -> impl Future<Output = FleetResult<Booking>> + Send;
    fn get(&self, id: Uuid) -> impl Future<Output = FleetResult<Booking>> + Send;
    /// Rewrites cost/length/flag/date terms after an edit or
    /// extension.
    fn update_terms(
        &self,
        id: Uuid,
        terms: UpdateBookingTerms,
    ) -> impl Future<Output = FleetResult<()>> + Send;
    /// Sets the amount paid to an absolute value.
    fn set_amount_paid(
        &self,
        id: Uuid,
        amount: f64,
    ) -> impl Future<Output = FleetResult<()>> + Send;
    /// Moves the booking's current main stage.
    fn set_process(&self, id: Uuid, stage: Stage) -> impl Future<Output = FleetResult<()>> + Send;
    fn set_driver(
        &self,
        id: Uuid,
        driver_id: Uuid,
    ) -> impl Future<Output = FleetResult<()>> + Send;
    /// Any non-cancelled booking for the car intersecting
    /// [start, end], optionally excluding one booking id.
    fn has_overlap(
        &self,
        car_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> impl Future<Output = FleetResult<bool>> + Send;
    /// Whole days from the day after `end` until the next
    /// non-cancelled booking on the car starts, capped at 14; 14 when
    /// nothing conflicts inside the window.
    fn count_extension_days(
        &self,
        car_id: Uuid,
        end: NaiveDate,
        exclude: Uuid,
    ) -> impl Future<Output = FleetResult<i64>> + Send;
    fn list_for_user(&self, user_id: Uuid) -> impl Future<Output = FleetResult<Vec<Booking>>> + Send;
    fn list_by_stage(
        &self,
        stage: Stage,
        limit: usize,
    ) -> impl Future<Output = FleetResult<Vec<Booking>>> + Send;
    fn add_accessories(
        &self,
        booking_id: Uuid,
        accessory_ids: &[Uuid],
    ) -> impl Future<Output = FleetResult<()>> + Send;
    fn remove_accessories(
        &self,
        booking_id: Uuid,
        accessory_ids: &[Uuid],
    ) -> impl Future<Output = FleetResult<()>> + Send;
    fn accessories(
        &self,
        booking_id: Uuid,
    ) -> impl Future<Output = FleetResult<Vec<Accessory>>> + Send;
    /// The accessory catalogue.
    fn list_accessories(&self) -> impl Future<Output = FleetResult<Vec<Accessory>>> + Send;
    fn create_accessory(
        &self,
        description: &str,
    ) -> impl Future<Output = FleetResult<Accessory>> + Send;
}

pub trait StatusRepository: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn insert(
        &self,
        booking_id: Uuid,
        stage: Stage,
        admin_id: Option<Uuid>,
        active: bool,
        extra_amount: f64,
        description: &str,
    ) -> impl Future<Output = FleetResult<BookingStatus>> + Send;
    fn set_active(
        &self,
        status_id: Uuid,
        active: bool,
    ) -> impl Future<Output = FleetResult<()>> + Send;
    /// The most recent status row for (booking, stage), active or not.
    fn latest(
        &self,
        booking_id: Uuid,
        stage: Stage,
    ) -> impl Future<Output = FleetResult<Option<BookingStatus>>> + Send;
    fn deactivate_all(&self, booking_id: Uuid) -> impl Future<Output = FleetResult<()>> + Send;
    fn history(
        &self,
        booking_id: Uuid,
    ) -> impl Future<Output = FleetResult<Vec<BookingStatus>>> + Send;
    fn active_statuses(
        &self,
        booking_id: Uuid,
    ) -> impl Future<Output = FleetResult<Vec<BookingStatus>>> + Send;
}

pub trait DriverRepository: Send + Sync {
    fn create(&self, input: CreateDriver) -> impl Future<Output = FleetResult<Driver>> + Send;
    fn get(&self, id: Uuid) -> impl Future<Output = FleetResult<Driver>> + Send;
    fn get_by_name(
        &self,
        last_name: &str,
        other_names: &str,
    ) -> impl Future<Output = FleetResult<Option<Driver>>> + Send;
    fn blacklist(
        &self,
        id: Uuid,
        reason: BlacklistReason,
    ) -> impl Future<Output = FleetResult<()>> + Send;
}
