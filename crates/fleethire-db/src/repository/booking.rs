//! SurrealDB implementation of [`BookingRepository`].
//!
//! Rental dates are stored as `YYYY-MM-DD` strings so range
//! predicates compare correctly as strings. Lifecycle stages are
//! stored as their integer codes. Cancelled bookings (code 11) are
//! invisible to availability queries.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use fleethire_core::error::FleetResult;
use fleethire_core::models::accessory::Accessory;
use fleethire_core::models::booking::{Booking, CreateBooking, UpdateBookingTerms};
use fleethire_core::models::stage::Stage;
use fleethire_core::pricing::MAX_EXTENSION_DAYS;
use fleethire_core::repository::BookingRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{date_str, parse_date, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

const CANCELLED_CODE: i64 = 11;

#[derive(Debug, SurrealValue)]
struct BookingRow {
    car_id: String,
    user_id: String,
    start: String,
    end: String,
    finish: String,
    total_cost: f64,
    amount_paid: f64,
    late_return: bool,
    full_day: bool,
    booking_length: f64,
    process: i64,
    driver_id: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct BookingRowWithId {
    record_id: String,
    car_id: String,
    user_id: String,
    start: String,
    end: String,
    finish: String,
    total_cost: f64,
    amount_paid: f64,
    late_return: bool,
    full_day: bool,
    booking_length: f64,
    process: i64,
    driver_id: Option<String>,
    created_at: DateTime<Utc>,
}

fn parse_stage(code: i64) -> Result<Stage, DbError> {
    Stage::from_code(code).ok_or_else(|| DbError::Decode(format!("unknown stage code: {code}")))
}

impl BookingRow {
    fn into_booking(self, id: Uuid) -> Result<Booking, DbError> {
        Ok(Booking {
            id,
            car_id: parse_uuid(&self.car_id)?,
            user_id: parse_uuid(&self.user_id)?,
            start: parse_date(&self.start)?,
            end: parse_date(&self.end)?,
            finish: parse_date(&self.finish)?,
            total_cost: self.total_cost,
            amount_paid: self.amount_paid,
            late_return: self.late_return,
            full_day: self.full_day,
            booking_length: self.booking_length,
            process: parse_stage(self.process)?,
            driver_id: parse_opt_uuid(self.driver_id.as_deref())?,
            created_at: self.created_at,
        })
    }
}

impl BookingRowWithId {
    fn try_into_booking(self) -> Result<Booking, DbError> {
        let id = parse_uuid(&self.record_id)?;
        Ok(Booking {
            id,
            car_id: parse_uuid(&self.car_id)?,
            user_id: parse_uuid(&self.user_id)?,
            start: parse_date(&self.start)?,
            end: parse_date(&self.end)?,
            finish: parse_date(&self.finish)?,
            total_cost: self.total_cost,
            amount_paid: self.amount_paid,
            late_return: self.late_return,
            full_day: self.full_day,
            booking_length: self.booking_length,
            process: parse_stage(self.process)?,
            driver_id: parse_opt_uuid(self.driver_id.as_deref())?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

#[derive(Debug, SurrealValue)]
struct StartRow {
    start: String,
}

#[derive(Debug, SurrealValue)]
struct AccessoryRow {
    record_id: String,
    description: String,
}

#[derive(Debug, SurrealValue)]
struct AccessoryLinkRow {
    accessory_id: String,
}

/// SurrealDB implementation of the Booking repository.
#[derive(Clone)]
pub struct SurrealBookingRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBookingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> BookingRepository for SurrealBookingRepository<C> {
    async fn create(&self, input: CreateBooking) -> FleetResult<Booking> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('booking', $id) SET \
                 car_id = $car_id, \
                 user_id = $user_id, \
                 start = $start, \
                 end = $end, \
                 finish = $finish, \
                 total_cost = $total_cost, \
                 amount_paid = 0.0, \
                 late_return = $late_return, \
                 full_day = $full_day, \
                 booking_length = $booking_length, \
                 process = $process, \
                 driver_id = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("car_id", input.car_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("start", date_str(input.start)))
            .bind(("end", date_str(input.end)))
            .bind(("finish", date_str(input.finish)))
            .bind(("total_cost", input.total_cost))
            .bind(("late_return", input.late_return))
            .bind(("full_day", input.full_day))
            .bind(("booking_length", input.booking_length))
            .bind(("process", Stage::AwaitingPayment.code()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<BookingRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "booking".into(),
            id: id_str,
        })?;

        Ok(row.into_booking(id)?)
    }

    async fn get(&self, id: Uuid) -> FleetResult<Booking> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('booking', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BookingRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "booking".into(),
            id: id_str,
        })?;

        Ok(row.into_booking(id)?)
    }

    async fn update_terms(&self, id: Uuid, terms: UpdateBookingTerms) -> FleetResult<()> {
        self.db
            .query(
                "UPDATE type::record('booking', $id) SET \
                 total_cost = $total_cost, \
                 booking_length = $booking_length, \
                 late_return = $late_return, \
                 full_day = $full_day, \
                 end = $end, \
                 finish = $finish, \
                 updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("total_cost", terms.total_cost))
            .bind(("booking_length", terms.booking_length))
            .bind(("late_return", terms.late_return))
            .bind(("full_day", terms.full_day))
            .bind(("end", date_str(terms.end)))
            .bind(("finish", date_str(terms.finish)))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn set_amount_paid(&self, id: Uuid, amount: f64) -> FleetResult<()> {
        self.db
            .query(
                "UPDATE type::record('booking', $id) SET \
                 amount_paid = $amount, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("amount", amount))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn set_process(&self, id: Uuid, stage: Stage) -> FleetResult<()> {
        self.db
            .query(
                "UPDATE type::record('booking', $id) SET \
                 process = $process, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("process", stage.code()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn set_driver(&self, id: Uuid, driver_id: Uuid) -> FleetResult<()> {
        self.db
            .query(
                "UPDATE type::record('booking', $id) SET \
                 driver_id = $driver_id, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("driver_id", driver_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn has_overlap(
        &self,
        car_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> FleetResult<bool> {
        // Inclusive intersection: candidate.start <= existing.end AND
        // candidate.end >= existing.start.
        let mut query = String::from(
            "SELECT count() AS total FROM booking \
             WHERE car_id = $car_id \
             AND process != $cancelled \
             AND $start <= end AND $end >= start",
        );
        if exclude.is_some() {
            query.push_str(" AND meta::id(id) != $exclude");
        }
        query.push_str(" GROUP ALL");

        let mut builder = self
            .db
            .query(&query)
            .bind(("car_id", car_id.to_string()))
            .bind(("cancelled", CANCELLED_CODE))
            .bind(("start", date_str(start)))
            .bind(("end", date_str(end)));
        if let Some(exclude) = exclude {
            builder = builder.bind(("exclude", exclude.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = rows.first().map(|r| r.total).unwrap_or(0);

        Ok(total > 0)
    }

    async fn count_extension_days(
        &self,
        car_id: Uuid,
        end: NaiveDate,
        exclude: Uuid,
    ) -> FleetResult<i64> {
        // Earliest non-cancelled booking starting in the fortnight
        // after `end`. Extension room is the gap before it starts.
        let window_start = end + Duration::days(1);
        let window_end = end + Duration::days(MAX_EXTENSION_DAYS);

        let mut result = self
            .db
            .query(
                "SELECT start FROM booking \
                 WHERE car_id = $car_id \
                 AND process != $cancelled \
                 AND meta::id(id) != $exclude \
                 AND start >= $window_start AND start <= $window_end \
                 ORDER BY start ASC LIMIT 1",
            )
            .bind(("car_id", car_id.to_string()))
            .bind(("cancelled", CANCELLED_CODE))
            .bind(("exclude", exclude.to_string()))
            .bind(("window_start", date_str(window_start)))
            .bind(("window_end", date_str(window_end)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StartRow> = result.take(0).map_err(DbError::from)?;
        let days = match rows.first() {
            Some(row) => {
                let next_start = parse_date(&row.start)?;
                (next_start - window_start)
                    .num_days()
                    .clamp(0, MAX_EXTENSION_DAYS)
            }
            None => MAX_EXTENSION_DAYS,
        };

        Ok(days)
    }

    async fn list_for_user(&self, user_id: Uuid) -> FleetResult<Vec<Booking>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM booking \
                 WHERE user_id = $user_id \
                 ORDER BY start DESC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BookingRowWithId> = result.take(0).map_err(DbError::from)?;
        let bookings = rows
            .into_iter()
            .map(|row| row.try_into_booking())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(bookings)
    }

    async fn list_by_stage(&self, stage: Stage, limit: usize) -> FleetResult<Vec<Booking>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM booking \
                 WHERE process = $process \
                 ORDER BY start ASC LIMIT $limit",
            )
            .bind(("process", stage.code()))
            .bind(("limit", limit as i64))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BookingRowWithId> = result.take(0).map_err(DbError::from)?;
        let bookings = rows
            .into_iter()
            .map(|row| row.try_into_booking())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(bookings)
    }

    async fn add_accessories(&self, booking_id: Uuid, accessory_ids: &[Uuid]) -> FleetResult<()> {
        let booking_str = booking_id.to_string();
        for accessory_id in accessory_ids {
            self.db
                .query(
                    "CREATE booking_accessory SET \
                     booking_id = $booking_id, \
                     accessory_id = $accessory_id",
                )
                .bind(("booking_id", booking_str.clone()))
                .bind(("accessory_id", accessory_id.to_string()))
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(DbError::from)?;
        }
        Ok(())
    }

    async fn remove_accessories(
        &self,
        booking_id: Uuid,
        accessory_ids: &[Uuid],
    ) -> FleetResult<()> {
        let booking_str = booking_id.to_string();
        for accessory_id in accessory_ids {
            self.db
                .query(
                    "DELETE booking_accessory \
                     WHERE booking_id = $booking_id \
                     AND accessory_id = $accessory_id",
                )
                .bind(("booking_id", booking_str.clone()))
                .bind(("accessory_id", accessory_id.to_string()))
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(DbError::from)?;
        }
        Ok(())
    }

    async fn accessories(&self, booking_id: Uuid) -> FleetResult<Vec<Accessory>> {
        let mut result = self
            .db
            .query(
                "SELECT accessory_id FROM booking_accessory \
                 WHERE booking_id = $booking_id",
            )
            .bind(("booking_id", booking_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let links: Vec<AccessoryLinkRow> = result.take(0).map_err(DbError::from)?;

        let mut accessories = Vec::with_capacity(links.len());
        for link in links {
            let mut result = self
                .db
                .query(
                    "SELECT meta::id(id) AS record_id, * \
                     FROM type::record('accessory', $id)",
                )
                .bind(("id", link.accessory_id.clone()))
                .await
                .map_err(DbError::from)?;
            let rows: Vec<AccessoryRow> = result.take(0).map_err(DbError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                entity: "accessory".into(),
                id: link.accessory_id,
            })?;
            accessories.push(Accessory {
                id: parse_uuid(&row.record_id)?,
                description: row.description,
            });
        }

        Ok(accessories)
    }

    async fn list_accessories(&self) -> FleetResult<Vec<Accessory>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM accessory \
                 ORDER BY description ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessoryRow> = result.take(0).map_err(DbError::from)?;
        let accessories = rows
            .into_iter()
            .map(|row| {
                Ok(Accessory {
                    id: parse_uuid(&row.record_id)?,
                    description: row.description,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(accessories)
    }

    async fn create_accessory(&self, description: &str) -> FleetResult<Accessory> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        self.db
            .query(
                "CREATE type::record('accessory', $id) SET \
                 description = $description",
            )
            .bind(("id", id_str))
            .bind(("description", description.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(Accessory {
            id,
            description: description.to_string(),
        })
    }
}
