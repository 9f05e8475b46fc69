//! SurrealDB implementation of [`CarRepository`].

use chrono::{DateTime, Utc};
use fleethire_core::error::FleetResult;
use fleethire_core::models::car::{Car, CreateCar, UpdateCar};
use fleethire_core::repository::CarRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CarRow {
    description: String,
    daily_rate: f64,
    disabled: bool,
    over_25: bool,
    seats: u32,
    fuel_type: i64,
    gear_type: i64,
    body_type: i64,
    size: i64,
    colour: i64,
    image: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CarRowWithId {
    record_id: String,
    description: String,
    daily_rate: f64,
    disabled: bool,
    over_25: bool,
    seats: u32,
    fuel_type: i64,
    gear_type: i64,
    body_type: i64,
    size: i64,
    colour: i64,
    image: String,
    created_at: DateTime<Utc>,
}

impl CarRow {
    fn into_car(self, id: Uuid) -> Car {
        Car {
            id,
            description: self.description,
            daily_rate: self.daily_rate,
            disabled: self.disabled,
            over_25: self.over_25,
            seats: self.seats,
            fuel_type: self.fuel_type,
            gear_type: self.gear_type,
            body_type: self.body_type,
            size: self.size,
            colour: self.colour,
            image: self.image,
            created_at: self.created_at,
        }
    }
}

impl CarRowWithId {
    fn try_into_car(self) -> Result<Car, DbError> {
        let id = super::parse_uuid(&self.record_id)?;
        Ok(Car {
            id,
            description: self.description,
            daily_rate: self.daily_rate,
            disabled: self.disabled,
            over_25: self.over_25,
            seats: self.seats,
            fuel_type: self.fuel_type,
            gear_type: self.gear_type,
            body_type: self.body_type,
            size: self.size,
            colour: self.colour,
            image: self.image,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Car repository.
#[derive(Clone)]
pub struct SurrealCarRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCarRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CarRepository for SurrealCarRepository<C> {
    async fn create(&self, input: CreateCar) -> FleetResult<Car> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('car', $id) SET \
                 description = $description, \
                 daily_rate = $daily_rate, \
                 disabled = $disabled, \
                 over_25 = $over_25, \
                 seats = $seats, \
                 fuel_type = $fuel_type, \
                 gear_type = $gear_type, \
                 body_type = $body_type, \
                 size = $size, \
                 colour = $colour, \
                 image = $image",
            )
            .bind(("id", id_str.clone()))
            .bind(("description", input.description))
            .bind(("daily_rate", input.daily_rate))
            .bind(("disabled", input.disabled))
            .bind(("over_25", input.over_25))
            .bind(("seats", input.seats))
            .bind(("fuel_type", input.fuel_type))
            .bind(("gear_type", input.gear_type))
            .bind(("body_type", input.body_type))
            .bind(("size", input.size))
            .bind(("colour", input.colour))
            .bind(("image", input.image))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<CarRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "car".into(),
            id: id_str,
        })?;

        Ok(row.into_car(id))
    }

    async fn get(&self, id: Uuid) -> FleetResult<Car> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('car', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CarRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "car".into(),
            id: id_str,
        })?;

        Ok(row.into_car(id))
    }

    async fn list(&self) -> FleetResult<Vec<Car>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM car \
                 ORDER BY created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CarRowWithId> = result.take(0).map_err(DbError::from)?;
        let cars = rows
            .into_iter()
            .map(|row| row.try_into_car())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(cars)
    }

    async fn update(&self, id: Uuid, input: UpdateCar) -> FleetResult<Car> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.daily_rate.is_some() {
            sets.push("daily_rate = $daily_rate");
        }
        if input.disabled.is_some() {
            sets.push("disabled = $disabled");
        }
        if input.over_25.is_some() {
            sets.push("over_25 = $over_25");
        }
        if input.seats.is_some() {
            sets.push("seats = $seats");
        }
        if input.fuel_type.is_some() {
            sets.push("fuel_type = $fuel_type");
        }
        if input.gear_type.is_some() {
            sets.push("gear_type = $gear_type");
        }
        if input.body_type.is_some() {
            sets.push("body_type = $body_type");
        }
        if input.size.is_some() {
            sets.push("size = $size");
        }
        if input.colour.is_some() {
            sets.push("colour = $colour");
        }
        if input.image.is_some() {
            sets.push("image = $image");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('car', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(daily_rate) = input.daily_rate {
            builder = builder.bind(("daily_rate", daily_rate));
        }
        if let Some(disabled) = input.disabled {
            builder = builder.bind(("disabled", disabled));
        }
        if let Some(over_25) = input.over_25 {
            builder = builder.bind(("over_25", over_25));
        }
        if let Some(seats) = input.seats {
            builder = builder.bind(("seats", seats));
        }
        if let Some(fuel_type) = input.fuel_type {
            builder = builder.bind(("fuel_type", fuel_type));
        }
        if let Some(gear_type) = input.gear_type {
            builder = builder.bind(("gear_type", gear_type));
        }
        if let Some(body_type) = input.body_type {
            builder = builder.bind(("body_type", body_type));
        }
        if let Some(size) = input.size {
            builder = builder.bind(("size", size));
        }
        if let Some(colour) = input.colour {
            builder = builder.bind(("colour", colour));
        }
        if let Some(image) = input.image {
            builder = builder.bind(("image", image));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<CarRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "car".into(),
            id: id_str,
        })?;

        Ok(row.into_car(id))
    }
}
