//! SurrealDB implementation of [`StatusRepository`].
//!
//! Status rows are the booking's audit trail. Rows are only ever
//! inserted or flipped between active and inactive, never deleted.

use chrono::{DateTime, Utc};
use fleethire_core::error::FleetResult;
use fleethire_core::models::stage::Stage;
use fleethire_core::models::status::BookingStatus;
use fleethire_core::repository::StatusRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct StatusRow {
    booking_id: String,
    stage: i64,
    admin_id: Option<String>,
    active: bool,
    extra_amount: f64,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct StatusRowWithId {
    record_id: String,
    booking_id: String,
    stage: i64,
    admin_id: Option<String>,
    active: bool,
    extra_amount: f64,
    description: String,
    created_at: DateTime<Utc>,
}

fn parse_stage(code: i64) -> Result<Stage, DbError> {
    Stage::from_code(code).ok_or_else(|| DbError::Decode(format!("unknown stage code: {code}")))
}

impl StatusRow {
    fn into_status(self, id: Uuid) -> Result<BookingStatus, DbError> {
        Ok(BookingStatus {
            id,
            booking_id: parse_uuid(&self.booking_id)?,
            stage: parse_stage(self.stage)?,
            active: self.active,
            admin_id: parse_opt_uuid(self.admin_id.as_deref())?,
            description: self.description,
            extra_amount: self.extra_amount,
            created_at: self.created_at,
        })
    }
}

impl StatusRowWithId {
    fn try_into_status(self) -> Result<BookingStatus, DbError> {
        let id = parse_uuid(&self.record_id)?;
        Ok(BookingStatus {
            id,
            booking_id: parse_uuid(&self.booking_id)?,
            stage: parse_stage(self.stage)?,
            active: self.active,
            admin_id: parse_opt_uuid(self.admin_id.as_deref())?,
            description: self.description,
            extra_amount: self.extra_amount,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the booking status repository.
#[derive(Clone)]
pub struct SurrealStatusRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStatusRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> StatusRepository for SurrealStatusRepository<C> {
    async fn insert(
        &self,
        booking_id: Uuid,
        stage: Stage,
        admin_id: Option<Uuid>,
        active: bool,
        extra_amount: f64,
        description: &str,
    ) -> FleetResult<BookingStatus> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('booking_status', $id) SET \
                 booking_id = $booking_id, \
                 stage = $stage, \
                 admin_id = $admin_id, \
                 active = $active, \
                 extra_amount = $extra_amount, \
                 description = $description",
            )
            .bind(("id", id_str.clone()))
            .bind(("booking_id", booking_id.to_string()))
            .bind(("stage", stage.code()))
            .bind(("admin_id", admin_id.map(|a| a.to_string())))
            .bind(("active", active))
            .bind(("extra_amount", extra_amount))
            .bind(("description", description.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<StatusRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "booking_status".into(),
            id: id_str,
        })?;

        Ok(row.into_status(id)?)
    }

    async fn set_active(&self, status_id: Uuid, active: bool) -> FleetResult<()> {
        self.db
            .query(
                "UPDATE type::record('booking_status', $id) SET \
                 active = $active",
            )
            .bind(("id", status_id.to_string()))
            .bind(("active", active))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn latest(&self, booking_id: Uuid, stage: Stage) -> FleetResult<Option<BookingStatus>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM booking_status \
                 WHERE booking_id = $booking_id AND stage = $stage \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(("booking_id", booking_id.to_string()))
            .bind(("stage", stage.code()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StatusRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_status()?)),
            None => Ok(None),
        }
    }

    async fn deactivate_all(&self, booking_id: Uuid) -> FleetResult<()> {
        self.db
            .query(
                "UPDATE booking_status SET active = false \
                 WHERE booking_id = $booking_id AND active = true",
            )
            .bind(("booking_id", booking_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn history(&self, booking_id: Uuid) -> FleetResult<Vec<BookingStatus>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM booking_status \
                 WHERE booking_id = $booking_id \
                 ORDER BY created_at ASC",
            )
            .bind(("booking_id", booking_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StatusRowWithId> = result.take(0).map_err(DbError::from)?;
        let statuses = rows
            .into_iter()
            .map(|row| row.try_into_status())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(statuses)
    }

    async fn active_statuses(&self, booking_id: Uuid) -> FleetResult<Vec<BookingStatus>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM booking_status \
                 WHERE booking_id = $booking_id AND active = true \
                 ORDER BY created_at ASC",
            )
            .bind(("booking_id", booking_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StatusRowWithId> = result.take(0).map_err(DbError::from)?;
        let statuses = rows
            .into_iter()
            .map(|row| row.try_into_status())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(statuses)
    }
}
