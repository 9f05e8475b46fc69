//! SurrealDB implementation of [`DriverRepository`].
//!
//! Driver records are created the first time a named driver is
//! verified at collection and are never deleted; a blacklist entry
//! keeps its reason permanently.

use chrono::{DateTime, Utc};
use fleethire_core::error::FleetResult;
use fleethire_core::models::driver::{BlacklistReason, CreateDriver, Driver};
use fleethire_core::repository::DriverRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{date_str, parse_date, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct DriverRow {
    last_name: String,
    other_names: String,
    licence_number: String,
    address: String,
    postcode: String,
    dob: String,
    blacklisted: bool,
    blacklist_reason: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct DriverRowWithId {
    record_id: String,
    last_name: String,
    other_names: String,
    licence_number: String,
    address: String,
    postcode: String,
    dob: String,
    blacklisted: bool,
    blacklist_reason: Option<String>,
    created_at: DateTime<Utc>,
}

fn parse_reason(s: Option<&str>) -> Result<Option<BlacklistReason>, DbError> {
    match s {
        None => Ok(None),
        Some(raw) => BlacklistReason::parse(raw)
            .map(Some)
            .ok_or_else(|| DbError::Decode(format!("unknown blacklist reason: {raw}"))),
    }
}

impl DriverRow {
    fn into_driver(self, id: Uuid) -> Result<Driver, DbError> {
        Ok(Driver {
            id,
            last_name: self.last_name,
            other_names: self.other_names,
            licence_number: self.licence_number,
            address: self.address,
            postcode: self.postcode,
            dob: parse_date(&self.dob)?,
            blacklisted: self.blacklisted,
            blacklist_reason: parse_reason(self.blacklist_reason.as_deref())?,
            created_at: self.created_at,
        })
    }
}

impl DriverRowWithId {
    fn try_into_driver(self) -> Result<Driver, DbError> {
        let id = parse_uuid(&self.record_id)?;
        Ok(Driver {
            id,
            last_name: self.last_name,
            other_names: self.other_names,
            licence_number: self.licence_number,
            address: self.address,
            postcode: self.postcode,
            dob: parse_date(&self.dob)?,
            blacklisted: self.blacklisted,
            blacklist_reason: parse_reason(self.blacklist_reason.as_deref())?,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Driver repository.
#[derive(Clone)]
pub struct SurrealDriverRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDriverRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DriverRepository for SurrealDriverRepository<C> {
    async fn create(&self, input: CreateDriver) -> FleetResult<Driver> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('driver', $id) SET \
                 last_name = $last_name, \
                 other_names = $other_names, \
                 licence_number = $licence_number, \
                 address = $address, \
                 postcode = $postcode, \
                 dob = $dob, \
                 blacklisted = $blacklisted, \
                 blacklist_reason = $blacklist_reason",
            )
            .bind(("id", id_str.clone()))
            .bind(("last_name", input.last_name))
            .bind(("other_names", input.other_names))
            .bind(("licence_number", input.licence_number))
            .bind(("address", input.address))
            .bind(("postcode", input.postcode))
            .bind(("dob", date_str(input.dob)))
            .bind(("blacklisted", input.blacklisted))
            .bind((
                "blacklist_reason",
                input.blacklist_reason.map(|r| r.as_str().to_string()),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<DriverRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "driver".into(),
            id: id_str,
        })?;

        Ok(row.into_driver(id)?)
    }

    async fn get(&self, id: Uuid) -> FleetResult<Driver> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('driver', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DriverRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "driver".into(),
            id: id_str,
        })?;

        Ok(row.into_driver(id)?)
    }

    async fn get_by_name(&self, last_name: &str, other_names: &str) -> FleetResult<Option<Driver>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM driver \
                 WHERE last_name = $last_name \
                 AND other_names = $other_names \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(("last_name", last_name.to_string()))
            .bind(("other_names", other_names.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DriverRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_driver()?)),
            None => Ok(None),
        }
    }

    async fn blacklist(&self, id: Uuid, reason: BlacklistReason) -> FleetResult<()> {
        self.db
            .query(
                "UPDATE type::record('driver', $id) SET \
                 blacklisted = true, \
                 blacklist_reason = $reason",
            )
            .bind(("id", id.to_string()))
            .bind(("reason", reason.as_str().to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }
}
