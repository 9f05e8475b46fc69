//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Rental dates are stored as ISO
//! `YYYY-MM-DD` strings so range comparisons work lexicographically.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users (customers and administrators)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD full_name ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD dob ON TABLE user TYPE string;
DEFINE FIELD blacklisted ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD disabled ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD verified ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD repeat_customer ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD admin ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Cars (fleet catalogue)
-- =======================================================================
DEFINE TABLE car SCHEMAFULL;
DEFINE FIELD description ON TABLE car TYPE string;
DEFINE FIELD daily_rate ON TABLE car TYPE float;
DEFINE FIELD disabled ON TABLE car TYPE bool DEFAULT false;
DEFINE FIELD over_25 ON TABLE car TYPE bool DEFAULT false;
DEFINE FIELD seats ON TABLE car TYPE int DEFAULT 0;
DEFINE FIELD fuel_type ON TABLE car TYPE int DEFAULT 0;
DEFINE FIELD gear_type ON TABLE car TYPE int DEFAULT 0;
DEFINE FIELD body_type ON TABLE car TYPE int DEFAULT 0;
DEFINE FIELD size ON TABLE car TYPE int DEFAULT 0;
DEFINE FIELD colour ON TABLE car TYPE int DEFAULT 0;
DEFINE FIELD image ON TABLE car TYPE string DEFAULT '';
DEFINE FIELD created_at ON TABLE car TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE car TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Bookings
-- =======================================================================
DEFINE TABLE booking SCHEMAFULL;
DEFINE FIELD user_id ON TABLE booking TYPE string;
DEFINE FIELD car_id ON TABLE booking TYPE string;
DEFINE FIELD start ON TABLE booking TYPE string;
DEFINE FIELD end ON TABLE booking TYPE string;
DEFINE FIELD finish ON TABLE booking TYPE string;
DEFINE FIELD total_cost ON TABLE booking TYPE float;
DEFINE FIELD amount_paid ON TABLE booking TYPE float DEFAULT 0.0;
DEFINE FIELD late_return ON TABLE booking TYPE bool DEFAULT false;
DEFINE FIELD full_day ON TABLE booking TYPE bool DEFAULT false;
DEFINE FIELD booking_length ON TABLE booking TYPE float;
DEFINE FIELD process ON TABLE booking TYPE int;
DEFINE FIELD driver_id ON TABLE booking TYPE option<string>;
DEFINE FIELD created_at ON TABLE booking TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE booking TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_booking_user ON TABLE booking COLUMNS user_id;
DEFINE INDEX idx_booking_car ON TABLE booking COLUMNS car_id;

-- =======================================================================
-- Booking status history (append-mostly audit trail)
-- =======================================================================
DEFINE TABLE booking_status SCHEMAFULL;
DEFINE FIELD booking_id ON TABLE booking_status TYPE string;
DEFINE FIELD stage ON TABLE booking_status TYPE int;
DEFINE FIELD admin_id ON TABLE booking_status TYPE option<string>;
DEFINE FIELD active ON TABLE booking_status TYPE bool;
DEFINE FIELD extra_amount ON TABLE booking_status TYPE float \
    DEFAULT 0.0;
DEFINE FIELD description ON TABLE booking_status TYPE string \
    DEFAULT '';
DEFINE FIELD created_at ON TABLE booking_status TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_status_booking ON TABLE booking_status \
    COLUMNS booking_id;
DEFINE INDEX idx_status_booking_stage ON TABLE booking_status \
    COLUMNS booking_id, stage;

-- =======================================================================
-- Drivers (named drivers verified at collection)
-- =======================================================================
DEFINE TABLE driver SCHEMAFULL;
DEFINE FIELD last_name ON TABLE driver TYPE string;
DEFINE FIELD other_names ON TABLE driver TYPE string;
DEFINE FIELD licence_number ON TABLE driver TYPE string;
DEFINE FIELD address ON TABLE driver TYPE string;
DEFINE FIELD postcode ON TABLE driver TYPE string;
DEFINE FIELD dob ON TABLE driver TYPE string;
DEFINE FIELD blacklisted ON TABLE driver TYPE bool DEFAULT false;
DEFINE FIELD blacklist_reason ON TABLE driver TYPE option<string>;
DEFINE FIELD created_at ON TABLE driver TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_driver_name ON TABLE driver \
    COLUMNS last_name, other_names;

-- =======================================================================
-- Accessories (bookable extras)
-- =======================================================================
DEFINE TABLE accessory SCHEMAFULL;
DEFINE FIELD description ON TABLE accessory TYPE string;
DEFINE FIELD created_at ON TABLE accessory TYPE datetime \
    DEFAULT time::now();

-- Booking -> Accessory link
DEFINE TABLE booking_accessory SCHEMAFULL;
DEFINE FIELD booking_id ON TABLE booking_accessory TYPE string;
DEFINE FIELD accessory_id ON TABLE booking_accessory TYPE string;
DEFINE INDEX idx_ba_booking ON TABLE booking_accessory \
    COLUMNS booking_id;
DEFINE INDEX idx_ba_pair ON TABLE booking_accessory \
    COLUMNS booking_id, accessory_id UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
