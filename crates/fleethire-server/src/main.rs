//! FLEETHIRE Server — binary entry point.
//!
//! Connects to SurrealDB, applies migrations and wires the session
//! and booking services. The HTTP transport sits in front of this
//! binary and is deployed separately.

use std::env;
use std::sync::Arc;

use chrono::Duration;
use fleethire_booking::BookingService;
use fleethire_db::repository::{
    SurrealBookingRepository, SurrealCarRepository, SurrealDriverRepository,
    SurrealStatusRepository, SurrealUserRepository,
};
use fleethire_db::{DbConfig, DbManager, run_migrations};
use fleethire_providers::{
    FraudTable, LicenceTable, MemoryDocumentStore, TableFraudProvider, TableLicenceProvider,
    TracingNotifier,
};
use fleethire_session::{AccountService, SessionConfig, SessionStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn session_config() -> SessionConfig {
    let mut config = SessionConfig::default();
    if let Ok(secs) = env::var("FLEETHIRE_SESSION_IDLE_SECS") {
        if let Ok(secs) = secs.parse::<i64>() {
            config.idle_timeout = Duration::seconds(secs);
        }
    }
    config.pepper = env::var("FLEETHIRE_PEPPER").ok();
    config
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DbConfig::from_env();
    let manager = DbManager::connect(&db_config).await?;
    let db = manager.client().clone();
    run_migrations(&db).await?;

    let users = SurrealUserRepository::new(db.clone());
    let cars = SurrealCarRepository::new(db.clone());
    let bookings = SurrealBookingRepository::new(db.clone());
    let statuses = SurrealStatusRepository::new(db.clone());
    let drivers = SurrealDriverRepository::new(db.clone());

    let sessions = Arc::new(SessionStore::new(&session_config()));
    let _accounts = AccountService::new(users.clone(), sessions.clone(), session_config());

    // Watchlists are loaded out-of-band and swapped in whole; the
    // service starts with empty tables until the first refresh.
    let _bookings = BookingService::new(
        users,
        cars,
        bookings,
        statuses,
        drivers,
        TableLicenceProvider::new(LicenceTable::new()),
        TableFraudProvider::new(FraudTable::new()),
        Arc::new(TracingNotifier::new()),
        MemoryDocumentStore::new(),
    );

    info!("FLEETHIRE server started");

    tokio::signal::ctrl_c().await?;

    info!(
        active_sessions = sessions.count(),
        "FLEETHIRE server stopping"
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("fleethire=info".parse().unwrap()),
        )
        .json()
        .init();

    info!("Starting FLEETHIRE server...");

    if let Err(err) = run().await {
        error!(%err, "Server terminated with error");
        std::process::exit(1);
    }

    info!("FLEETHIRE server stopped.");
}
