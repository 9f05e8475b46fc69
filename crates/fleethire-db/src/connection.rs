//! SurrealDB connection handling.

use std::env;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

/// Where and how to reach SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket address, host:port.
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials.
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "fleethire".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Build a config from `FLEETHIRE_DB_*` environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env::var("FLEETHIRE_DB_URL").unwrap_or(defaults.url),
            namespace: env::var("FLEETHIRE_DB_NS").unwrap_or(defaults.namespace),
            database: env::var("FLEETHIRE_DB_NAME").unwrap_or(defaults.database),
            username: env::var("FLEETHIRE_DB_USER").unwrap_or(defaults.username),
            password: env::var("FLEETHIRE_DB_PASS").unwrap_or(defaults.password),
        }
    }
}

/// A signed-in SurrealDB client bound to one namespace/database.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Open the WebSocket connection, sign in as root and select the
    /// configured namespace and database.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Connected to SurrealDB");

        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_local_instance() {
        let config = DbConfig::default();
        assert_eq!(config.url, "127.0.0.1:8000");
        assert_eq!(config.namespace, "fleethire");
    }
}
