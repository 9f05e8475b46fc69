//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashes arrive pre-computed; the account service owns the
//! hashing policy. Dates of birth are stored as `YYYY-MM-DD` strings.

use chrono::{DateTime, Utc};
use fleethire_core::error::FleetResult;
use fleethire_core::models::user::{CreateUser, User};
use fleethire_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{date_str, parse_date};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    email: String,
    full_name: String,
    password_hash: String,
    dob: String,
    blacklisted: bool,
    disabled: bool,
    verified: bool,
    repeat_customer: bool,
    admin: bool,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    email: String,
    full_name: String,
    password_hash: String,
    dob: String,
    blacklisted: bool,
    disabled: bool,
    verified: bool,
    repeat_customer: bool,
    admin: bool,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            email: self.email,
            full_name: self.full_name,
            password_hash: self.password_hash,
            dob: parse_date(&self.dob)?,
            blacklisted: self.blacklisted,
            disabled: self.disabled,
            verified: self.verified,
            repeat: self.repeat_customer,
            admin: self.admin,
            created_at: self.created_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = super::parse_uuid(&self.record_id)?;
        Ok(User {
            id,
            email: self.email,
            full_name: self.full_name,
            password_hash: self.password_hash,
            dob: parse_date(&self.dob)?,
            blacklisted: self.blacklisted,
            disabled: self.disabled,
            verified: self.verified,
            repeat: self.repeat_customer,
            admin: self.admin,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn set_flag(&self, id: Uuid, field: &str, value: bool) -> FleetResult<()> {
        let query = format!(
            "UPDATE type::record('user', $id) SET {field} = $value, \
             updated_at = time::now()"
        );
        self.db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("value", value))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> FleetResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 email = $email, \
                 full_name = $full_name, \
                 password_hash = $password_hash, \
                 dob = $dob, \
                 blacklisted = false, \
                 disabled = false, \
                 verified = false, \
                 repeat_customer = false, \
                 admin = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("full_name", input.full_name))
            .bind(("password_hash", input.password_hash))
            .bind(("dob", date_str(input.dob)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> FleetResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_email(&self, email: &str) -> FleetResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $email",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn set_blacklisted(&self, id: Uuid, value: bool) -> FleetResult<()> {
        self.set_flag(id, "blacklisted", value).await
    }

    async fn set_repeat(&self, id: Uuid) -> FleetResult<()> {
        self.set_flag(id, "repeat_customer", true).await
    }

    async fn set_disabled(&self, id: Uuid, value: bool) -> FleetResult<()> {
        self.set_flag(id, "disabled", value).await
    }

    async fn set_admin(&self, id: Uuid, value: bool) -> FleetResult<()> {
        self.set_flag(id, "admin", value).await
    }

    async fn search(&self, term: &str) -> FleetResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE string::contains(string::lowercase(email), $term) \
                 OR string::contains(string::lowercase(full_name), $term) \
                 ORDER BY full_name ASC",
            )
            .bind(("term", term.to_lowercase()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let users = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(users)
    }
}
