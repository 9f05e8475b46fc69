//! User domain model.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub dob: NaiveDate,
    pub blacklisted: bool,
    pub disabled: bool,
    pub verified: bool,
    /// Repeat customers may book late returns.
    pub repeat: bool,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whole years of age on `today`.
    pub fn age_years(&self, today: NaiveDate) -> i32 {
        let mut age = today.year() - self.dob.year();
        if (today.month(), today.day()) < (self.dob.month(), self.dob.day()) {
            age -= 1;
        }
        age
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub full_name: String,
    /// Already hashed — the account service owns hashing.
    pub password_hash: String,
    pub dob: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_born(dob: NaiveDate) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@b.c".into(),
            full_name: "Test".into(),
            password_hash: String::new(),
            dob,
            blacklisted: false,
            disabled: false,
            verified: true,
            repeat: false,
            admin: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn age_counts_whole_years_only() {
        let dob = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();
        let user = user_born(dob);
        let day_before = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let birthday = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(user.age_years(day_before), 24);
        assert_eq!(user.age_years(birthday), 25);
    }
}
