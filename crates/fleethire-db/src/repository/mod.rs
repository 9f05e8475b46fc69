//! SurrealDB repository implementations.
//!
//! Each repository is generic over the SurrealDB connection type so
//! production code can use the WebSocket client while tests run
//! against the embedded in-memory engine.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::DbError;

pub mod booking;
pub mod car;
pub mod driver;
pub mod status;
pub mod user;

pub use booking::SurrealBookingRepository;
pub use car::SurrealCarRepository;
pub use driver::SurrealDriverRepository;
pub use status::SurrealStatusRepository;
pub use user::SurrealUserRepository;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Render a date as the ISO `YYYY-MM-DD` string stored in SurrealDB.
/// Lexicographic ordering on these strings matches date ordering.
pub(crate) fn date_str(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| DbError::Decode(format!("invalid date '{s}': {e}")))
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid UUID '{s}': {e}")))
}

pub(crate) fn parse_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>, DbError> {
    s.map(parse_uuid).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        assert_eq!(date_str(date), "2025-07-04");
        assert_eq!(parse_date("2025-07-04").unwrap(), date);
    }

    #[test]
    fn date_strings_order_like_dates() {
        let early = date_str(NaiveDate::from_ymd_opt(2025, 9, 30).unwrap());
        let late = date_str(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        assert!(early < late);
    }
}
