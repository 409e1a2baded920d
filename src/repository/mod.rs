//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! against a SQLite file.

pub mod company;
pub mod contact;
pub mod context;
pub mod job;
pub mod models;
pub mod pool;
pub mod scraper_log;
pub mod util;

pub use company::CompanyRepository;
pub use contact::ContactRepository;
pub use context::DbContext;
pub use job::{JobRepository, Page};
pub use pool::{DbError, SqlitePool};
pub use scraper_log::ScraperLogRepository;

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp for storage.
///
/// Fixed-width microsecond precision in UTC, so stored values sort
/// lexicographically in time order.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_sorts_chronologically() {
        let a = Utc.with_ymd_and_hms(2024, 1, 9, 23, 59, 59).unwrap();
        let b = a + chrono::Duration::milliseconds(1);
        let c = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert!(format_datetime(&a) < format_datetime(&b));
        assert!(format_datetime(&b) < format_datetime(&c));
        assert_eq!(parse_datetime(&format_datetime(&b)), b);
    }

    #[test]
    fn test_parse_invalid_defaults() {
        assert_eq!(parse_datetime("garbage"), DateTime::UNIX_EPOCH);
        assert_eq!(parse_datetime_opt(Some("garbage".into())), None);
        assert_eq!(parse_datetime_opt(None), None);
    }
}
