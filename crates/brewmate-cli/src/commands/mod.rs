pub mod background;
pub mod brew;
pub mod config;
pub mod record;
pub mod report;
pub mod settings;
pub mod stats;
pub mod tea;

use chrono::{Local, NaiveDate};

/// Parse `YYYY-MM-DD`, defaulting to today in local time.
pub(crate) fn parse_date(date: Option<&str>) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match date {
        None => Ok(Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| format!("invalid date '{s}', expected YYYY-MM-DD").into()),
    }
}
