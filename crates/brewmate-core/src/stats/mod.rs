//! Rating statistics over tasting records.
//!
//! Trends are computed on demand from the record list; nothing here is
//! persisted.

mod trend;

pub use trend::{DailyAverage, TeaSummary, TrendReport};
