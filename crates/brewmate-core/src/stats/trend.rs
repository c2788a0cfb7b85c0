//! Rating trends: per-tea averages and a per-day timeline.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::record::TastingRecord;

/// Aggregated ratings for one tea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeaSummary {
    pub tea_name: String,
    /// Number of tasting records for this tea
    pub brew_count: usize,
    pub average_rating: f64,
    pub best_rating: u8,
    pub last_brewed: DateTime<Utc>,
}

/// Mean rating of all brews on one local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAverage {
    pub date: NaiveDate,
    pub brew_count: usize,
    pub average_rating: f64,
}

/// Rating trends across a set of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub total_brews: usize,
    /// Mean over every record, 0.0 when there are none
    pub average_rating: f64,
    /// Sorted by average rating, best first; ties by name
    pub teas: Vec<TeaSummary>,
    /// Sorted by date, oldest first
    pub timeline: Vec<DailyAverage>,
}

impl TrendReport {
    pub fn from_records(records: &[TastingRecord]) -> Self {
        let mut by_tea: BTreeMap<&str, Vec<&TastingRecord>> = BTreeMap::new();
        let mut by_day: BTreeMap<NaiveDate, Vec<u8>> = BTreeMap::new();

        for record in records {
            by_tea.entry(record.tea_name.as_str()).or_default().push(record);
            by_day
                .entry(record.brewed_at_local().date_naive())
                .or_default()
                .push(record.rating);
        }

        let mut teas: Vec<TeaSummary> = by_tea
            .into_iter()
            .filter_map(|(name, brews)| {
                let last = brews.iter().map(|r| r.brewed_at).max()?;
                let best = brews.iter().map(|r| r.rating).max()?;
                Some(TeaSummary {
                    tea_name: name.to_string(),
                    brew_count: brews.len(),
                    average_rating: mean(brews.iter().map(|r| r.rating)),
                    best_rating: best,
                    last_brewed: last,
                })
            })
            .collect();
        teas.sort_by(|a, b| {
            b.average_rating
                .total_cmp(&a.average_rating)
                .then_with(|| a.tea_name.cmp(&b.tea_name))
        });

        let timeline = by_day
            .into_iter()
            .map(|(date, ratings)| DailyAverage {
                date,
                brew_count: ratings.len(),
                average_rating: mean(ratings.into_iter()),
            })
            .collect();

        Self {
            total_brews: records.len(),
            average_rating: mean(records.iter().map(|r| r.rating)),
            teas,
            timeline,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_brews == 0
    }

    /// Highest-rated tea, if any records exist.
    pub fn favourite(&self) -> Option<&TeaSummary> {
        self.teas.first()
    }

    pub fn tea(&self, name: &str) -> Option<&TeaSummary> {
        self.teas.iter().find(|t| t.tea_name == name)
    }
}

fn mean(ratings: impl Iterator<Item = u8>) -> f64 {
    let (sum, count) = ratings.fold((0u64, 0u64), |(s, c), r| (s + r as u64, c + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
