//! Tea profiles: a named steeping recipe and its pour schedule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};

/// A named brewing recipe.
///
/// `pour_intervals_seconds[i]` is the wait before pour `i + 1` fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeaProfile {
    pub name: String,
    pub water_temperature_c: String,
    pub tea_ware_name: String,
    pub water_amount_ml: String,
    pub tea_weight_g: String,
    #[serde(default)]
    pub add_milk: bool,
    pub pour_count: u32,
    pub pour_intervals_seconds: Vec<u32>,
    pub created_at: DateTime<Utc>,
}

impl TeaProfile {
    /// Create a profile with the given schedule. The name is trimmed;
    /// `pour_count` follows the number of intervals and the descriptive
    /// fields start empty.
    pub fn new(name: impl Into<String>, pour_intervals_seconds: Vec<u32>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            water_temperature_c: String::new(),
            tea_ware_name: String::new(),
            water_amount_ml: String::new(),
            tea_weight_g: String::new(),
            add_milk: false,
            pour_count: pour_intervals_seconds.len() as u32,
            pour_intervals_seconds,
            created_at: Utc::now(),
        }
    }

    pub fn with_water_temperature(mut self, celsius: impl Into<String>) -> Self {
        self.water_temperature_c = celsius.into();
        self
    }

    pub fn with_tea_ware(mut self, ware: impl Into<String>) -> Self {
        self.tea_ware_name = ware.into();
        self
    }

    pub fn with_water_amount(mut self, ml: impl Into<String>) -> Self {
        self.water_amount_ml = ml.into();
        self
    }

    pub fn with_tea_weight(mut self, grams: impl Into<String>) -> Self {
        self.tea_weight_g = grams.into();
        self
    }

    pub fn with_milk(mut self, add_milk: bool) -> Self {
        self.add_milk = add_milk;
        self
    }

    /// Check every field a session or the tea closet relies on.
    pub fn validate(&self) -> Result<(), ProfileError> {
        self.validate_schedule()?;
        let descriptive = [
            ("water_temperature_c", &self.water_temperature_c),
            ("tea_ware_name", &self.tea_ware_name),
            ("water_amount_ml", &self.water_amount_ml),
            ("tea_weight_g", &self.tea_weight_g),
        ];
        for (field, value) in descriptive {
            if value.trim().is_empty() {
                return Err(ProfileError::EmptyField(field));
            }
        }
        Ok(())
    }

    /// The subset of [`validate`](Self::validate) a brew needs: a name and a
    /// well-formed schedule.
    pub fn validate_schedule(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::EmptyField("name"));
        }
        if self.name.contains(['/', '\\']) {
            return Err(ProfileError::InvalidName(self.name.clone()));
        }
        if self.pour_count == 0 {
            return Err(ProfileError::NoPours);
        }
        if self.pour_intervals_seconds.len() != self.pour_count as usize {
            return Err(ProfileError::IntervalCountMismatch {
                pour_count: self.pour_count,
                intervals: self.pour_intervals_seconds.len(),
            });
        }
        if let Some(pos) = self.pour_intervals_seconds.iter().position(|&s| s == 0) {
            return Err(ProfileError::ZeroInterval(pos + 1));
        }
        Ok(())
    }

    /// Interval in seconds before the given 1-based pour fires.
    pub fn interval(&self, pour_index: usize) -> Option<u32> {
        pour_index
            .checked_sub(1)
            .and_then(|i| self.pour_intervals_seconds.get(i))
            .copied()
    }

    pub fn total_steep_seconds(&self) -> u64 {
        self.pour_intervals_seconds.iter().map(|&s| u64::from(s)).sum()
    }

    /// File name of this profile inside the tea closet.
    pub fn file_name(&self) -> String {
        file_name_for(&self.name)
    }

    /// One-line summary used by listings.
    pub fn summary_line(&self) -> String {
        format!(
            "{} - {}°C - {} pours ({})",
            self.name,
            self.water_temperature_c,
            self.pour_count,
            format_schedule(&self.pour_intervals_seconds)
        )
    }
}

/// Closet file name for a profile name.
pub fn file_name_for(name: &str) -> String {
    format!("tea_{}.json", name.trim().replace(' ', "_"))
}

/// Render a schedule as `1m30s, 45s, ...`.
pub fn format_schedule(intervals: &[u32]) -> String {
    intervals
        .iter()
        .map(|&secs| format_seconds(u64::from(secs)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_seconds(secs: u64) -> String {
    match (secs / 60, secs % 60) {
        (0, s) => format!("{s}s"),
        (m, 0) => format!("{m}m"),
        (m, s) => format!("{m}m{s:02}s"),
    }
}
