//! Tasting records: the evaluation a user files after a finished brew.

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::profile::{format_schedule, TeaProfile};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 10;

/// A persisted post-brew evaluation.
///
/// Profile fields are copied at brew time, so later edits or deletion of the
/// profile do not affect the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TastingRecord {
    pub id: String,
    pub tea_name: String,
    pub pour_count: u32,
    #[serde(default)]
    pub add_milk: bool,
    pub rating: u8,
    pub notes: String,
    pub brewed_at: DateTime<Utc>,
    #[serde(default)]
    pub image_filename: Option<String>,
    #[serde(default)]
    pub pour_intervals_seconds: Vec<u32>,
}

/// What the user submits after a brew.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub rating: u8,
    pub notes: String,
    /// Optional photo; the record store keeps its own copy.
    pub image: Option<PathBuf>,
}

impl Evaluation {
    pub fn new(rating: u8, notes: impl Into<String>) -> Self {
        Self {
            rating,
            notes: notes.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<PathBuf>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(CoreError::InvalidEvaluation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {}",
                self.rating
            )));
        }
        if self.notes.trim().is_empty() {
            return Err(CoreError::InvalidEvaluation(
                "tasting notes must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Export format for a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Json,
}

impl TastingRecord {
    /// Build a record from the finished profile and the user's evaluation.
    ///
    /// The id and image file name are assigned by the record store.
    pub fn from_brew(
        profile: &TeaProfile,
        evaluation: &Evaluation,
        brewed_at: DateTime<Utc>,
    ) -> Result<Self> {
        evaluation.validate()?;
        Ok(Self {
            id: String::new(),
            tea_name: profile.name.clone(),
            pour_count: profile.pour_count,
            add_milk: profile.add_milk,
            rating: evaluation.rating,
            notes: evaluation.notes.trim().to_string(),
            brewed_at,
            image_filename: None,
            pour_intervals_seconds: profile.pour_intervals_seconds.clone(),
        })
    }

    /// Brew time in the local timezone, as shown to the user.
    pub fn brewed_at_local(&self) -> DateTime<Local> {
        self.brewed_at.with_timezone(&Local)
    }

    pub fn rating_stars(&self) -> String {
        "*".repeat(self.rating as usize)
    }

    /// Plain-text tasting sheet.
    pub fn to_text(&self) -> String {
        format!(
            "Tasting Record\n\
             ==============\n\
             \n\
             Tea: {}\n\
             Brewed: {}\n\
             Rating: {} ({}/{})\n\
             Pours: {}\n\
             Milk: {}\n\
             \n\
             Notes:\n\
             {}\n\
             \n\
             Schedule: {}\n\
             Photo: {}\n",
            self.tea_name,
            self.brewed_at_local().format("%Y-%m-%d %H:%M:%S"),
            self.rating_stars(),
            self.rating,
            MAX_RATING,
            self.pour_count,
            if self.add_milk { "yes" } else { "no" },
            self.notes,
            format_schedule(&self.pour_intervals_seconds),
            if self.image_filename.is_some() { "yes" } else { "no" },
        )
    }

    /// Serialize in the requested export format.
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Text => Ok(self.to_text()),
            ExportFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| CoreError::json(format!("record {}", self.id), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> TeaProfile {
        TeaProfile::new("Assam", vec![30, 90]).with_milk(true)
    }

    #[test]
    fn evaluation_bounds() {
        assert!(Evaluation::new(1, "ok").validate().is_ok());
        assert!(Evaluation::new(10, "ok").validate().is_ok());
        assert!(Evaluation::new(0, "ok").validate().is_err());
        assert!(Evaluation::new(11, "ok").validate().is_err());
        assert!(Evaluation::new(5, "   ").validate().is_err());
    }

    #[test]
    fn from_brew_copies_profile() {
        let record =
            TastingRecord::from_brew(&profile(), &Evaluation::new(8, " malty "), Utc::now())
                .unwrap();
        assert_eq!(record.tea_name, "Assam");
        assert_eq!(record.pour_count, 2);
        assert!(record.add_milk);
        assert_eq!(record.notes, "malty");
        assert_eq!(record.pour_intervals_seconds, vec![30, 90]);
        assert!(record.image_filename.is_none());
    }

    #[test]
    fn text_export_mentions_key_fields() {
        let record =
            TastingRecord::from_brew(&profile(), &Evaluation::new(3, "flat"), Utc::now()).unwrap();
        let text = record.export(ExportFormat::Text).unwrap();
        assert!(text.contains("Tea: Assam"));
        assert!(text.contains("*** (3/10)"));
        assert!(text.contains("Schedule: 30s, 1m30s"));
        assert!(text.contains("Photo: no"));
    }

    #[test]
    fn json_export_parses_back() {
        let record =
            TastingRecord::from_brew(&profile(), &Evaluation::new(7, "bright"), Utc::now())
                .unwrap();
        let json = record.export(ExportFormat::Json).unwrap();
        let parsed: TastingRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
