//! Daily tasting reports and generated artwork.
//!
//! A [`DailyReport`] gathers the records brewed on one local day. A
//! [`ReportRenderer`] turns it into an image, and [`save_report`] encodes
//! that image as JPEG or PNG depending on the target file extension.

mod background;
mod card;
mod draw;

pub use background::{
    generate_background, save_background, DEFAULT_BACKGROUND_HEIGHT, DEFAULT_BACKGROUND_WIDTH,
};
pub use card::CardReportRenderer;

use std::io::Cursor;
use std::path::Path;

use chrono::NaiveDate;
use image::codecs::jpeg::JpegEncoder;
use image::error::{ImageFormatHint, UnsupportedError};
use image::{ImageError, ImageFormat, RgbImage};
use tracing::info;

use crate::error::{CoreError, Result};
use crate::record::TastingRecord;
use crate::storage::write_atomic;

const JPEG_QUALITY: u8 = 95;

/// Records of one local calendar day, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub records: Vec<TastingRecord>,
}

impl DailyReport {
    /// Keep the records brewed on `date` (local time), ordered by brew time.
    pub fn build(date: NaiveDate, records: &[TastingRecord]) -> Self {
        let mut records: Vec<_> = records
            .iter()
            .filter(|r| r.brewed_at_local().date_naive() == date)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.brewed_at);
        Self { date, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn average_rating(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.records.iter().map(|r| r.rating as u32).sum();
        sum as f64 / self.records.len() as f64
    }

    /// Plain-text rendition of the report.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Daily report {}", self.date.format("%Y-%m-%d")),
            format!(
                "Records: {}    Average rating: {:.1}/10",
                self.len(),
                self.average_rating()
            ),
        ];
        for r in &self.records {
            lines.push(format!(
                "{} {} {} ({}/10){}",
                r.brewed_at_local().format("%H:%M"),
                r.tea_name,
                r.rating_stars(),
                r.rating,
                if r.image_filename.is_some() { " [photo]" } else { "" },
            ));
        }
        lines
    }
}

/// Turns a daily report into a raster image.
pub trait ReportRenderer {
    fn render(&self, report: &DailyReport) -> Result<RgbImage>;
}

/// Render `report` and write it to `path`.
///
/// # Errors
/// `NotFound` when the day has no records, `Image` when the extension is
/// neither JPEG nor PNG or encoding fails, `StorageFailure` on write errors.
pub fn save_report(renderer: &dyn ReportRenderer, report: &DailyReport, path: &Path) -> Result<()> {
    if report.is_empty() {
        return Err(CoreError::not_found(
            "records for",
            report.date.format("%Y-%m-%d").to_string(),
        ));
    }
    let img = renderer.render(report)?;
    save_image(&img, path)?;
    info!(path = %path.display(), records = report.len(), "daily report written");
    Ok(())
}

/// Encode by extension (`.jpg`/`.jpeg` or `.png`) and write atomically.
pub(crate) fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)?;
    let mut bytes = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(img)?;
        }
        ImageFormat::Png => {
            img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        }
        other => {
            return Err(ImageError::Unsupported(UnsupportedError::from(
                ImageFormatHint::Exact(other),
            ))
            .into());
        }
    }
    write_atomic(path, &bytes)
}
