//! Tasting record persistence.
//!
//! All records live in one JSON array that is read, modified and written
//! back whole. Photos are copied into an images directory owned by the
//! store; deleting a record deletes its photo.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use super::{read_json, write_atomic, write_json};
use crate::error::{CoreError, Result};
use crate::record::{ExportFormat, TastingRecord};

/// Storage for tasting records and their photos
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    images: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>, images: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            images: images.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn images_dir(&self) -> &Path {
        &self.images
    }

    /// All records in insertion order.
    pub fn list(&self) -> Result<Vec<TastingRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        read_json(&self.path)
    }

    pub fn get(&self, id: &str) -> Result<TastingRecord> {
        self.list()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::not_found("record", id))
    }

    /// Records brewed on `date` in the local timezone.
    pub fn list_by_date(&self, date: NaiveDate) -> Result<Vec<TastingRecord>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|r| r.brewed_at_local().date_naive() == date)
            .collect())
    }

    /// Append `record`, copying `image` into the store first.
    ///
    /// Assigns a unique time-derived id and, with an image, the owned
    /// image file name. If the record list cannot be written the copied
    /// image is removed again.
    pub fn append(&self, mut record: TastingRecord, image: Option<&Path>) -> Result<TastingRecord> {
        let mut records = self.list()?;
        record.id = unique_id(&records);

        if let Some(source) = image {
            if !source.is_file() {
                return Err(CoreError::not_found("image", source.display().to_string()));
            }
            let file_name = self.image_file_name(source);
            fs::create_dir_all(&self.images).map_err(|e| CoreError::storage(&self.images, e))?;
            let dest = self.images.join(&file_name);
            fs::copy(source, &dest).map_err(|e| CoreError::storage(&dest, e))?;
            record.image_filename = Some(file_name);
        }

        records.push(record.clone());
        if let Err(e) = write_json(&self.path, &records) {
            if let Some(copied) = record.image_filename.as_deref() {
                let _ = fs::remove_file(self.images.join(copied));
            }
            return Err(e);
        }

        info!(id = %record.id, tea = %record.tea_name, "tasting record saved");
        Ok(record)
    }

    /// Delete a record and its owned photo.
    pub fn delete(&self, id: &str) -> Result<TastingRecord> {
        let mut records = self.list()?;
        let pos = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CoreError::not_found("record", id))?;
        let removed = records.remove(pos);

        write_json(&self.path, &records)?;

        if let Some(image) = self.image_path(&removed) {
            match fs::remove_file(&image) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(image = %image.display(), "record image already missing");
                }
                Err(e) => warn!(image = %image.display(), error = %e, "failed to delete record image"),
            }
        }
        info!(id = %removed.id, "tasting record deleted");
        Ok(removed)
    }

    /// Absolute path of a record's owned photo, if it has one.
    pub fn image_path(&self, record: &TastingRecord) -> Option<PathBuf> {
        record
            .image_filename
            .as_deref()
            .map(|name| self.images.join(name))
    }

    /// Referenced photos that are missing from the images directory.
    pub fn missing_images(&self) -> Result<Vec<String>> {
        Ok(self
            .list()?
            .iter()
            .filter_map(|r| r.image_filename.clone())
            .filter(|name| !self.images.join(name).is_file())
            .collect())
    }

    /// Write one record to `dest` in the given format.
    pub fn export(&self, id: &str, format: ExportFormat, dest: &Path) -> Result<()> {
        let record = self.get(id)?;
        let content = record.export(format)?;
        write_atomic(dest, content.as_bytes())
    }

    fn image_file_name(&self, source: &Path) -> String {
        let ext = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let name = format!("tea_image_{millis}{ext}");
            if !self.images.join(&name).exists() {
                return name;
            }
            millis += 1;
        }
    }
}

/// Millisecond timestamp, bumped past any id already in use.
fn unique_id(records: &[TastingRecord]) -> String {
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let id = millis.to_string();
        if !records.iter().any(|r| r.id == id) {
            return id;
        }
        millis += 1;
    }
}
