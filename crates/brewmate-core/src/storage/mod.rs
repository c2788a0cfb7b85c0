mod config;
mod profiles;
mod records;
mod settings;

pub use config::{Config, LoggingConfig, ReportConfig, TimerConfig, MIN_REPORT_WIDTH};
pub use profiles::ProfileStore;
pub use records::RecordStore;
pub use settings::{Palette, Settings, Theme};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, Result};

/// Returns the Brewmate data directory.
///
/// `BREWMATE_HOME` wins when set. Otherwise `~/.config/brewmate`, or
/// `~/.config/brewmate-dev` with `BREWMATE_ENV=dev`.
pub fn data_dir() -> PathBuf {
    if let Some(home) = std::env::var_os("BREWMATE_HOME") {
        return PathBuf::from(home);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("BREWMATE_ENV").unwrap_or_else(|_| "production".to_string());

    if env == "dev" {
        base_dir.join("brewmate-dev")
    } else {
        base_dir.join("brewmate")
    }
}

/// Directory tree holding everything Brewmate persists.
///
/// ```text
/// <root>/config.toml
/// <root>/tea_closet/tea_<name>.json
/// <root>/tea_closet/settings.json
/// <root>/record/tea_records.json
/// <root>/record/images/tea_image_<millis>.<ext>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    pub root: PathBuf,
    pub tea_closet: PathBuf,
    pub records: PathBuf,
    pub images: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let tea_closet = root.join("tea_closet");
        let records = root.join("record");
        let images = records.join("images");
        Self {
            root,
            tea_closet,
            records,
            images,
        }
    }

    /// Layout rooted at [`data_dir`].
    pub fn default_location() -> Self {
        Self::new(data_dir())
    }

    /// Create every directory of the layout.
    ///
    /// # Errors
    /// Returns `CoreError::StorageFailure` naming the directory that could
    /// not be created.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.root, &self.tea_closet, &self.records, &self.images] {
            fs::create_dir_all(dir).map_err(|e| CoreError::storage(dir, e))?;
        }
        Ok(())
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.tea_closet.join("settings.json")
    }

    pub fn records_file(&self) -> PathBuf {
        self.records.join("tea_records.json")
    }

    pub fn profile_store(&self) -> ProfileStore {
        ProfileStore::new(&self.tea_closet)
    }

    pub fn record_store(&self) -> RecordStore {
        RecordStore::new(self.records_file(), &self.images)
    }
}

/// Replace `path` with `bytes` by writing a sibling temp file and renaming
/// it over the target, so readers never see a half-written file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "brewmate".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    let written = fs::File::create(&tmp)
        .and_then(|mut f| {
            f.write_all(bytes)?;
            f.sync_all()
        })
        .and_then(|_| fs::rename(&tmp, path));

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(CoreError::storage(path, e));
    }
    Ok(())
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(|e| CoreError::json(path, e))?;
    write_atomic(path, content.as_bytes())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| CoreError::storage(path, e))?;
    serde_json::from_str(&content).map_err(|e| CoreError::json(path, e))
}
