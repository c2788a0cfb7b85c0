//! The tea closet: one JSON file per profile, keyed by name.
//!
//! Saving under an existing name overwrites that profile; there is no
//! duplicate-name error.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{read_json, write_json};
use crate::error::{CoreError, Result};
use crate::profile::{file_name_for, TeaProfile};

const PROFILE_PREFIX: &str = "tea_";
const PROFILE_SUFFIX: &str = ".json";

/// Storage for tea profiles
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All readable profiles, sorted by name.
    ///
    /// Files that fail to parse are skipped with a warning so one bad file
    /// does not hide the rest of the closet.
    pub fn list(&self) -> Result<Vec<TeaProfile>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CoreError::storage(&self.dir, e)),
        };

        let mut profiles = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CoreError::storage(&self.dir, e))?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.starts_with(PROFILE_PREFIX) || !file_name.ends_with(PROFILE_SUFFIX) {
                continue;
            }
            match read_json::<TeaProfile>(&entry.path()) {
                Ok(profile) => profiles.push(profile),
                Err(e) => warn!(file = %file_name, error = %e, "skipping unreadable profile"),
            }
        }
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    /// Load a profile by name.
    pub fn load(&self, name: &str) -> Result<TeaProfile> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(CoreError::not_found("profile", name));
        }
        read_json(&path)
    }

    /// Validate and persist `profile`, replacing any profile of the same name.
    pub fn save(&self, profile: &TeaProfile) -> Result<()> {
        profile.validate()?;
        let path = self.path_for(&profile.name);
        if path.exists() {
            info!(tea = %profile.name, "overwriting existing profile");
        }
        write_json(&path, profile)
    }

    /// Delete a profile by name.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CoreError::not_found("profile", name))
            }
            Err(e) => Err(CoreError::storage(&path, e)),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(file_name_for(name))
    }
}
