//! Appearance settings kept next to the tea profiles.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{read_json, write_json};
use crate::error::{CoreError, Result};

/// Visual theme of the shell and of generated reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Classic,
    #[default]
    Wooden,
    Modern,
}

/// RGB colours a theme paints with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: [u8; 3],
    pub accent: [u8; 3],
    pub highlight: [u8; 3],
    pub text: [u8; 3],
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Classic, Theme::Wooden, Theme::Modern];

    pub fn key(self) -> &'static str {
        match self {
            Theme::Classic => "classic",
            Theme::Wooden => "wooden",
            Theme::Modern => "modern",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Theme::Classic => "Classic Beige",
            Theme::Wooden => "European Walnut",
            Theme::Modern => "Modern Minimal",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Classic => Palette {
                background: [0xf5, 0xf5, 0xdc],
                accent: [0xda, 0xa5, 0x20],
                highlight: [0x22, 0x8b, 0x22],
                text: [0x8b, 0x45, 0x13],
            },
            Theme::Wooden => Palette {
                background: [0x2d, 0x1b, 0x14],
                accent: [0xcd, 0x85, 0x3f],
                highlight: [0x8b, 0x15, 0x38],
                text: [0xf5, 0xf5, 0xdc],
            },
            Theme::Modern => Palette {
                background: [0x2c, 0x3e, 0x50],
                accent: [0x34, 0x98, 0xdb],
                highlight: [0x27, 0xae, 0x60],
                text: [0xec, 0xf0, 0xf1],
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|t| t.key() == s)
            .ok_or_else(|| format!("unknown theme '{s}' (expected classic, wooden or modern)"))
    }
}

/// Persisted user settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub custom_background: Option<PathBuf>,
    #[serde(default)]
    pub custom_button_background: Option<PathBuf>,
}

impl Settings {
    /// Load from `path`. A missing or unreadable file yields the defaults;
    /// custom images that no longer exist are dropped.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match read_json::<Settings>(path) {
            Ok(mut settings) => {
                settings.drop_missing_images();
                settings
            }
            Err(e) => {
                warn!(error = %e, "settings unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    pub fn set_custom_background(&mut self, image: Option<PathBuf>) -> Result<()> {
        check_image("background image", image.as_deref())?;
        self.custom_background = image;
        Ok(())
    }

    pub fn set_custom_button_background(&mut self, image: Option<PathBuf>) -> Result<()> {
        check_image("button image", image.as_deref())?;
        self.custom_button_background = image;
        Ok(())
    }

    fn drop_missing_images(&mut self) {
        for (kind, slot) in [
            ("background image", &mut self.custom_background),
            ("button image", &mut self.custom_button_background),
        ] {
            if slot.as_deref().is_some_and(|p| !p.is_file()) {
                if let Some(p) = slot.take() {
                    warn!(path = %p.display(), "{kind} is gone, falling back to the theme");
                }
            }
        }
    }
}

fn check_image(kind: &'static str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) if !p.is_file() => Err(CoreError::not_found(kind, p.display().to_string())),
        _ => Ok(()),
    }
}
