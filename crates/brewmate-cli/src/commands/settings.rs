use std::path::PathBuf;

use brewmate_core::{DataLayout, Settings, Theme};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print current settings as JSON
    Show,
    /// List available themes
    Themes,
    /// Select a theme (classic, wooden, modern)
    Theme { theme: Theme },
    /// Set or clear the custom background image
    Background {
        path: Option<PathBuf>,
        #[arg(long, conflicts_with = "path")]
        clear: bool,
    },
    /// Set or clear the custom button background image
    ButtonBackground {
        path: Option<PathBuf>,
        #[arg(long, conflicts_with = "path")]
        clear: bool,
    },
}

pub fn run(layout: &DataLayout, action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let path = layout.settings_file();
    let mut settings = Settings::load(&path);

    let message = match action {
        SettingsAction::Show => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            return Ok(());
        }
        SettingsAction::Themes => {
            for theme in Theme::ALL {
                let marker = if theme == settings.theme { "*" } else { " " };
                println!("{marker} {:<8} {}", theme.key(), theme.display_name());
            }
            return Ok(());
        }
        SettingsAction::Theme { theme } => {
            settings.theme = theme;
            format!("Theme set to {}", theme.display_name())
        }
        SettingsAction::Background { path, clear } => {
            let image = if clear { None } else { required(path)? };
            settings.set_custom_background(image)?;
            "Custom background updated".to_string()
        }
        SettingsAction::ButtonBackground { path, clear } => {
            let image = if clear { None } else { required(path)? };
            settings.set_custom_button_background(image)?;
            "Custom button background updated".to_string()
        }
    };

    settings.save(&path)?;
    println!("{message}");
    Ok(())
}

fn required(path: Option<PathBuf>) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(Some(p)),
        None => Err("give an image path or --clear".into()),
    }
}
