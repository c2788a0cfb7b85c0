use brewmate_core::{Config, DataLayout};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timer.sleep_resolution_ms", "logging.filter")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(layout: &DataLayout, action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let path = layout.config_file();
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(&path)?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(&path)?;
            config.set(&key, &value)?;
            config.save(&path)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load(&path)?;
            for (key, value) in config.list() {
                println!("{key} = {value}");
            }
        }
        ConfigAction::Reset => {
            let mut config = Config::load_or_default(&path);
            config.reset();
            config.save(&path)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
