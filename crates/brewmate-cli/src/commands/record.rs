use std::path::PathBuf;

use brewmate_core::{DataLayout, ExportFormat};
use clap::{Subcommand, ValueEnum};

use super::parse_date;

#[derive(Clone, Copy, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => ExportFormat::Text,
            Format::Json => ExportFormat::Json,
        }
    }
}

#[derive(Subcommand)]
pub enum RecordAction {
    /// List tasting records
    List {
        /// Only records brewed on this day (YYYY-MM-DD, local time)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show one tasting record
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete a tasting record and its photo
    Delete { id: String },
    /// Write one record to a file
    Export {
        id: String,
        /// Destination file
        dest: PathBuf,
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Report records whose photo file is missing
    Check,
}

pub fn run(layout: &DataLayout, action: RecordAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = layout.record_store();

    match action {
        RecordAction::List { date, json } => {
            let records = match date {
                Some(date) => store.list_by_date(parse_date(Some(&date))?)?,
                None => store.list()?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No tasting records.");
            } else {
                for r in &records {
                    println!(
                        "{}  {}  {:<20} {:>2}/10 {}{}",
                        r.id,
                        r.brewed_at_local().format("%Y-%m-%d %H:%M"),
                        r.tea_name,
                        r.rating,
                        r.rating_stars(),
                        if r.image_filename.is_some() { "  [photo]" } else { "" },
                    );
                }
            }
        }
        RecordAction::Show { id, json } => {
            let record = store.get(&id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print!("{}", record.to_text());
                if let Some(path) = store.image_path(&record) {
                    println!("Photo file: {}", path.display());
                }
            }
        }
        RecordAction::Delete { id } => {
            store.delete(&id)?;
            println!("Record deleted: {id}");
        }
        RecordAction::Export { id, dest, format } => {
            store.export(&id, format.into(), &dest)?;
            println!("Record exported to {}", dest.display());
        }
        RecordAction::Check => {
            let missing = store.missing_images()?;
            if missing.is_empty() {
                println!("All record photos present.");
            } else {
                for name in &missing {
                    println!("missing photo: {name}");
                }
            }
        }
    }
    Ok(())
}
