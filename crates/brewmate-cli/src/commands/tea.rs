use brewmate_core::profile::{format_schedule, format_seconds};
use brewmate_core::{DataLayout, TeaProfile};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum TeaAction {
    /// Create a tea profile (replaces one with the same name)
    Create {
        /// Tea name
        name: String,
        /// Water temperature in Celsius
        #[arg(long)]
        temp: String,
        /// Tea ware, e.g. "Gaiwan"
        #[arg(long)]
        ware: String,
        /// Water amount in ml
        #[arg(long)]
        water: String,
        /// Leaf weight in grams
        #[arg(long)]
        weight: String,
        /// Serve with milk
        #[arg(long)]
        milk: bool,
        /// Seconds to wait for each pour, in order (repeat per pour)
        #[arg(long = "interval", required = true)]
        intervals: Vec<u32>,
    },
    /// List tea profiles
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one tea profile
    Show {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete a tea profile
    Delete { name: String },
}

pub fn run(layout: &DataLayout, action: TeaAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = layout.profile_store();

    match action {
        TeaAction::Create {
            name,
            temp,
            ware,
            water,
            weight,
            milk,
            intervals,
        } => {
            let profile = TeaProfile::new(name, intervals)
                .with_water_temperature(temp)
                .with_tea_ware(ware)
                .with_water_amount(water)
                .with_tea_weight(weight)
                .with_milk(milk);
            let replaced = store.exists(&profile.name);
            store.save(&profile)?;
            if replaced {
                println!("Tea updated: {}", profile.name);
            } else {
                println!("Tea created: {}", profile.name);
            }
        }
        TeaAction::List { json } => {
            let profiles = store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profiles)?);
            } else if profiles.is_empty() {
                println!("No teas in the closet yet.");
            } else {
                for profile in &profiles {
                    println!("{}", profile.summary_line());
                }
            }
        }
        TeaAction::Show { name, json } => {
            let profile = store.load(&name)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("Name:        {}", profile.name);
                println!("Water temp:  {} C", profile.water_temperature_c);
                println!("Tea ware:    {}", profile.tea_ware_name);
                println!("Water:       {} ml", profile.water_amount_ml);
                println!("Leaf weight: {} g", profile.tea_weight_g);
                println!("Milk:        {}", if profile.add_milk { "yes" } else { "no" });
                println!("Pours:       {}", profile.pour_count);
                println!("Schedule:    {}", format_schedule(&profile.pour_intervals_seconds));
                println!(
                    "Total steep: {}",
                    format_seconds(profile.total_steep_seconds())
                );
                println!(
                    "Created:     {}",
                    profile.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
                );
            }
        }
        TeaAction::Delete { name } => {
            store.delete(&name)?;
            println!("Tea deleted: {name}");
        }
    }
    Ok(())
}
