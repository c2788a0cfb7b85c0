use brewmate_core::{DataLayout, TrendReport};
use clap::Args;

#[derive(Args)]
pub struct StatsArgs {
    /// Print the full trend report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(layout: &DataLayout, args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let records = layout.record_store().list()?;
    let trend = TrendReport::from_records(&records);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&trend)?);
        return Ok(());
    }
    if trend.is_empty() {
        println!("No tasting records yet.");
        return Ok(());
    }

    println!("Brews: {}    Average rating: {:.1}/10", trend.total_brews, trend.average_rating);
    println!();
    println!("{:<24} {:>5} {:>7} {:>5}  last brewed", "tea", "brews", "avg", "best");
    for tea in &trend.teas {
        println!(
            "{:<24} {:>5} {:>7.1} {:>5}  {}",
            tea.tea_name,
            tea.brew_count,
            tea.average_rating,
            tea.best_rating,
            tea.last_brewed.with_timezone(&chrono::Local).format("%Y-%m-%d"),
        );
    }
    println!();
    for day in &trend.timeline {
        let bar = "#".repeat(day.average_rating.round() as usize);
        println!(
            "{}  {:<10} {:.1} ({} brews)",
            day.date.format("%Y-%m-%d"),
            bar,
            day.average_rating,
            day.brew_count
        );
    }
    Ok(())
}
