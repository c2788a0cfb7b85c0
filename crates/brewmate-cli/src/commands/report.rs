use std::path::PathBuf;

use brewmate_core::report::save_report;
use brewmate_core::{CardReportRenderer, Config, DailyReport, DataLayout, Settings};
use clap::Args;

use super::parse_date;

#[derive(Args)]
pub struct ReportArgs {
    /// Day to report on (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub date: Option<String>,
    /// Output image (.jpg or .png); defaults to tea_report_<date>.jpg
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Print the report as text instead of rendering an image
    #[arg(long)]
    pub text: bool,
}

pub fn run(
    layout: &DataLayout,
    config: &Config,
    args: ReportArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let date = parse_date(args.date.as_deref())?;
    let records = layout.record_store().list_by_date(date)?;
    let report = DailyReport::build(date, &records);

    if args.text {
        if report.is_empty() {
            println!("No tea records on {}", date.format("%Y-%m-%d"));
        } else {
            for line in report.summary_lines() {
                println!("{line}");
            }
        }
        return Ok(());
    }

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("tea_report_{}.jpg", date.format("%Y-%m-%d"))));
    let theme = Settings::load(&layout.settings_file()).theme;
    let renderer = CardReportRenderer::new(config.report.width).with_theme(theme);
    save_report(&renderer, &report, &output)?;
    println!("Report written: {}", output.display());
    Ok(())
}
