use brewmate_core::{Config, DataLayout};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "brewmate", version, about = "Brewmate tea brewing timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tea profile management
    Tea {
        #[command(subcommand)]
        action: commands::tea::TeaAction,
    },
    /// Brew a saved tea with pour reminders, then record a tasting
    Brew(commands::brew::BrewArgs),
    /// Tasting record management
    Record {
        #[command(subcommand)]
        action: commands::record::RecordAction,
    },
    /// Render the daily report image
    Report(commands::report::ReportArgs),
    /// Rating trends across all records
    Stats(commands::stats::StatsArgs),
    /// Theme and custom background settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate the wooden background image
    Background(commands::background::BackgroundArgs),
}

fn init_tracing(config: &Config) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();

    let layout = DataLayout::default_location();
    if let Err(e) = layout.ensure() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }
    let config = Config::load_or_default(&layout.config_file());
    init_tracing(&config);

    let result = match cli.command {
        Commands::Tea { action } => commands::tea::run(&layout, action),
        Commands::Brew(args) => commands::brew::run(&layout, &config, args),
        Commands::Record { action } => commands::record::run(&layout, action),
        Commands::Report(args) => commands::report::run(&layout, &config, args),
        Commands::Stats(args) => commands::stats::run(&layout, args),
        Commands::Settings { action } => commands::settings::run(&layout, action),
        Commands::Config { action } => commands::config::run(&layout, action),
        Commands::Background(args) => commands::background::run(&layout, args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
