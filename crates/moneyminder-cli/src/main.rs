use clap::{Parser, Subcommand};
use moneyminder_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod local;

#[derive(Parser)]
#[command(name = "moneyminder-cli", version, about = "MoneyMinder notifications CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// In-app notification log
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Notification preferences
    Prefs {
        #[command(subcommand)]
        action: commands::prefs::PrefsAction,
    },
    /// Quiet hours
    Quiet {
        #[command(subcommand)]
        action: commands::quiet::QuietAction,
    },
    /// Due-date reminders
    Remind {
        #[command(subcommand)]
        action: commands::remind::RemindAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr; `RUST_LOG` overrides the configured level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = AppConfig::load_or_default().logging.level;
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Notify { action } => commands::notify::run(action),
        Commands::Prefs { action } => commands::prefs::run(action),
        Commands::Quiet { action } => commands::quiet::run(action),
        Commands::Remind { action } => commands::remind::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
