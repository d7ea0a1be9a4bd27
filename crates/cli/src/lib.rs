pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use dentabill_core::config::{AppConfig, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "dentabill",
    about = "Dentabill operator CLI",
    long_about = "Operate Dentabill migrations, price resolution, manual overrides, and payment allocation previews.",
    after_help = "Examples:\n  dentabill migrate\n  dentabill price preview --work-id W-17\n  dentabill price fix --work-id W-17\n  dentabill allocate --client-id C-3 --amount 150 --work-id W-17 --work-id W-18"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(subcommand, about = "Preview, fix, or resolve work prices")]
    Price(commands::price::PriceCommand),
    #[command(about = "Append a manual price override to a fixed snapshot")]
    Override(commands::override_price::OverrideArgs),
    #[command(about = "Preview FIFO allocation of a payment across a client's works")]
    Allocate(commands::allocate::AllocateArgs),
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(Default::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Price(command) => commands::price::run(command),
        Command::Override(args) => commands::override_price::run(args),
        Command::Allocate(args) => commands::allocate::run(args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
