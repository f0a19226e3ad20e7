pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use scout_core::config::{LogFormat, LoggingConfig};

#[derive(Debug, Parser)]
#[command(
    name = "scout",
    about = "Follower scout operator CLI",
    long_about = "Inspect configuration, check readiness and run follower analyses without Telegram.",
    after_help = "Examples:\n  scout doctor --json\n  scout config\n  scout analyze @some.creator --output reports"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, credential readiness and vendor endpoint settings")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Analyze the followers of an account and write the xlsx report to disk")]
    Analyze {
        #[arg(help = "Target username, with or without the leading @")]
        handle: String,
        #[arg(long, short, default_value = ".", help = "Directory the report is written to")]
        output: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Analyze { handle, output } => commands::analyze::run(&handle, &output),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays reserved for status lines and the
/// JSON outcome.
pub(crate) fn init_logging(logging: &LoggingConfig) {
    use tracing::Level;

    let level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr);

    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
