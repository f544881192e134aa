pub mod commands;
pub mod logging;
pub mod trigger;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "flowsnap",
    about = "Flowsnap agent structure exporter",
    long_about = "Snapshot conversational-agent configurations into append-only structure tables.",
    after_help = "Examples:\n  flowsnap run --message trigger.json\n  flowsnap export --snapshot agent.json --out out/\n  flowsnap migrate --project acme-dw\n  flowsnap config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Process a batch trigger message and append every listed agent")]
    Run {
        #[arg(long, help = "Path to the trigger message, or `-` for stdin")]
        message: String,
    },
    #[command(about = "Flatten one snapshot file into JSON lines or per-table counts")]
    Export {
        #[arg(long, help = "Agent snapshot JSON file")]
        snapshot: PathBuf,
        #[arg(long, help = "Directory receiving one <table>.jsonl per table")]
        out: Option<PathBuf>,
        #[arg(long, help = "RFC 3339 stamp for every row (defaults to now)")]
        snapshot_at: Option<DateTime<Utc>>,
    },
    #[command(about = "Apply pending warehouse migrations and return structured status output")]
    Migrate {
        #[arg(long, help = "Destination project substituted into warehouse.url")]
        project: Option<String>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    logging::init_from_env();

    let result = match cli.command {
        Command::Run { message } => commands::run::run(&message),
        Command::Export { snapshot, out, snapshot_at } => {
            commands::export::run(&snapshot, out.as_deref(), snapshot_at)
        }
        Command::Migrate { project } => commands::migrate::run(project.as_deref()),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
