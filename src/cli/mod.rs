pub mod output;
pub mod score;
pub mod track;

use anyhow::Result;
use clap::{Parser, Subcommand};
use score::{process_score_command, ScoreCommand};
use tracing::level_filters::LevelFilter;
use track::{process_track_command, TrackCommand};

use crate::utils::{
    dir::create_application_default_path,
    logging::{enable_logging, LOG_PREFIX},
};

#[derive(Parser, Debug)]
#[command(name = "Worktally", version, long_about = None)]
#[command(about = "Scores keyboard and mouse activity over tracked time", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Also print trace level logs to the console")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start the timer and score input activity until it is stopped")]
    Track {
        #[command(flatten)]
        command: TrackCommand,
    },
    #[command(about = "Compute an activity percentage from known counts")]
    Score {
        #[command(flatten)]
        command: ScoreCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let log_dir = create_application_default_path()?.join("logs");
    enable_logging(
        LOG_PREFIX,
        &log_dir,
        args.log.then_some(LevelFilter::TRACE),
        args.log,
    )?;

    match args.commands {
        Commands::Track { command } => process_track_command(command).await,
        Commands::Score { command } => process_score_command(command),
    }
}
