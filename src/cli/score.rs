use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use crate::{
    activity::aggregator::{ActivityAggregator, ActivityBreakdown},
    collector::stats::Position,
    config::Config,
    utils::time::ElapsedTime,
};

#[derive(Parser, Debug)]
pub struct ScoreCommand {
    #[arg(short, long, default_value_t = 0, help = "Keystrokes counted in the interval")]
    keystrokes: u64,

    #[arg(short = 'c', long, default_value_t = 0, help = "Mouse clicks counted in the interval")]
    clicks: u64,

    #[arg(short, long, help = "Tracked time as HH:MM:SS")]
    elapsed: ElapsedTime,

    #[arg(
        short,
        long,
        help = "JSON array of sampled pointer positions, e.g. [{\"x\": 0, \"y\": 0}]"
    )]
    positions: Option<PathBuf>,

    #[arg(long, help = "JSON file overriding the default weights")]
    config: Option<PathBuf>,

    #[arg(long, help = "Print the full breakdown as JSON")]
    json: bool,
}

pub fn process_score_command(command: ScoreCommand) -> Result<()> {
    let config = Config::load(command.config.as_deref())?;
    let positions = match &command.positions {
        Some(path) => load_positions(path)?,
        None => vec![],
    };

    let breakdown = score_counts(
        &ActivityAggregator::new(config.scoring),
        command.keystrokes,
        command.clicks,
        &positions,
        command.elapsed,
    );

    if command.json {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
    } else {
        println!("{}", breakdown.percentage);
    }
    Ok(())
}

pub fn score_counts(
    aggregator: &ActivityAggregator,
    keystrokes: u64,
    clicks: u64,
    positions: &[Position],
    elapsed: ElapsedTime,
) -> ActivityBreakdown {
    debug!(
        "Scoring {keystrokes} keystrokes, {clicks} clicks and {} positions over {elapsed}",
        positions.len()
    );
    aggregator.score(keystrokes, clicks, positions, elapsed)
}

pub fn load_positions(path: &Path) -> Result<Vec<Position>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read positions file {path:?}"))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse positions file {path:?}"))
}
