use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;

use crate::{
    session::SessionController,
    utils::{percentage::Percentage, time::ElapsedTime},
};

const REPORTED_KEYS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyCount {
    pub key: String,
    pub count: u64,
}

/// What gets shown once a tracked interval ends. `activity` is `None` when scoring was disabled
/// for the interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub elapsed: ElapsedTime,
    pub activity: Option<Percentage>,
    pub keystrokes: u64,
    pub clicks: u64,
    pub movement_score: f64,
    pub top_keys: Vec<KeyCount>,
}

impl SessionReport {
    /// Report for an interval that ran without activity scoring.
    pub fn unscored(elapsed: ElapsedTime) -> Self {
        Self {
            elapsed,
            activity: None,
            keystrokes: 0,
            clicks: 0,
            movement_score: 0.,
            top_keys: vec![],
        }
    }

    /// Builds the report from whatever the controller kept from its last session.
    pub fn from_last_session(elapsed: ElapsedTime, controller: &SessionController) -> Self {
        let Some(breakdown) = controller.last_breakdown() else {
            return Self::unscored(elapsed);
        };
        let top_keys = controller
            .last_key_stats()
            .map(|stats| {
                stats
                    .top_keys(REPORTED_KEYS)
                    .into_iter()
                    .map(|(key, count)| KeyCount {
                        key: key.to_string(),
                        count,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            elapsed,
            activity: Some(breakdown.percentage),
            keystrokes: controller
                .last_key_stats()
                .map_or(0, |stats| stats.total_keystrokes),
            clicks: controller
                .last_mouse_stats()
                .map_or(0, |stats| stats.total_clicks),
            movement_score: breakdown.movement_score,
            top_keys,
        }
    }
}

pub fn render_report(report: &SessionReport) -> String {
    let mut output = String::new();
    // Writing into a String can't fail.
    let _ = writeln!(output, "Tracked\t{}", report.elapsed);
    match report.activity {
        Some(activity) => {
            let _ = writeln!(output, "Activity\t{activity}");
            let _ = writeln!(output, "Keystrokes\t{}", report.keystrokes);
            let _ = writeln!(output, "Clicks\t{}", report.clicks);
            let _ = writeln!(output, "Movement\t{:.2}", report.movement_score);
            if !report.top_keys.is_empty() {
                let keys = report
                    .top_keys
                    .iter()
                    .map(|entry| format!("{} ({})", entry.key, entry.count))
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(output, "Top keys\t{keys}");
            }
        }
        None => {
            let _ = writeln!(output, "Activity\tunavailable");
        }
    }
    output
}

pub fn print_report(report: &SessionReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_report(report));
    }
    Ok(())
}
