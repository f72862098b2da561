use serde::Serialize;

use crate::{
    collector::stats::{KeyStats, MouseStats, Position},
    config::ScoringConfig,
    utils::{percentage::Percentage, time::ElapsedTime},
};

use super::movement::movement_score;

/// Component scores behind a single activity percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActivityBreakdown {
    pub keyboard_score: f64,
    pub click_score: f64,
    pub movement_score: f64,
    /// Weighted sum of the three components.
    pub total_score: f64,
    pub percentage: Percentage,
}

/// Turns one session of raw statistics into an activity percentage. Holds no state besides its
/// configuration, so the same inputs always give the same result.
#[derive(Debug, Clone, Default)]
pub struct ActivityAggregator {
    config: ScoringConfig,
}

impl ActivityAggregator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn compute(
        &self,
        key_stats: &KeyStats,
        mouse_stats: &MouseStats,
        elapsed: ElapsedTime,
    ) -> Percentage {
        self.breakdown(key_stats, mouse_stats, elapsed).percentage
    }

    pub fn breakdown(
        &self,
        key_stats: &KeyStats,
        mouse_stats: &MouseStats,
        elapsed: ElapsedTime,
    ) -> ActivityBreakdown {
        self.score(
            key_stats.total_keystrokes,
            mouse_stats.total_clicks,
            &mouse_stats.mouse_positions,
            elapsed,
        )
    }

    /// Scores plain counters. `rawPercentage = total / (seconds * baseline) * 100`, clamped to
    /// `0..=100`. No elapsed time or no activity at all score 0.
    pub fn score(
        &self,
        keystrokes: u64,
        clicks: u64,
        positions: &[Position],
        elapsed: ElapsedTime,
    ) -> ActivityBreakdown {
        let config = &self.config;
        let keyboard_score = keystrokes as f64;
        let click_score = clicks as f64;
        let movement_score = movement_score(positions, &config.movement);

        let total_score = keyboard_score * config.keystroke_weight
            + click_score * config.click_weight
            + movement_score * config.movement_weight;

        let percentage = if elapsed.is_zero() || !(total_score > 0.) {
            Percentage::ZERO
        } else {
            let expected = elapsed.as_secs() as f64 * config.baseline_units_per_second;
            Percentage::from_f64_clamped(total_score / expected * 100.)
        };

        ActivityBreakdown {
            keyboard_score,
            click_score,
            movement_score,
            total_score,
            percentage,
        }
    }
}

/// Scores a session with the default weights.
pub fn compute_activity_percentage(
    key_stats: &KeyStats,
    mouse_stats: &MouseStats,
    elapsed: ElapsedTime,
) -> Percentage {
    ActivityAggregator::default().compute(key_stats, mouse_stats, elapsed)
}
