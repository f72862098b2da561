use crate::{collector::stats::Position, config::MovementConfig};

/// Total pointer travel in units of `distance_threshold` pixels, capped at `max_score`. Fewer than
/// two positions means no travel. The result is always finite and within `0..=max_score`.
pub fn movement_score(positions: &[Position], config: &MovementConfig) -> f64 {
    if positions.len() < 2 {
        return 0.;
    }

    let distance: f64 = positions
        .windows(2)
        .map(|pair| pair[0].distance_to(&pair[1]))
        .sum();

    let score = distance / config.distance_threshold;
    if score.is_nan() {
        return 0.;
    }
    score.clamp(0., config.max_score.max(0.))
}
