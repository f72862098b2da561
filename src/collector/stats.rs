use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pointer location in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance. Computed in floating point, so extreme coordinates can't overflow.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x as f64 - self.x as f64;
        let dy = other.y as f64 - self.y as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Snapshot of keyboard activity for the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStats {
    pub total_keystrokes: u64,
    pub key_frequencies: HashMap<String, u64>,
    pub start_time: DateTime<Utc>,
    pub last_keystroke_time: DateTime<Utc>,
}

impl KeyStats {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            total_keystrokes: 0,
            key_frequencies: HashMap::new(),
            start_time: now,
            last_keystroke_time: now,
        }
    }

    /// Most pressed keys, ties broken by name so the output is stable.
    pub fn top_keys(&self, limit: usize) -> Vec<(&str, u64)> {
        let mut keys = self
            .key_frequencies
            .iter()
            .map(|(key, count)| (key.as_str(), *count))
            .collect::<Vec<_>>();
        keys.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        keys.truncate(limit);
        keys
    }
}

/// Snapshot of pointer activity for the current session. Position sequences are ordered from
/// oldest to newest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseStats {
    pub total_clicks: u64,
    pub mouse_positions: Vec<Position>,
    pub click_positions: Vec<Position>,
    pub button_frequencies: HashMap<String, u64>,
    pub last_click_time: DateTime<Utc>,
    pub last_move_time: DateTime<Utc>,
}

impl MouseStats {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            total_clicks: 0,
            mouse_positions: Vec::new(),
            click_positions: Vec::new(),
            button_frequencies: HashMap::new(),
            last_click_time: now,
            last_move_time: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{KeyStats, Position};

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(Position::new(0, 0).distance_to(&Position::new(3, 4)), 5.0);
        assert_eq!(Position::new(-3, -4).distance_to(&Position::new(0, 0)), 5.0);
        let far = Position::new(i32::MIN, 0).distance_to(&Position::new(i32::MAX, 0));
        assert_eq!(far, u32::MAX as f64);
    }

    #[test]
    fn top_keys_are_sorted() {
        let mut stats = KeyStats::empty(Utc::now());
        stats.key_frequencies.insert("KeyA".into(), 3);
        stats.key_frequencies.insert("KeyC".into(), 7);
        stats.key_frequencies.insert("KeyB".into(), 3);
        stats.key_frequencies.insert("Space".into(), 1);

        assert_eq!(
            stats.top_keys(3),
            vec![("KeyC", 7), ("KeyA", 3), ("KeyB", 3)]
        );
        assert_eq!(stats.top_keys(10).len(), 4);
    }
}
