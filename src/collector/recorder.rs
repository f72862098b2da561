//! In-memory accumulation of raw input statistics. Backends push events into a recorder from
//! whatever thread they observe input on; sessions read snapshots out of it. Recorders also
//! implement the tracker traits themselves, which makes them the fake collector for tests and
//! scripted input.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::utils::clock::Clock;

use super::{
    stats::{KeyStats, MouseStats, Position},
    CollectorError, KeyboardTracker, MouseTracker,
};

/// Keystroke counters shared between an input source and a session.
#[derive(Clone)]
pub struct KeyRecorder {
    stats: Arc<RwLock<KeyStats>>,
    tracking: Arc<AtomicBool>,
    clock: Arc<dyn Clock>,
}

impl KeyRecorder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            stats: Arc::new(RwLock::new(KeyStats::empty(clock.time()))),
            tracking: Arc::new(AtomicBool::new(false)),
            clock,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.load(Ordering::SeqCst)
    }

    /// Returns the previous value.
    pub fn set_tracking(&self, tracking: bool) -> bool {
        self.tracking.swap(tracking, Ordering::SeqCst)
    }

    /// Counts a key press. Ignored while not tracking.
    pub fn record_key(&self, key: &str) {
        if !self.is_tracking() {
            return;
        }
        let now = self.clock.time();
        let mut stats = self.stats.write();
        stats.total_keystrokes = stats.total_keystrokes.saturating_add(1);
        stats.last_keystroke_time = now;
        let count = stats.key_frequencies.entry(key.to_string()).or_insert(0);
        *count = count.saturating_add(1);
    }

    pub fn snapshot(&self) -> KeyStats {
        self.stats.read().clone()
    }

    pub fn clear(&self) {
        *self.stats.write() = KeyStats::empty(self.clock.time());
    }
}

#[async_trait]
impl KeyboardTracker for KeyRecorder {
    async fn start_tracking(&mut self) -> Result<(), CollectorError> {
        self.set_tracking(true);
        Ok(())
    }

    async fn stop_tracking(&mut self) {
        self.set_tracking(false);
    }

    async fn get_stats(&self) -> Result<KeyStats, CollectorError> {
        Ok(self.snapshot())
    }

    async fn reset_stats(&mut self) {
        self.clear();
    }
}

/// Pointer state while recording. Position history lives in ring buffers so long sessions keep
/// a bounded amount of memory; counters are never truncated.
struct PointerLog {
    total_clicks: u64,
    mouse_positions: VecDeque<Position>,
    click_positions: VecDeque<Position>,
    button_frequencies: HashMap<String, u64>,
    last_click_time: DateTime<Utc>,
    last_move_time: DateTime<Utc>,
}

impl PointerLog {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            total_clicks: 0,
            mouse_positions: VecDeque::new(),
            click_positions: VecDeque::new(),
            button_frequencies: HashMap::new(),
            last_click_time: now,
            last_move_time: now,
        }
    }

    fn snapshot(&self) -> MouseStats {
        MouseStats {
            total_clicks: self.total_clicks,
            mouse_positions: self.mouse_positions.iter().copied().collect(),
            click_positions: self.click_positions.iter().copied().collect(),
            button_frequencies: self.button_frequencies.clone(),
            last_click_time: self.last_click_time,
            last_move_time: self.last_move_time,
        }
    }
}

fn push_bounded(queue: &mut VecDeque<Position>, position: Position, capacity: usize) {
    if capacity == 0 {
        return;
    }
    while queue.len() >= capacity {
        queue.pop_front();
    }
    queue.push_back(position);
}

/// Pointer counters shared between an input source and a session.
#[derive(Clone)]
pub struct MouseRecorder {
    log: Arc<RwLock<PointerLog>>,
    tracking: Arc<AtomicBool>,
    max_positions: usize,
    clock: Arc<dyn Clock>,
}

impl MouseRecorder {
    pub fn new(max_positions: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            log: Arc::new(RwLock::new(PointerLog::new(clock.time()))),
            tracking: Arc::new(AtomicBool::new(false)),
            max_positions,
            clock,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.load(Ordering::SeqCst)
    }

    /// Returns the previous value.
    pub fn set_tracking(&self, tracking: bool) -> bool {
        self.tracking.swap(tracking, Ordering::SeqCst)
    }

    pub fn record_move(&self, position: Position) {
        if !self.is_tracking() {
            return;
        }
        let now = self.clock.time();
        let mut log = self.log.write();
        push_bounded(&mut log.mouse_positions, position, self.max_positions);
        log.last_move_time = now;
    }

    pub fn record_click(&self, button: &str, position: Position) {
        if !self.is_tracking() {
            return;
        }
        let now = self.clock.time();
        let mut log = self.log.write();
        log.total_clicks = log.total_clicks.saturating_add(1);
        push_bounded(&mut log.click_positions, position, self.max_positions);
        let count = log.button_frequencies.entry(button.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        log.last_click_time = now;
    }

    pub fn snapshot(&self) -> MouseStats {
        self.log.read().snapshot()
    }

    pub fn clear(&self) {
        *self.log.write() = PointerLog::new(self.clock.time());
    }
}

#[async_trait]
impl MouseTracker for MouseRecorder {
    async fn start_tracking(&mut self) -> Result<(), CollectorError> {
        self.set_tracking(true);
        Ok(())
    }

    async fn stop_tracking(&mut self) {
        self.set_tracking(false);
    }

    async fn get_stats(&self) -> Result<MouseStats, CollectorError> {
        Ok(self.snapshot())
    }

    async fn reset_stats(&mut self) {
        self.clear();
    }
}
