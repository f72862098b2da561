//! Ties raw collection to the tracked time window. A session collects input from the moment the
//! timer starts until it stops, is scored exactly once on stop and leaves the collectors empty for
//! the next one.

pub mod shutdown;

use tracing::{debug, info, instrument, warn};

use crate::{
    activity::aggregator::{ActivityAggregator, ActivityBreakdown},
    collector::{
        stats::{KeyStats, MouseStats},
        CollectorError, KeyboardTracker, MouseTracker,
    },
    utils::{percentage::Percentage, time::ElapsedTime},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Tracking,
}

/// Owns both input streams and drives them through a session. Every collector call is awaited
/// before the next one is issued, so a late read can never overtake a stop or a reset.
pub struct SessionController {
    keyboard: Box<dyn KeyboardTracker>,
    mouse: Box<dyn MouseTracker>,
    aggregator: ActivityAggregator,
    state: SessionState,
    last_breakdown: Option<ActivityBreakdown>,
    last_key_stats: Option<KeyStats>,
    last_mouse_stats: Option<MouseStats>,
}

impl SessionController {
    pub fn new(
        keyboard: Box<dyn KeyboardTracker>,
        mouse: Box<dyn MouseTracker>,
        aggregator: ActivityAggregator,
    ) -> Self {
        Self {
            keyboard,
            mouse,
            aggregator,
            state: SessionState::Idle,
            last_breakdown: None,
            last_key_stats: None,
            last_mouse_stats: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state == SessionState::Tracking
    }

    /// Starts collecting on both streams with empty statistics. Does nothing while a session is
    /// already running. If either stream can't start, both are stopped and cleared again and the
    /// controller stays idle.
    #[instrument(skip(self))]
    pub async fn start_session(&mut self) -> Result<(), CollectorError> {
        if self.is_tracking() {
            debug!("Session already running");
            return Ok(());
        }

        self.keyboard.reset_stats().await;
        self.mouse.reset_stats().await;

        if let Err(e) = self.keyboard.start_tracking().await {
            warn!("Keyboard collector failed to start {e}");
            self.release_collectors().await;
            return Err(e);
        }
        if let Err(e) = self.mouse.start_tracking().await {
            warn!("Mouse collector failed to start {e}");
            self.release_collectors().await;
            return Err(e);
        }

        self.state = SessionState::Tracking;
        info!("Session started");
        Ok(())
    }

    /// Stops the session using the timer's `HH:MM:SS` reading. Malformed parts of the reading count
    /// as zero. Returns `None` when no session is running.
    pub async fn stop_session(&mut self, elapsed: &str) -> Option<Percentage> {
        self.finish_session(ElapsedTime::parse_lenient(elapsed))
            .await
            .map(|breakdown| breakdown.percentage)
    }

    /// Scores the session, then stops and clears both collectors, in that order. If statistics
    /// can't be read the session still ends and scores zero.
    #[instrument(skip(self))]
    pub async fn finish_session(&mut self, elapsed: ElapsedTime) -> Option<ActivityBreakdown> {
        if !self.is_tracking() {
            debug!("No session to stop");
            return None;
        }

        let key_stats = self
            .keyboard
            .get_stats()
            .await
            .inspect_err(|e| warn!("Failed to read keyboard statistics {e}"))
            .ok();
        let mouse_stats = self
            .mouse
            .get_stats()
            .await
            .inspect_err(|e| warn!("Failed to read mouse statistics {e}"))
            .ok();

        let breakdown = match (&key_stats, &mouse_stats) {
            (Some(key_stats), Some(mouse_stats)) => {
                self.aggregator.breakdown(key_stats, mouse_stats, elapsed)
            }
            _ => self.aggregator.score(0, 0, &[], ElapsedTime::ZERO),
        };

        self.keyboard.stop_tracking().await;
        self.mouse.stop_tracking().await;
        self.keyboard.reset_stats().await;
        self.mouse.reset_stats().await;

        info!("Session finished after {elapsed} with activity {}", breakdown.percentage);
        self.state = SessionState::Idle;
        self.last_breakdown = Some(breakdown);
        self.last_key_stats = key_stats;
        self.last_mouse_stats = mouse_stats;
        Some(breakdown)
    }

    /// Clears everything without scoring, used when the timer goes away without a proper stop.
    #[instrument(skip(self))]
    pub async fn reset_session(&mut self) {
        self.release_collectors().await;
        self.state = SessionState::Idle;
        self.last_breakdown = None;
        self.last_key_stats = None;
        self.last_mouse_stats = None;
        info!("Session reset");
    }

    async fn release_collectors(&mut self) {
        self.keyboard.stop_tracking().await;
        self.mouse.stop_tracking().await;
        self.keyboard.reset_stats().await;
        self.mouse.reset_stats().await;
    }

    pub fn last_activity(&self) -> Option<Percentage> {
        self.last_breakdown.map(|breakdown| breakdown.percentage)
    }

    pub fn last_breakdown(&self) -> Option<&ActivityBreakdown> {
        self.last_breakdown.as_ref()
    }

    pub fn last_key_stats(&self) -> Option<&KeyStats> {
        self.last_key_stats.as_ref()
    }

    pub fn last_mouse_stats(&self) -> Option<&MouseStats> {
        self.last_mouse_stats.as_ref()
    }
}
