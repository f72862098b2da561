//! Coarse activity estimate from input the application window itself receives. It is independent
//! from the session scorer: it sees a different event source and resets whenever its tracking flag
//! turns off rather than on an explicit stop.

use std::time::Duration;

use anyhow::Result;
use tokio::{
    sync::{mpsc, watch},
    time::{interval_at, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{config::PassiveConfig, utils::clock::Clock, utils::percentage::Percentage};

/// Input observed by the focused application window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InWindowEvent {
    KeyPress,
    MouseMove,
}

#[derive(Debug)]
pub struct PassiveActivityMonitor {
    scale: f64,
    key_presses: u64,
    mouse_moves: u64,
    started_at: Option<Instant>,
    activity: Percentage,
}

impl PassiveActivityMonitor {
    pub fn new(config: &PassiveConfig) -> Self {
        Self {
            scale: config.scale,
            key_presses: 0,
            mouse_moves: 0,
            started_at: None,
            activity: Percentage::ZERO,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.started_at.is_some()
    }

    /// Turning tracking on starts the clock if it isn't running yet, turning it off drops all
    /// counts and the last reported percentage.
    pub fn set_tracking(&mut self, tracking: bool, now: Instant) {
        if tracking {
            self.started_at.get_or_insert(now);
        } else {
            self.reset();
        }
    }

    pub fn record(&mut self, event: InWindowEvent) {
        if !self.is_tracking() {
            return;
        }
        match event {
            InWindowEvent::KeyPress => self.key_presses = self.key_presses.saturating_add(1),
            InWindowEvent::MouseMove => self.mouse_moves = self.mouse_moves.saturating_add(1),
        }
    }

    /// Recomputes `min(round(interactions / elapsed_seconds * scale), 100)`. Without elapsed time
    /// the previous value is kept.
    pub fn sample(&mut self, now: Instant) -> Percentage {
        let Some(started_at) = self.started_at else {
            return self.activity;
        };
        let elapsed = now.saturating_duration_since(started_at).as_secs_f64();
        if elapsed > 0. {
            let interactions = self.key_presses.saturating_add(self.mouse_moves) as f64;
            self.activity = Percentage::from_f64_clamped(interactions / elapsed * self.scale);
        }
        self.activity
    }

    pub fn reset(&mut self) {
        self.key_presses = 0;
        self.mouse_moves = 0;
        self.started_at = None;
        self.activity = Percentage::ZERO;
    }

    pub fn key_presses(&self) -> u64 {
        self.key_presses
    }

    pub fn mouse_moves(&self) -> u64 {
        self.mouse_moves
    }

    pub fn activity(&self) -> Percentage {
        self.activity
    }
}

/// Drives a [PassiveActivityMonitor]: feeds it window events, follows the timer's running flag and
/// publishes a fresh percentage every sample interval while the timer runs.
pub struct PassiveMonitorModule {
    monitor: PassiveActivityMonitor,
    events: mpsc::Receiver<InWindowEvent>,
    timer_running: watch::Receiver<bool>,
    output: watch::Sender<Percentage>,
    shutdown: CancellationToken,
    sample_interval: Duration,
    time_provider: Box<dyn Clock>,
}

impl PassiveMonitorModule {
    pub fn new(
        config: &PassiveConfig,
        events: mpsc::Receiver<InWindowEvent>,
        timer_running: watch::Receiver<bool>,
        output: watch::Sender<Percentage>,
        shutdown: CancellationToken,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            monitor: PassiveActivityMonitor::new(config),
            events,
            timer_running,
            output,
            shutdown,
            sample_interval: config.sample_interval(),
            time_provider,
        }
    }

    /// Runs until shutdown or until either input channel closes.
    pub async fn run(mut self) -> Result<()> {
        let start = self.time_provider.instant();
        let mut ticker = interval_at(start + self.sample_interval, self.sample_interval);
        let running = *self.timer_running.borrow_and_update();
        self.monitor.set_tracking(running, start);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                changed = self.timer_running.changed() => {
                    if changed.is_err() {
                        info!("Timer flag closed, stopping passive monitor");
                        return Ok(())
                    }
                    let running = *self.timer_running.borrow_and_update();
                    self.monitor.set_tracking(running, self.time_provider.instant());
                    if !running {
                        self.output.send_replace(Percentage::ZERO);
                    }
                }
                event = self.events.recv() => {
                    match event {
                        Some(event) => self.monitor.record(event),
                        None => {
                            info!("Window events closed, stopping passive monitor");
                            return Ok(())
                        }
                    }
                }
                _ = ticker.tick() => {
                    if self.monitor.is_tracking() {
                        let activity = self.monitor.sample(self.time_provider.instant());
                        debug!("Passive activity {activity}");
                        self.output.send_replace(activity);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use tokio::{
        sync::{mpsc, watch},
        time::Instant,
    };
    use tokio_util::sync::CancellationToken;

    use crate::{
        config::PassiveConfig,
        utils::{clock::test_clock::TestClock, logging::TEST_LOGGING, percentage::Percentage},
    };

    use super::{InWindowEvent, PassiveActivityMonitor, PassiveMonitorModule};

    fn record(monitor: &mut PassiveActivityMonitor, keys: u32, moves: u32) {
        for _ in 0..keys {
            monitor.record(InWindowEvent::KeyPress);
        }
        for _ in 0..moves {
            monitor.record(InWindowEvent::MouseMove);
        }
    }

    #[test]
    fn interactions_per_second_are_scaled() {
        let mut monitor = PassiveActivityMonitor::new(&PassiveConfig::default());
        let start = Instant::now();
        monitor.set_tracking(true, start);
        record(&mut monitor, 4, 6);

        // 10 interactions over 5 seconds at 10 points each.
        assert_eq!(*monitor.sample(start + Duration::from_secs(5)), 20);
        // 10 over 30 seconds is 3.33, rounded down.
        assert_eq!(*monitor.sample(start + Duration::from_secs(30)), 3);
    }

    #[test]
    fn capped_at_hundred() {
        let mut monitor = PassiveActivityMonitor::new(&PassiveConfig::default());
        let start = Instant::now();
        monitor.set_tracking(true, start);
        record(&mut monitor, 300, 300);
        assert_eq!(monitor.sample(start + Duration::from_secs(5)), Percentage::FULL);
    }

    #[test]
    fn zero_elapsed_keeps_previous_value() {
        let mut monitor = PassiveActivityMonitor::new(&PassiveConfig::default());
        let start = Instant::now();
        monitor.set_tracking(true, start);
        record(&mut monitor, 10, 0);
        assert_eq!(monitor.sample(start), Percentage::ZERO);
    }

    #[test]
    fn events_are_ignored_while_off() {
        let mut monitor = PassiveActivityMonitor::new(&PassiveConfig::default());
        record(&mut monitor, 5, 5);
        assert_eq!(monitor.key_presses(), 0);
        assert_eq!(monitor.mouse_moves(), 0);
        assert_eq!(monitor.sample(Instant::now()), Percentage::ZERO);
    }

    #[test]
    fn turning_off_resets() {
        let mut monitor = PassiveActivityMonitor::new(&PassiveConfig::default());
        let start = Instant::now();
        monitor.set_tracking(true, start);
        record(&mut monitor, 20, 5);
        assert_eq!(*monitor.sample(start + Duration::from_secs(5)), 50);

        monitor.set_tracking(false, start + Duration::from_secs(6));
        assert!(!monitor.is_tracking());
        assert_eq!(monitor.key_presses(), 0);
        assert_eq!(monitor.mouse_moves(), 0);
        assert_eq!(monitor.activity(), Percentage::ZERO);

        // The clock restarts from the new start.
        let restart = start + Duration::from_secs(100);
        monitor.set_tracking(true, restart);
        record(&mut monitor, 1, 0);
        assert_eq!(*monitor.sample(restart + Duration::from_secs(5)), 2);
    }

    #[test]
    fn turning_on_twice_keeps_start() {
        let mut monitor = PassiveActivityMonitor::new(&PassiveConfig::default());
        let start = Instant::now();
        monitor.set_tracking(true, start);
        monitor.set_tracking(true, start + Duration::from_secs(50));
        record(&mut monitor, 10, 0);
        assert_eq!(*monitor.sample(start + Duration::from_secs(10)), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn module_publishes_samples_and_resets() -> Result<()> {
        *TEST_LOGGING;
        let (event_sender, event_receiver) = mpsc::channel(64);
        let (timer_sender, timer_receiver) = watch::channel(true);
        let (output_sender, mut output_receiver) = watch::channel(Percentage::ZERO);
        let shutdown = CancellationToken::new();

        for _ in 0..10 {
            event_sender.send(InWindowEvent::KeyPress).await?;
        }
        for _ in 0..15 {
            event_sender.send(InWindowEvent::MouseMove).await?;
        }

        let module = PassiveMonitorModule::new(
            &PassiveConfig::default(),
            event_receiver,
            timer_receiver,
            output_sender,
            shutdown.clone(),
            Box::new(TestClock::new()),
        );
        let task = tokio::spawn(module.run());

        // First sample lands after five seconds: 25 interactions / 5s * 10.
        output_receiver.changed().await?;
        assert_eq!(*output_receiver.borrow_and_update(), Percentage::new_opt(50).unwrap());

        timer_sender.send(false)?;
        output_receiver.changed().await?;
        assert_eq!(*output_receiver.borrow_and_update(), Percentage::ZERO);

        // No samples are published while the timer is off.
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!output_receiver.has_changed()?);

        shutdown.cancel();
        task.await??;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn zero_sample_interval_samples_every_second() -> Result<()> {
        let config = PassiveConfig {
            sample_interval_secs: 0,
            ..PassiveConfig::default()
        };
        let (event_sender, event_receiver) = mpsc::channel(8);
        let (_timer_sender, timer_receiver) = watch::channel(true);
        let (output_sender, mut output_receiver) = watch::channel(Percentage::ZERO);
        let shutdown = CancellationToken::new();

        event_sender.send(InWindowEvent::KeyPress).await?;
        event_sender.send(InWindowEvent::MouseMove).await?;

        let module = PassiveMonitorModule::new(
            &config,
            event_receiver,
            timer_receiver,
            output_sender,
            shutdown.clone(),
            Box::new(TestClock::new()),
        );
        let task = tokio::spawn(module.run());

        // 2 interactions in the first second.
        output_receiver.changed().await?;
        assert_eq!(*output_receiver.borrow_and_update(), Percentage::new_opt(20).unwrap());

        shutdown.cancel();
        task.await??;
        Ok(())
    }
}
