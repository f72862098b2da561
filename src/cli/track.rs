use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    activity::aggregator::ActivityAggregator,
    collector::platform_trackers,
    config::Config,
    session::{shutdown::detect_shutdown, SessionController},
    utils::{
        clock::{Clock, DefaultClock},
        time::ElapsedTime,
    },
};

use super::output::{print_report, SessionReport};

#[derive(Parser, Debug)]
pub struct TrackCommand {
    #[arg(
        short,
        long,
        help = "Stop on its own after HH:MM:SS. Without it tracking runs until Ctrl-C"
    )]
    duration: Option<ElapsedTime>,

    #[arg(long, help = "Print the report as JSON")]
    json: bool,

    #[arg(short, long, help = "JSON file overriding the default weights and intervals")]
    config: Option<PathBuf>,
}

pub async fn process_track_command(command: TrackCommand) -> Result<()> {
    let config = Config::load(command.config.as_deref())?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let (keyboard, mouse) = platform_trackers(&config.collector, clock.clone());
    let mut controller =
        SessionController::new(keyboard, mouse, ActivityAggregator::new(config.scoring));

    let shutdown = CancellationToken::new();
    let detector = tokio::spawn(detect_shutdown(shutdown.clone()));

    let report = run_tracked_interval(
        &mut controller,
        clock.as_ref(),
        command.duration,
        shutdown.clone(),
    )
    .await;

    shutdown.cancel();
    detector.await?;

    print_report(&report, command.json)
}

/// Runs one tracked interval: starts the session, waits for `shutdown` or `limit`, then scores it.
/// The timer keeps running when the collectors can't start, the report just carries no activity.
pub async fn run_tracked_interval(
    controller: &mut SessionController,
    clock: &dyn Clock,
    limit: Option<ElapsedTime>,
    shutdown: CancellationToken,
) -> SessionReport {
    let scoring = match controller.start_session().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Activity scoring disabled for this interval: {e}");
            false
        }
    };

    let started = clock.instant();
    info!("Timer started");

    match limit {
        Some(limit) => tokio::select! {
            _ = shutdown.cancelled() => (),
            _ = clock.sleep(limit.into()) => info!("Reached tracking limit of {limit}"),
        },
        None => shutdown.cancelled().await,
    }

    let elapsed = ElapsedTime::from(clock.instant().duration_since(started));
    info!("Timer stopped at {elapsed}");

    if !scoring {
        return SessionReport::unscored(elapsed);
    }
    controller.finish_session(elapsed).await;
    SessionReport::from_last_session(elapsed, controller)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio_util::sync::CancellationToken;

    use crate::{
        activity::aggregator::ActivityAggregator,
        collector::{
            recorder::{KeyRecorder, MouseRecorder},
            stats::Position,
            CollectorError, MockKeyboardTracker, MockMouseTracker,
        },
        session::{SessionController, SessionState},
        utils::{
            clock::test_clock::TestClock, logging::TEST_LOGGING, percentage::Percentage,
            time::ElapsedTime,
        },
    };

    use super::run_tracked_interval;

    fn recorder_controller(
        clock: Arc<TestClock>,
    ) -> (SessionController, KeyRecorder, MouseRecorder) {
        let keys = KeyRecorder::new(clock.clone());
        let mouse = MouseRecorder::new(1000, clock);
        let controller = SessionController::new(
            Box::new(keys.clone()),
            Box::new(mouse.clone()),
            ActivityAggregator::default(),
        );
        (controller, keys, mouse)
    }

    #[tokio::test(start_paused = true)]
    async fn interval_limited_by_duration() {
        *TEST_LOGGING;
        let clock = Arc::new(TestClock::new());
        let (mut controller, keys, mouse) = recorder_controller(clock.clone());

        let typing = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            for key in ["KeyH", "KeyE", "KeyL", "KeyL", "KeyO"] {
                keys.record_key(key);
            }
            mouse.record_click("Button1", Position::new(10, 10));
            tokio::time::sleep(Duration::from_secs(3)).await;
            for key in ["Space", "KeyW", "KeyO", "KeyR", "KeyL"] {
                keys.record_key(key);
            }
            mouse.record_click("Button1", Position::new(10, 10));
        };

        let (report, ()) = tokio::join!(
            run_tracked_interval(
                &mut controller,
                clock.as_ref(),
                Some(ElapsedTime::from_secs(10)),
                CancellationToken::new(),
            ),
            typing
        );

        assert_eq!(report.elapsed, ElapsedTime::from_secs(10));
        assert_eq!(report.activity, Percentage::new_opt(37));
        assert_eq!(report.keystrokes, 10);
        assert_eq!(report.clicks, 2);
        assert_eq!(report.top_keys[0].key, "KeyL");
        assert_eq!(report.top_keys[0].count, 3);
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(!keys.is_tracking());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ended_by_shutdown() {
        let clock = Arc::new(TestClock::new());
        let (mut controller, keys, _) = recorder_controller(clock.clone());
        let shutdown = CancellationToken::new();

        let typing = async {
            for _ in 0..12 {
                tokio::time::sleep(Duration::from_millis(250)).await;
                keys.record_key("KeyA");
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
            shutdown.cancel();
        };

        let (report, ()) = tokio::join!(
            run_tracked_interval(&mut controller, clock.as_ref(), None, shutdown.clone()),
            typing
        );

        assert_eq!(report.elapsed, ElapsedTime::from_secs(4));
        assert_eq!(report.activity, Some(Percentage::FULL));
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_collectors_keep_timer_running() {
        let clock = TestClock::new();
        let mut keyboard = MockKeyboardTracker::new();
        let mut mouse = MockMouseTracker::new();

        keyboard
            .expect_start_tracking()
            .returning(|| Err(CollectorError::Unavailable("no backend".into())));
        keyboard.expect_stop_tracking().returning(|| ());
        keyboard.expect_reset_stats().returning(|| ());
        mouse.expect_start_tracking().never();
        mouse.expect_stop_tracking().returning(|| ());
        mouse.expect_reset_stats().returning(|| ());
        keyboard.expect_get_stats().never();
        mouse.expect_get_stats().never();

        let mut controller = SessionController::new(
            Box::new(keyboard),
            Box::new(mouse),
            ActivityAggregator::default(),
        );
        let report = run_tracked_interval(
            &mut controller,
            &clock,
            Some(ElapsedTime::from_secs(90)),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(report.elapsed, ElapsedTime::from_secs(90));
        assert_eq!(report.activity, None);
        assert_eq!(controller.state(), SessionState::Idle);
    }
}
