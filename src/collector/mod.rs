//! Raw input collection. Keyboard and mouse are independent streams, each behind its own trait so
//! sessions can be driven by real OS hooks, by [recorder] fakes in tests, or by nothing at all when
//! no backend is compiled in.

#[cfg(feature = "native")]
pub mod native;
pub mod recorder;
pub mod stats;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{config::CollectorConfig, utils::clock::Clock};

use self::stats::{KeyStats, MouseStats};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollectorError {
    /// Global input hooks can't be installed, e.g. missing permission or no display.
    #[error("input collector is unavailable: {0}")]
    Unavailable(String),
}

/// Contract for the keyboard stream.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyboardTracker: Send + Sync {
    /// Starts accumulating keystrokes. Calling it while already tracking keeps the counters.
    async fn start_tracking(&mut self) -> Result<(), CollectorError>;

    /// Stops accumulating. Counters keep their values until [KeyboardTracker::reset_stats].
    async fn stop_tracking(&mut self);

    async fn get_stats(&self) -> Result<KeyStats, CollectorError>;

    async fn reset_stats(&mut self);
}

/// Contract for the pointer stream. Same semantics as [KeyboardTracker].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MouseTracker: Send + Sync {
    async fn start_tracking(&mut self) -> Result<(), CollectorError>;

    async fn stop_tracking(&mut self);

    async fn get_stats(&self) -> Result<MouseStats, CollectorError>;

    async fn reset_stats(&mut self);
}

/// Creates trackers for the current platform. Without a compiled in backend the returned trackers
/// refuse to start, which leaves scoring disabled while the rest of the flow keeps working.
pub fn platform_trackers(
    config: &CollectorConfig,
    clock: Arc<dyn Clock>,
) -> (Box<dyn KeyboardTracker>, Box<dyn MouseTracker>) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "native")] {
            use native::{NativeKeyboardTracker, NativeMouseTracker};
            use recorder::{KeyRecorder, MouseRecorder};

            (
                Box::new(NativeKeyboardTracker::new(
                    KeyRecorder::new(clock.clone()),
                    config.poll_interval(),
                )),
                Box::new(NativeMouseTracker::new(
                    MouseRecorder::new(config.max_positions, clock),
                    config.poll_interval(),
                )),
            )
        } else {
            let _ = (config, clock);
            (Box::new(Unsupported), Box::new(Unsupported))
        }
    }
}

/// Stand-in for platforms without an input backend.
#[cfg(not(feature = "native"))]
struct Unsupported;

#[cfg(not(feature = "native"))]
const UNSUPPORTED: &str = "this build has no input backend, rebuild with the `native` feature";

#[cfg(not(feature = "native"))]
#[async_trait]
impl KeyboardTracker for Unsupported {
    async fn start_tracking(&mut self) -> Result<(), CollectorError> {
        Err(CollectorError::Unavailable(UNSUPPORTED.into()))
    }

    async fn stop_tracking(&mut self) {}

    async fn get_stats(&self) -> Result<KeyStats, CollectorError> {
        Err(CollectorError::Unavailable(UNSUPPORTED.into()))
    }

    async fn reset_stats(&mut self) {}
}

#[cfg(not(feature = "native"))]
#[async_trait]
impl MouseTracker for Unsupported {
    async fn start_tracking(&mut self) -> Result<(), CollectorError> {
        Err(CollectorError::Unavailable(UNSUPPORTED.into()))
    }

    async fn stop_tracking(&mut self) {}

    async fn get_stats(&self) -> Result<MouseStats, CollectorError> {
        Err(CollectorError::Unavailable(UNSUPPORTED.into()))
    }

    async fn reset_stats(&mut self) {}
}
