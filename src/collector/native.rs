//! Global keyboard and pointer polling through `device_query`. Each stream gets its own polling
//! thread while tracking, comparing device state between polls to detect new presses, moves and
//! button-down transitions.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use async_trait::async_trait;
use device_query::{DeviceQuery, DeviceState};
use tracing::{debug, error, info};

use super::{
    recorder::{KeyRecorder, MouseRecorder},
    stats::{KeyStats, MouseStats, Position},
    CollectorError, KeyboardTracker, MouseTracker,
};

/// Checks that the global device state can be queried. Fails when there is no display to connect
/// to or the process lacks the input monitoring permission.
fn ensure_device_access() -> Result<(), CollectorError> {
    DeviceState::checked_new().map(|_| ()).ok_or_else(|| {
        CollectorError::Unavailable(
            "can't access global input state, check display and input monitoring permission"
                .into(),
        )
    })
}

/// A polling thread together with the flag that keeps it alive. Every start gets a fresh flag, so
/// a thread that is still winding down can't be revived by a quick restart.
struct Worker {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn spawn(
        name: &str,
        poll: impl FnOnce(Arc<AtomicBool>) + Send + 'static,
    ) -> Result<Self, CollectorError> {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();
        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || poll(thread_running))
            .map_err(|e| CollectorError::Unavailable(format!("can't spawn {name} thread: {e}")))?;
        Ok(Self { running, handle })
    }

    async fn stop(self) {
        let Worker { running, handle } = self;
        running.store(false, Ordering::SeqCst);
        match tokio::task::spawn_blocking(move || handle.join()).await {
            Ok(Ok(())) => debug!("Polling thread finished"),
            Ok(Err(_)) => error!("Polling thread panicked"),
            Err(e) => error!("Failed to wait for polling thread {e:?}"),
        }
    }
}

/// Keys held now that weren't held at the previous poll. A key held across polls counts once.
fn new_presses<'a, K: PartialEq>(last: &'a [K], current: &'a [K]) -> impl Iterator<Item = &'a K> {
    current.iter().filter(move |key| !last.contains(key))
}

/// Indices of buttons that went from released to pressed. Buttons missing from `last` count as
/// released, so a state vector that grew between polls still reports its new presses.
fn button_down_edges(last: &[bool], current: &[bool]) -> Vec<usize> {
    current
        .iter()
        .enumerate()
        .filter(|(button, pressed)| **pressed && !last.get(*button).copied().unwrap_or(false))
        .map(|(button, _)| button)
        .collect()
}

fn poll_keyboard(recorder: KeyRecorder, running: Arc<AtomicBool>, interval: Duration) {
    let Some(device_state) = DeviceState::checked_new() else {
        error!("Lost access to keyboard state");
        return;
    };
    let mut last_keys = device_state.get_keys();
    while running.load(Ordering::SeqCst) {
        let keys = device_state.get_keys();
        for key in new_presses(&last_keys, &keys) {
            recorder.record_key(&format!("{key:?}"));
        }
        last_keys = keys;
        thread::sleep(interval);
    }
}

fn poll_mouse(recorder: MouseRecorder, running: Arc<AtomicBool>, interval: Duration) {
    let Some(device_state) = DeviceState::checked_new() else {
        error!("Lost access to pointer state");
        return;
    };
    let mut last_mouse = device_state.get_mouse();
    while running.load(Ordering::SeqCst) {
        let mouse = device_state.get_mouse();
        let position = Position::from(mouse.coords);

        if mouse.coords != last_mouse.coords {
            recorder.record_move(position);
        }

        for button in button_down_edges(&last_mouse.button_pressed, &mouse.button_pressed) {
            recorder.record_click(&format!("Button{button}"), position);
        }

        last_mouse = mouse;
        thread::sleep(interval);
    }
}

pub struct NativeKeyboardTracker {
    recorder: KeyRecorder,
    poll_interval: Duration,
    worker: Option<Worker>,
}

impl NativeKeyboardTracker {
    pub fn new(recorder: KeyRecorder, poll_interval: Duration) -> Self {
        Self {
            recorder,
            poll_interval,
            worker: None,
        }
    }
}

#[async_trait]
impl KeyboardTracker for NativeKeyboardTracker {
    async fn start_tracking(&mut self) -> Result<(), CollectorError> {
        if self.worker.is_some() {
            return Ok(());
        }
        ensure_device_access()?;

        self.recorder.set_tracking(true);
        let recorder = self.recorder.clone();
        let interval = self.poll_interval;
        match Worker::spawn("worktally-keyboard", move |running| {
            poll_keyboard(recorder, running, interval)
        }) {
            Ok(worker) => self.worker = Some(worker),
            Err(e) => {
                self.recorder.set_tracking(false);
                return Err(e);
            }
        }
        info!("Started keyboard tracking");
        Ok(())
    }

    async fn stop_tracking(&mut self) {
        self.recorder.set_tracking(false);
        if let Some(worker) = self.worker.take() {
            worker.stop().await;
            info!("Stopped keyboard tracking");
        }
    }

    async fn get_stats(&self) -> Result<KeyStats, CollectorError> {
        Ok(self.recorder.snapshot())
    }

    async fn reset_stats(&mut self) {
        self.recorder.clear();
    }
}

pub struct NativeMouseTracker {
    recorder: MouseRecorder,
    poll_interval: Duration,
    worker: Option<Worker>,
}

impl NativeMouseTracker {
    pub fn new(recorder: MouseRecorder, poll_interval: Duration) -> Self {
        Self {
            recorder,
            poll_interval,
            worker: None,
        }
    }
}

#[async_trait]
impl MouseTracker for NativeMouseTracker {
    async fn start_tracking(&mut self) -> Result<(), CollectorError> {
        if self.worker.is_some() {
            return Ok(());
        }
        ensure_device_access()?;

        self.recorder.set_tracking(true);
        let recorder = self.recorder.clone();
        let interval = self.poll_interval;
        match Worker::spawn("worktally-mouse", move |running| {
            poll_mouse(recorder, running, interval)
        }) {
            Ok(worker) => self.worker = Some(worker),
            Err(e) => {
                self.recorder.set_tracking(false);
                return Err(e);
            }
        }
        info!("Started mouse tracking");
        Ok(())
    }

    async fn stop_tracking(&mut self) {
        self.recorder.set_tracking(false);
        if let Some(worker) = self.worker.take() {
            worker.stop().await;
            info!("Stopped mouse tracking");
        }
    }

    async fn get_stats(&self) -> Result<MouseStats, CollectorError> {
        Ok(self.recorder.snapshot())
    }

    async fn reset_stats(&mut self) {
        self.recorder.clear();
    }
}

#[cfg(test)]
mod tests {
    use device_query::Keycode;

    use super::{button_down_edges, new_presses};

    fn presses(last: &[Keycode], current: &[Keycode]) -> Vec<Keycode> {
        new_presses(last, current).copied().collect()
    }

    #[test]
    fn held_key_counts_once() {
        assert_eq!(presses(&[], &[Keycode::A]), vec![Keycode::A]);
        assert!(presses(&[Keycode::A], &[Keycode::A]).is_empty());
        assert_eq!(
            presses(&[Keycode::A], &[Keycode::A, Keycode::LShift]),
            vec![Keycode::LShift]
        );
    }

    #[test]
    fn released_key_counts_again() {
        let polls: [&[Keycode]; 4] = [&[Keycode::A], &[Keycode::A], &[], &[Keycode::A]];
        let counted = polls
            .windows(2)
            .map(|pair| presses(pair[0], pair[1]).len())
            .sum::<usize>();
        assert_eq!(counted, 1);
    }

    #[test]
    fn button_down_transitions_only() {
        assert_eq!(button_down_edges(&[false, false], &[false, true]), vec![1]);
        // Held, released, then pressed again.
        assert!(button_down_edges(&[false, true], &[false, true]).is_empty());
        assert!(button_down_edges(&[false, true], &[false, false]).is_empty());
        assert_eq!(button_down_edges(&[false, false], &[false, true]), vec![1]);
    }

    #[test]
    fn grown_button_vector_reports_new_presses() {
        assert_eq!(
            button_down_edges(&[false, true], &[false, true, false, true]),
            vec![3]
        );
        assert_eq!(button_down_edges(&[], &[true, false, true]), vec![0, 2]);
        assert!(button_down_edges(&[true, true, true], &[true]).is_empty());
    }
}
