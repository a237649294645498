//! Trailing debounce as an explicit control-flow primitive.
//!
//! A [`Debouncer`] owns a worker thread and a control channel. `reset()`
//! restarts the trailing delay; when the delay expires without another
//! reset, the action fires exactly once. `cancel()` discards any armed
//! timer without firing. Making the timer an explicit handle (rather than
//! sleeping inline) keeps coalescing and shutdown behavior directly
//! testable by simulating time with short delays.

use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

/// Control messages for the debounce worker.
enum Signal {
    /// Restart the trailing delay.
    Reset,
    /// Disarm without firing.
    Cancel,
}

/// A trailing-edge debounce timer.
///
/// Dropping the debouncer shuts the worker down; an armed timer does not
/// fire after drop.
pub struct Debouncer {
    /// Control channel to the worker thread.
    tx: mpsc::Sender<Signal>,
    /// Worker thread handle, kept so the thread outlives the struct.
    _worker: thread::JoinHandle<()>,
}

impl Debouncer {
    /// Creates a debouncer that runs `action` on the worker thread every
    /// time the trailing delay expires.
    pub fn new<F>(delay: Duration, action: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || run_worker(&rx, delay, &action));

        Self { tx, _worker: worker }
    }

    /// Arms (or re-arms) the trailing delay.
    pub fn reset(&self) {
        self.tx.send(Signal::Reset).ok();
    }

    /// Disarms the timer; a pending expiry will not fire.
    pub fn cancel(&self) {
        self.tx.send(Signal::Cancel).ok();
    }
}

/// The worker loop: waits for signals, fires the action on expiry.
fn run_worker(rx: &mpsc::Receiver<Signal>, delay: Duration, action: &dyn Fn()) {
    let mut deadline: Option<Instant> = None;

    loop {
        let signal = match deadline {
            // Armed: wait until the deadline, firing on timeout.
            Some(when) => {
                let remaining = when.saturating_duration_since(Instant::now());
                match rx.recv_timeout(remaining) {
                    Ok(signal) => signal,
                    Err(RecvTimeoutError::Timeout) => {
                        deadline = None;
                        action();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
            // Disarmed: block until the next signal.
            None => match rx.recv() {
                Ok(signal) => signal,
                Err(_) => return,
            },
        };

        match signal {
            Signal::Reset => deadline = Some(Instant::now() + delay),
            Signal::Cancel => deadline = None,
        }
    }
}
