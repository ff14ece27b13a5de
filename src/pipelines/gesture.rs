// SPDX-License-Identifier: GPL-3.0-only

//! Tap vs. press-and-hold classification for the shutter button
//!
//! Each press produces exactly one [`Gesture`], unless it is cancelled before
//! the long-press timer fires. The long press is delivered while the button
//! is still held, so recording can start without waiting for the release.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Outcome of one press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Released before the threshold
    Click,
    /// Held past the threshold
    LongPress,
}

/// Where the current press is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PressState {
    #[default]
    Idle,
    /// Timer armed, not yet fired
    Pending,
    /// Timer fired and `LongPress` was emitted
    Fired,
}

#[derive(Debug, Default)]
struct Shared {
    state: PressState,
    /// Incremented on every arm and disarm; a timer only fires for its own generation
    generation: u64,
}

/// Classifies presses from one pointer surface
pub struct GestureRecognizer {
    threshold: Duration,
    shared: Arc<Mutex<Shared>>,
    timer: Option<JoinHandle<()>>,
    gestures: mpsc::UnboundedSender<Gesture>,
}

impl GestureRecognizer {
    /// Create a recognizer and the receiver its gestures are delivered on
    pub fn new(threshold: Duration) -> (Self, mpsc::UnboundedReceiver<Gesture>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let recognizer = Self {
            threshold,
            shared: Arc::new(Mutex::new(Shared::default())),
            timer: None,
            gestures: tx,
        };
        (recognizer, rx)
    }

    /// Pointer/touch down: arm the long-press timer
    ///
    /// A timer still pending from an earlier press is cancelled first.
    pub fn press_start(&mut self) {
        self.disarm();

        let generation = {
            let Ok(mut shared) = self.shared.lock() else {
                return;
            };
            shared.generation += 1;
            shared.state = PressState::Pending;
            shared.generation
        };

        let shared = Arc::clone(&self.shared);
        let gestures = self.gestures.clone();
        let threshold = self.threshold;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(threshold).await;
            let Ok(mut shared) = shared.lock() else {
                return;
            };
            if shared.generation != generation || shared.state != PressState::Pending {
                trace!(generation, "Stale long-press timer ignored");
                return;
            }
            shared.state = PressState::Fired;
            debug!(threshold_ms = threshold.as_millis() as u64, "Long press");
            // Receiver gone means nobody is listening any more
            let _ = gestures.send(Gesture::LongPress);
        }));
        trace!(generation, "Long-press timer armed");
    }

    /// Pointer/touch up
    ///
    /// # Returns
    /// * `true` - This release ended a long press; stop what it started
    /// * `false` - A click was emitted, or no press was active
    pub fn press_end(&mut self) -> bool {
        let previous = match self.shared.lock() {
            Ok(mut shared) => {
                let previous = shared.state;
                shared.state = PressState::Idle;
                shared.generation += 1;
                previous
            }
            Err(_) => PressState::Idle,
        };
        self.abort_timer();

        match previous {
            PressState::Pending => {
                debug!("Click");
                let _ = self.gestures.send(Gesture::Click);
                false
            }
            PressState::Fired => true,
            PressState::Idle => false,
        }
    }

    /// Pointer cancelled (left the surface, lost capture): emit nothing
    pub fn cancel(&mut self) {
        self.disarm();
    }

    /// Whether the long press has fired for the current press
    pub fn is_long_press(&self) -> bool {
        self.shared
            .lock()
            .map(|shared| shared.state == PressState::Fired)
            .unwrap_or(false)
    }

    fn disarm(&mut self) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.state = PressState::Idle;
            shared.generation += 1;
        }
        self.abort_timer();
    }

    fn abort_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for GestureRecognizer {
    fn drop(&mut self) {
        self.abort_timer();
    }
}
