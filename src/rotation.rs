//! Rotating "current key" service.
//!
//! Serves a single process-wide key that is replaced on a fixed schedule.
//! The key is owned state of one `RotatingKey` instance; the rotation task
//! is the only writer and `current_key()` is a plain read.

use crate::clock::{Clock, SystemClock};
use crate::keys::generator::KeyScheme;
use crate::notify::{KeyEvent, Notifier};
use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Default rotation interval (12 hours).
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone)]
struct RotationState {
    key: String,
    generated_at: DateTime<Utc>,
}

/// Owner of the current rotating key.
pub struct RotatingKey {
    state: RwLock<RotationState>,
    scheme: KeyScheme,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl RotatingKey {
    /// Mint the first key and announce it.
    pub fn new(scheme: KeyScheme, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_clock(scheme, notifier, Arc::new(SystemClock))
    }

    /// Create a rotating key with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_clock(
        scheme: KeyScheme,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_clock(scheme, notifier, clock)
    }

    fn with_clock(scheme: KeyScheme, notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>) -> Self {
        let state = RotationState {
            key: scheme.generate(),
            generated_at: clock.now_utc(),
        };
        let this = Self {
            state: RwLock::new(state.clone()),
            scheme,
            notifier,
            clock,
        };
        this.announce(&state);
        this
    }

    /// The key currently being served.
    pub fn current_key(&self) -> String {
        self.read().key
    }

    /// When the current key was minted.
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.read().generated_at
    }

    /// Replace the current key with a fresh one, announce it, and return it.
    pub fn rotate(&self) -> String {
        let next = RotationState {
            key: self.scheme.generate(),
            generated_at: self.clock.now_utc(),
        };

        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next.clone();
        tracing::info!(generated_at = %next.generated_at, "Rotated current key");

        self.announce(&next);
        next.key
    }

    /// Run rotation every `interval` on the current tokio runtime.
    ///
    /// The first rotation happens one full interval from now.
    pub fn spawn(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                this.rotate();
            }
        })
    }

    fn read(&self) -> RotationState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn announce(&self, state: &RotationState) {
        self.notifier.notify(
            KeyEvent::Created {
                key: state.key.clone(),
                expires_at: None,
                hwid: None,
            },
            state.generated_at,
        );
    }
}
