//! Lifecycle notifications.
//!
//! The manager reports four events: a key was created, bound to a device
//! (activated), found expired, or revoked. Delivery is fire-and-forget: a
//! [`Notifier`] must return immediately and absorb its own failures.

pub mod webhook;

pub use webhook::WebhookNotifier;

use crate::KeywardenError;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use std::sync::Arc;

/// A key lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    /// A key was issued (or rotated in as the current key).
    Created {
        /// The new key.
        key: String,
        /// Expiry (ms since epoch), if the key has one.
        expires_at: Option<i64>,
        /// HWID supplied at creation.
        hwid: Option<String>,
    },
    /// A key was bound to a HWID on first verification.
    Activated {
        /// The key.
        key: String,
        /// The newly bound HWID.
        hwid: String,
    },
    /// A key was found past its expiry and deleted.
    Expired {
        /// The key.
        key: String,
    },
    /// A key was revoked.
    Revoked {
        /// The key.
        key: String,
    },
}

impl KeyEvent {
    /// Short machine-readable event name.
    pub fn kind(&self) -> &'static str {
        match self {
            KeyEvent::Created { .. } => "created",
            KeyEvent::Activated { .. } => "activated",
            KeyEvent::Expired { .. } => "expired",
            KeyEvent::Revoked { .. } => "revoked",
        }
    }

    /// The key this event concerns.
    pub fn key(&self) -> &str {
        match self {
            KeyEvent::Created { key, .. }
            | KeyEvent::Activated { key, .. }
            | KeyEvent::Expired { key }
            | KeyEvent::Revoked { key } => key,
        }
    }

    /// Render the event as a structured message stamped with `at`.
    pub fn to_notification(&self, at: DateTime<Utc>) -> Notification {
        let mut fields = vec![NotificationField::new("Key", self.key())];

        let title = match self {
            KeyEvent::Created {
                expires_at, hwid, ..
            } => {
                if let Some(expires_at) = expires_at {
                    fields.push(NotificationField::new("Expires", format_millis(*expires_at)));
                }
                if let Some(hwid) = hwid {
                    fields.push(NotificationField::new("HWID", hwid));
                }
                "Key Created"
            }
            KeyEvent::Activated { hwid, .. } => {
                fields.push(NotificationField::new("HWID", hwid));
                "Key Activated"
            }
            KeyEvent::Expired { .. } => "Key Expired",
            KeyEvent::Revoked { .. } => "Key Revoked",
        };

        Notification {
            title: title.to_string(),
            fields,
            timestamp: at,
        }
    }
}

/// Structured message handed to a notification sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Headline.
    pub title: String,
    /// Name/value pairs.
    pub fields: Vec<NotificationField>,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
}

/// One name/value pair of a [`Notification`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationField {
    /// Field label.
    pub name: String,
    /// Field content.
    pub value: String,
}

impl NotificationField {
    /// Build a field.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Sink for key lifecycle events.
///
/// Implementations must not block the caller and must not fail it.
pub trait Notifier: Send + Sync {
    /// Dispatch `event`, which happened at `at`.
    fn notify(&self, event: KeyEvent, at: DateTime<Utc>);
}

/// Notifier that drops every event. Used when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, event: KeyEvent, _at: DateTime<Utc>) {
        tracing::trace!(kind = event.kind(), "No notifier configured, dropping event");
    }
}

/// Build the notifier for an optional webhook URL.
pub fn notifier_for(webhook_url: Option<&str>) -> Result<Arc<dyn Notifier>, KeywardenError> {
    let notifier: Arc<dyn Notifier> = match webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url)?),
        None => Arc::new(NoopNotifier),
    };
    Ok(notifier)
}

/// Notifier that keeps every event in memory, for tests.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: std::sync::Mutex<Vec<KeyEvent>>,
}

#[cfg(any(test, feature = "test-seams"))]
impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first.
    pub fn events(&self) -> Vec<KeyEvent> {
        self.events.lock().expect("recorder poisoned").clone()
    }

    /// Event kinds received so far, oldest first.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(KeyEvent::kind).collect()
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl Notifier for RecordingNotifier {
    fn notify(&self, event: KeyEvent, _at: DateTime<Utc>) {
        self.events.lock().expect("recorder poisoned").push(event);
    }
}

/// Format an epoch-millisecond timestamp as RFC 3339.
///
/// Out-of-range values fall back to the raw number.
pub fn format_millis(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => millis.to_string(),
    }
}
