//! Reqwest-based webhook notifier.
//!
//! Posts a Discord-compatible message (`content` plus one embed) to the
//! configured URL from a detached tokio task. The caller never waits for
//! delivery; failures and panics are logged here and go no further.
//! Delivery is attempted once.

use super::{KeyEvent, Notification, Notifier};
use crate::KeywardenError;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::FutureExt;
use reqwest::Client;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

/// Default per-request timeout for webhook delivery.
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Webhook notification sink.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WebhookNotifier {
    /// Create a notifier posting to `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, KeywardenError> {
        let client = Client::builder()
            .user_agent(concat!("keywarden/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                KeywardenError::ConfigError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            url: url.into(),
            timeout: DEFAULT_WEBHOOK_TIMEOUT,
        })
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver one notification and wait for the response.
    ///
    /// Non-2xx responses are reported as errors.
    pub async fn send(&self, notification: &Notification) -> Result<(), KeywardenError> {
        let body = build_payload(notification);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| KeywardenError::NotifierTransport(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeywardenError::NotifierTransport(format!(
                "Webhook returned {}",
                status
            )));
        }

        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, event: KeyEvent, at: DateTime<Utc>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                kind = event.kind(),
                "No async runtime available, dropping webhook notification"
            );
            return;
        };

        let notifier = self.clone();
        let kind = event.kind();
        let notification = event.to_notification(at);

        handle.spawn(
            AssertUnwindSafe(async move {
                match notifier.send(&notification).await {
                    Ok(()) => tracing::debug!(kind, "Webhook notification delivered"),
                    Err(e) => tracing::warn!(kind, error = %e, "Webhook notification failed"),
                }
            })
            .catch_unwind()
            .map(move |result| {
                if let Err(panic) = result {
                    let panic_msg = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!("Webhook task panicked for event '{}': {}", kind, panic_msg);
                }
            }),
        );
    }
}

/// Embed color per notification title.
fn embed_color(title: &str) -> u32 {
    match title {
        "Key Created" => 0x2ECC71,
        "Key Activated" => 0x3498DB,
        "Key Expired" => 0xE67E22,
        "Key Revoked" => 0xE74C3C,
        _ => 0x95A5A6,
    }
}

/// Build the JSON body posted to the webhook.
pub fn build_payload(notification: &Notification) -> serde_json::Value {
    let summary = notification
        .fields
        .first()
        .map(|f| format!("{}: {}", notification.title, f.value))
        .unwrap_or_else(|| notification.title.clone());

    let fields: Vec<serde_json::Value> = notification
        .fields
        .iter()
        .map(|f| {
            serde_json::json!({
                "name": f.name,
                "value": f.value,
                "inline": false
            })
        })
        .collect();

    serde_json::json!({
        "content": summary,
        "embeds": [{
            "title": notification.title,
            "color": embed_color(&notification.title),
            "fields": fields,
            "timestamp": notification
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        }]
    })
}
