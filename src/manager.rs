//! Key Manager - the main public API for Keywarden.
//!
//! The `KeyManager` owns the key lifecycle:
//! - Issue keys with a fixed expiry, optionally pre-bound to a HWID
//! - Verify keys against expiry and HWID binding, binding on first use
//! - Revoke keys
//!
//! Expiry is enforced lazily: an expired record is deleted by the first
//! verification that finds it. Nothing sweeps the store in the background.

use crate::clock::{Clock, SystemClock};
use crate::keys::generator::KeyScheme;
use crate::notify::{KeyEvent, Notifier};
use crate::store::{KeyRecord, KeyStore};
use crate::KeywardenError;
use std::sync::Arc;

/// Default key lifetime when the caller does not ask for one (24 hours).
pub const DEFAULT_KEY_DURATION_SECS: i64 = 24 * 60 * 60;

/// Result of issuing a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateResult {
    /// The new key.
    pub key: String,

    /// Expiry (ms since epoch).
    pub expires_at: i64,
}

/// Result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    /// Expiry (ms since epoch).
    pub expires_at: i64,

    /// Milliseconds until expiry.
    pub time_left: i64,
}

/// Main key manager for Keywarden.
///
/// Create one instance per process and share it behind an `Arc`.
pub struct KeyManager {
    store: Arc<dyn KeyStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    scheme: KeyScheme,
}

impl KeyManager {
    /// Create a key manager using the system clock.
    pub fn new(store: Arc<dyn KeyStore>, notifier: Arc<dyn Notifier>, scheme: KeyScheme) -> Self {
        Self::with_clock(store, notifier, Arc::new(SystemClock), scheme)
    }

    /// Create a key manager with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_clock(
        store: Arc<dyn KeyStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        scheme: KeyScheme,
    ) -> Self {
        Self::with_clock(store, notifier, clock, scheme)
    }

    fn with_clock(
        store: Arc<dyn KeyStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        scheme: KeyScheme,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            scheme,
        }
    }

    /// Issue a new key valid for `duration_secs`.
    ///
    /// The duration is not validated: zero or negative values produce a key
    /// that is already expired. A `hwid` given here binds the key from
    /// creation; `used` still starts out false.
    ///
    /// # Errors
    /// - `StoreIO` - The record could not be persisted
    pub fn generate(
        &self,
        duration_secs: i64,
        hwid: Option<&str>,
    ) -> Result<GenerateResult, KeywardenError> {
        self.generate_millis(duration_secs.saturating_mul(1000), hwid)
    }

    /// Issue a new key valid for `lifetime_ms` milliseconds.
    ///
    /// Same contract as [`generate`](Self::generate), for callers holding a
    /// fractional duration.
    pub fn generate_millis(
        &self,
        lifetime_ms: i64,
        hwid: Option<&str>,
    ) -> Result<GenerateResult, KeywardenError> {
        let now = self.clock.now_millis();
        let key = self.scheme.generate();
        let record = KeyRecord::with_lifetime_millis(
            key,
            normalize(hwid).map(String::from),
            now,
            lifetime_ms,
        );

        self.store.put(&record)?;

        tracing::info!(
            expires_at = record.expires_at,
            bound = record.hwid.is_some(),
            "Issued key"
        );

        self.notifier.notify(
            KeyEvent::Created {
                key: record.key.clone(),
                expires_at: Some(record.expires_at),
                hwid: record.hwid.clone(),
            },
            self.clock.now_utc(),
        );

        Ok(GenerateResult {
            key: record.key,
            expires_at: record.expires_at,
        })
    }

    /// Verify a key, binding `hwid` to it if it has no binding yet.
    ///
    /// A bound key verified without a HWID is accepted. Empty strings count
    /// as absent for both arguments.
    ///
    /// # Errors
    /// - `InvalidRequest` - No key provided
    /// - `NotFound` - No record for the key
    /// - `Expired` - Key is past its expiry; the record has been deleted
    /// - `HwidMismatch` - Key is bound to a different HWID
    /// - `StoreIO` / `CorruptRecord` - Store failure
    pub fn verify(
        &self,
        key: Option<&str>,
        hwid: Option<&str>,
    ) -> Result<VerifyResult, KeywardenError> {
        let key = normalize(key)
            .ok_or_else(|| KeywardenError::InvalidRequest("Key is required".to_string()))?;
        let hwid = normalize(hwid);

        let record = self.store.get(key)?.ok_or(KeywardenError::NotFound)?;

        let now = self.clock.now_millis();
        if record.is_expired_at(now) {
            self.store.delete(key)?;
            tracing::info!(expires_at = record.expires_at, "Deleted expired key");
            self.notifier.notify(
                KeyEvent::Expired {
                    key: key.to_string(),
                },
                self.clock.now_utc(),
            );
            return Err(KeywardenError::Expired);
        }

        if let (Some(bound), Some(supplied)) = (record.hwid.as_deref(), hwid) {
            if bound != supplied {
                tracing::warn!("Rejected key verification: HWID mismatch");
                return Err(KeywardenError::HwidMismatch);
            }
        }

        let record = match hwid {
            Some(supplied) if record.hwid.is_none() => self.bind(record, supplied)?,
            _ => record,
        };

        Ok(VerifyResult {
            expires_at: record.expires_at,
            time_left: record.time_left_at(now),
        })
    }

    /// Bind `hwid` to an unbound record.
    ///
    /// Uses the store's conditional replace so two concurrent binders cannot
    /// both win. The loser re-reads the record and is judged against the
    /// winner's binding.
    fn bind(&self, record: KeyRecord, hwid: &str) -> Result<KeyRecord, KeywardenError> {
        let bound = record.bound_to(hwid);

        if self.store.replace(&record, &bound)? {
            tracing::info!("Bound key to HWID");
            self.notifier.notify(
                KeyEvent::Activated {
                    key: bound.key.clone(),
                    hwid: hwid.to_string(),
                },
                self.clock.now_utc(),
            );
            return Ok(bound);
        }

        tracing::debug!("Lost HWID bind race, re-reading record");
        let current = self
            .store
            .get(&record.key)?
            .ok_or(KeywardenError::NotFound)?;

        match current.hwid.as_deref() {
            Some(winner) if winner == hwid => Ok(current),
            Some(_) => {
                tracing::warn!("Rejected key verification: HWID bound concurrently");
                Err(KeywardenError::HwidMismatch)
            }
            None => Err(KeywardenError::Internal(
                "conditional replace failed on an unbound record".to_string(),
            )),
        }
    }

    /// Revoke a key.
    ///
    /// Succeeds whether or not the key exists, so the only failure a
    /// well-formed request can see is a store error (500). A request with no
    /// key at all is rejected as a client error instead of being treated as
    /// revoking nothing.
    ///
    /// # Errors
    /// - `InvalidRequest` - No key provided
    /// - `StoreIO` - Store failure
    pub fn revoke(&self, key: Option<&str>) -> Result<(), KeywardenError> {
        let key = normalize(key)
            .ok_or_else(|| KeywardenError::InvalidRequest("Key is required".to_string()))?;

        self.store.delete(key)?;
        tracing::info!("Revoked key");

        self.notifier.notify(
            KeyEvent::Revoked {
                key: key.to_string(),
            },
            self.clock.now_utc(),
        );

        Ok(())
    }

    /// Key scheme used for new keys.
    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }
}

/// Treat empty strings as absent.
fn normalize(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
