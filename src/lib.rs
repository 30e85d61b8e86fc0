//! # Keywarden
//!
//! **Short-lived access keys with first-use device binding.**
//!
//! Keywarden issues opaque keys with a fixed lifetime, verifies them, and
//! revokes them. A key can be pinned to a hardware identifier (HWID): the
//! first verification that presents one binds it, and every later
//! verification presenting a different HWID is rejected.
//!
//! ## Features
//!
//! - **Two key formats**: `KEY-<UUID>` or `XXXX-XXXX-XXXX-XXXX-XXXX`
//! - **Exactly-once HWID binding**: conditional replace in the store
//! - **Lazy expiry**: expired keys are deleted when next verified
//! - **Webhook notifications**: created / activated / expired / revoked,
//!   fire-and-forget
//! - **Rotating current key**: one process-wide key replaced on a schedule
//!
//! ## Quickstart
//!
//! ```no_run
//! use keywarden::{KeyManager, KeyScheme, MemoryStore, NoopNotifier};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), keywarden::KeywardenError> {
//!     let manager = KeyManager::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(NoopNotifier),
//!         KeyScheme::Grouped,
//!     );
//!
//!     let issued = manager.generate(3600, None)?;
//!     let checked = manager.verify(Some(&issued.key), Some("DEVICE-A"))?;
//!     println!("{} valid for {} ms", issued.key, checked.time_left);
//!
//!     manager.revoke(Some(&issued.key))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Limitations
//!
//! Keys are bearer tokens: they are not signed, and anyone holding one can
//! present it. The management endpoints are unauthenticated. The file store
//! binds HWIDs atomically only within one process.

#![deny(warnings)]
#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Key material
pub mod keys;

// Storage layer
pub mod store;

// Notification layer
pub mod notify;

// Manager (main public API)
pub mod manager;

// Rotating current key
pub mod rotation;

// HTTP API
pub mod http;

// Re-exports for public API
pub use clock::{Clock, SystemClock};
pub use config::{KeywardenConfig, StoreConfig, StoreKind};
pub use errors::KeywardenError;
pub use keys::generator::KeyScheme;
pub use manager::{GenerateResult, KeyManager, VerifyResult};
pub use notify::{KeyEvent, NoopNotifier, Notification, Notifier, WebhookNotifier};
pub use rotation::RotatingKey;
pub use store::{FileStore, KeyRecord, KeyStore, MemoryStore};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
#[cfg(any(test, feature = "test-seams"))]
pub use notify::RecordingNotifier;
