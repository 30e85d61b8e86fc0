//! HTTP API.
//!
//! | Path | Method | Body | Response |
//! |---|---|---|---|
//! | `/generate` | POST | `{duration?, hwid?}` | `{success, key, expiresAt}` |
//! | `/verify` | POST | `{key, hwid?}` | `{success, expiresAt, timeLeft}` |
//! | `/revoke` | POST | `{key}` | `{success}` |
//! | `/key` | GET | - | `{key}` |
//!
//! Anything else, including a known path with the wrong method, gets a
//! plain-text endpoint listing. CORS allows any origin.

pub mod error;
pub mod handlers;

use crate::manager::{KeyManager, DEFAULT_KEY_DURATION_SECS};
use crate::rotation::RotatingKey;
use axum::http::{header::CONTENT_TYPE, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Key lifecycle manager.
    pub manager: Arc<KeyManager>,

    /// Rotating current key, if enabled.
    pub rotation: Option<Arc<RotatingKey>>,

    /// Lifetime of keys generated without an explicit duration.
    pub default_duration_secs: i64,
}

impl AppState {
    /// State with the default key lifetime and no rotating key.
    pub fn new(manager: Arc<KeyManager>) -> Self {
        Self {
            manager,
            rotation: None,
            default_duration_secs: DEFAULT_KEY_DURATION_SECS,
        }
    }

    /// Serve `rotation` at `/key`.
    pub fn with_rotation(mut self, rotation: Arc<RotatingKey>) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Override the default key lifetime.
    pub fn with_default_duration(mut self, secs: i64) -> Self {
        self.default_duration_secs = secs;
        self
    }
}

/// CORS policy: any origin, GET/POST/OPTIONS, `Content-Type` header.
///
/// The layer answers every `OPTIONS` request itself with an empty body.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

/// Build the HTTP API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(handlers::generate))
        .route("/verify", post(handlers::verify))
        .route("/revoke", post(handlers::revoke))
        .route("/key", get(handlers::current_key))
        .fallback(handlers::info)
        .method_not_allowed_fallback(handlers::info)
        .layer(cors_layer())
        .with_state(state)
}
