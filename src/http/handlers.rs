//! Request handlers.
//!
//! Bodies are parsed from raw bytes so that an empty body means "all
//! defaults" and malformed JSON becomes an `InvalidRequest`. Store work runs
//! on the blocking pool.

use super::AppState;
use crate::KeywardenError;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Plain-text listing served for unmatched routes.
pub const INFO_TEXT: &str = "Keywarden key service\n\
\n\
POST /generate  {\"duration\": seconds?, \"hwid\": string?}\n\
POST /verify    {\"key\": string, \"hwid\": string?}\n\
POST /revoke    {\"key\": string}\n\
GET  /key       current rotating key\n";

/// `/generate` request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    /// Lifetime in seconds. Any JSON number, fractions included.
    #[serde(default)]
    pub duration: Option<f64>,
    /// HWID to bind at creation.
    #[serde(default)]
    pub hwid: Option<String>,
}

/// `/verify` request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyRequest {
    /// Key to verify.
    #[serde(default)]
    pub key: Option<String>,
    /// Caller's HWID.
    #[serde(default)]
    pub hwid: Option<String>,
}

/// `/revoke` request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevokeRequest {
    /// Key to revoke.
    #[serde(default)]
    pub key: Option<String>,
}

/// `/generate` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Always `true`.
    pub success: bool,
    /// The new key.
    pub key: String,
    /// Expiry (ms since epoch).
    pub expires_at: i64,
}

/// `/verify` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Always `true`.
    pub success: bool,
    /// Expiry (ms since epoch).
    pub expires_at: i64,
    /// Milliseconds until expiry.
    pub time_left: i64,
}

/// `/revoke` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeResponse {
    /// Always `true`.
    pub success: bool,
}

/// `/key` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentKeyResponse {
    /// The current rotating key.
    pub key: String,
}

fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, KeywardenError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| KeywardenError::InvalidRequest(format!("Invalid JSON body: {}", e)))
}

/// Seconds to whole milliseconds, rounded. Out-of-range values saturate.
fn secs_to_millis(secs: f64) -> i64 {
    (secs * 1000.0).round() as i64
}

async fn run_blocking<T, F>(f: F) -> Result<T, KeywardenError>
where
    F: FnOnce() -> Result<T, KeywardenError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| KeywardenError::Internal(format!("Worker task failed: {}", e)))?
}

/// `POST /generate`
pub async fn generate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, KeywardenError> {
    let request: GenerateRequest = parse_body(&body)?;
    let lifetime_ms = match request.duration {
        Some(secs) => secs_to_millis(secs),
        None => state.default_duration_secs.saturating_mul(1000),
    };

    let manager = state.manager.clone();
    let result =
        run_blocking(move || manager.generate_millis(lifetime_ms, request.hwid.as_deref()))
            .await?;

    Ok(Json(GenerateResponse {
        success: true,
        key: result.key,
        expires_at: result.expires_at,
    }))
}

/// `POST /verify`
pub async fn verify(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<VerifyResponse>, KeywardenError> {
    let request: VerifyRequest = parse_body(&body)?;

    let manager = state.manager.clone();
    let result = run_blocking(move || {
        manager.verify(request.key.as_deref(), request.hwid.as_deref())
    })
    .await?;

    Ok(Json(VerifyResponse {
        success: true,
        expires_at: result.expires_at,
        time_left: result.time_left,
    }))
}

/// `POST /revoke`
pub async fn revoke(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RevokeResponse>, KeywardenError> {
    let request: RevokeRequest = parse_body(&body)?;

    let manager = state.manager.clone();
    run_blocking(move || manager.revoke(request.key.as_deref())).await?;

    Ok(Json(RevokeResponse { success: true }))
}

/// `GET /key`
pub async fn current_key(
    State(state): State<AppState>,
) -> Result<Json<CurrentKeyResponse>, KeywardenError> {
    let rotation = state.rotation.as_ref().ok_or(KeywardenError::NotFound)?;
    Ok(Json(CurrentKeyResponse {
        key: rotation.current_key(),
    }))
}

/// Fallback for unmatched routes.
pub async fn info() -> &'static str {
    INFO_TEXT
}
