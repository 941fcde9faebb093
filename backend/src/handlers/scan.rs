//! HTTP handlers for the scan endpoints
//!
//! `resolve_code` serves both the confirmed-code path and manual entry: the
//! payload is validated with the same filter the browser engine applies, so
//! a code that would never survive the voting window is rejected before it
//! reaches the resolver. A miss is a 404 whose payload names item creation
//! as the recovery path.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::external::DecodeClient;
use crate::middleware::CurrentUser;
use crate::services::catalog::{CatalogService, ResolveOutcome};
use crate::AppState;
use shared::types::DecodedCandidate;

/// Payload for resolving a confirmed or manually entered code
#[derive(Debug, Deserialize)]
pub struct ResolveCodeRequest {
    pub code: String,
}

/// Payload for decoding a still image through the external capability
#[derive(Debug, Deserialize)]
pub struct DecodeImageRequest {
    pub image_base64: String,
}

/// Decode response: zero or one candidate
#[derive(Debug, Serialize)]
pub struct DecodeImageResponse {
    pub candidate: Option<DecodedCandidate>,
}

/// Scan configuration served to clients so the browser engine matches the
/// server-side filter
#[derive(Debug, Serialize)]
pub struct ScanConfigResponse {
    pub window_size: usize,
    pub threshold: usize,
    pub policy: String,
}

/// Resolve a code to a catalog item
pub async fn resolve_code(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ResolveCodeRequest>,
) -> AppResult<Json<ResolveOutcome>> {
    let code = input.code.trim();
    state
        .config
        .scan
        .policy()
        .validate(code)
        .map_err(|msg| AppError::Validation {
            field: "code".to_string(),
            message: msg.to_string(),
            message_fr: "Code invalide".to_string(),
        })?;

    let service = CatalogService::new(state.db.clone());
    let outcome = service
        .resolve(
            current_user.0.site_id,
            current_user.0.can_cross_site(),
            code,
        )
        .await?;

    match outcome {
        Some(outcome) => Ok(Json(outcome)),
        // A miss is expected: the operator can create the item and retry
        None => Err(AppError::NotFound("Catalog item".to_string())),
    }
}

/// Decode a still image via the external decode capability
pub async fn decode_image(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<DecodeImageRequest>,
) -> AppResult<Json<DecodeImageResponse>> {
    let client = DecodeClient::new(
        state.config.decode.endpoint.clone(),
        state.config.decode.api_key.clone(),
    );
    let candidate = client.decode_image(&input.image_base64).await?;
    Ok(Json(DecodeImageResponse { candidate }))
}

/// Serve the scan engine configuration
pub async fn scan_config(State(state): State<AppState>) -> Json<ScanConfigResponse> {
    Json(ScanConfigResponse {
        window_size: state.config.scan.window_size,
        threshold: state.config.scan.threshold,
        policy: state.config.scan.policy.clone(),
    })
}
