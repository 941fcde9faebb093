//! Barcode Decode Client
//!
//! Client for the hosted symbol-decode microservice. Given a still image it
//! returns zero or one candidate; no-detection and transport failures are
//! both "no candidate this frame", never an error surfaced to the operator.

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::{BarcodeFormat, DecodedCandidate};

use crate::error::{AppError, AppResult};

/// Client for the barcode decode microservice
#[derive(Clone)]
pub struct DecodeClient {
    api_endpoint: String,
    api_key: String,
    http_client: Client,
}

/// Request to decode a still image
#[derive(Debug, Serialize)]
pub struct DecodeRequest {
    pub image_base64: String,
}

/// Response from the decode API
#[derive(Debug, Deserialize)]
pub struct DecodeResponse {
    pub request_id: String,
    pub candidate: Option<CandidateResponse>,
}

/// Candidate from the API response
#[derive(Debug, Deserialize)]
pub struct CandidateResponse {
    pub text: String,
    pub format: String,
    pub confidence: Option<f32>,
}

impl From<CandidateResponse> for DecodedCandidate {
    fn from(r: CandidateResponse) -> Self {
        let format = match r.format.as_str() {
            "ean_13" => BarcodeFormat::Ean13,
            "ean_8" => BarcodeFormat::Ean8,
            "code_128" => BarcodeFormat::Code128,
            "code_39" => BarcodeFormat::Code39,
            "qr_code" => BarcodeFormat::QrCode,
            "data_matrix" => BarcodeFormat::DataMatrix,
            _ => BarcodeFormat::Unknown,
        };
        DecodedCandidate {
            text: r.text,
            format,
        }
    }
}

impl DecodeClient {
    /// Create a new DecodeClient instance
    pub fn new(api_endpoint: String, api_key: String) -> Self {
        Self {
            api_endpoint,
            api_key,
            http_client: Client::new(),
        }
    }

    /// True when a decode endpoint is configured
    pub fn is_configured(&self) -> bool {
        !self.api_endpoint.is_empty()
    }

    /// Decode a still image. Returns `None` when nothing was detected or the
    /// service could not be reached; the capture loop treats both the same.
    pub async fn decode_image(&self, image_base64: &str) -> AppResult<Option<DecodedCandidate>> {
        if !self.is_configured() {
            return Err(AppError::DecodeServiceUnavailable);
        }

        // Reject payloads that are not valid base64 before spending a call
        if base64::engine::general_purpose::STANDARD
            .decode(image_base64)
            .is_err()
        {
            return Err(AppError::Validation {
                field: "image_base64".to_string(),
                message: "Image payload is not valid base64".to_string(),
                message_fr: "L'image n'est pas un contenu base64 valide".to_string(),
            });
        }

        let response = self
            .http_client
            .post(format!("{}/decode", self.api_endpoint))
            .header("x-api-key", &self.api_key)
            .json(&DecodeRequest {
                image_base64: image_base64.to_string(),
            })
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Decode service unreachable: {}", e);
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Decode service returned status {}", response.status());
            return Ok(None);
        }

        let body: DecodeResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Decode service returned invalid payload: {}", e);
                return Ok(None);
            }
        };

        Ok(body.candidate.map(DecodedCandidate::from))
    }
}
