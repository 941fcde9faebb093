//! Error handling for the Fleet Operations Platform
//!
//! Provides consistent error responses in French and English. Every
//! operator-recoverable outcome carries a suggested next action so the
//! scanning screens can guide the operator instead of crashing the session.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String, message_fr: String },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_fr: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Container {identifier} is closed")]
    ContainerClosed { identifier: String },

    #[error("Insufficient stock for {item}: requested {requested}, available {available}")]
    InsufficientStock {
        item: String,
        requested: i64,
        available: i64,
    },

    // External service errors
    #[error("Decode service unavailable")]
    DecodeServiceUnavailable,

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_fr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Suggested recovery for operator-facing errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message_en: String, message_fr: String) -> Self {
        Self {
            code: code.to_string(),
            message_en,
            message_fr,
            field: None,
            next_action: None,
        }
    }

    fn with_field(mut self, field: String) -> Self {
        self.field = Some(field);
        self
    }

    fn with_next_action(mut self, next_action: &str) -> Self {
        self.next_action = Some(next_action.to_string());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new(
                    "INVALID_CREDENTIALS",
                    "Invalid email or password".to_string(),
                    "Adresse e-mail ou mot de passe incorrect".to_string(),
                ),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new(
                    "TOKEN_EXPIRED",
                    "Token has expired".to_string(),
                    "Le jeton a expiré".to_string(),
                ),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new(
                    "INVALID_TOKEN",
                    "Invalid token".to_string(),
                    "Jeton invalide".to_string(),
                ),
            ),
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "INSUFFICIENT_PERMISSIONS",
                    "You do not have permission to perform this action".to_string(),
                    "Vous n'avez pas l'autorisation d'effectuer cette action".to_string(),
                ),
            ),
            AppError::Unauthorized {
                message,
                message_fr,
            } => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone(), message_fr.clone()),
            ),
            AppError::Validation {
                field,
                message,
                message_fr,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", message.clone(), message_fr.clone())
                    .with_field(field.clone()),
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "VALIDATION_ERROR",
                    msg.clone(),
                    format!("Données invalides : {}", msg),
                ),
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "DUPLICATE_ENTRY",
                    format!("A record with this {} already exists", field),
                    format!("Un enregistrement avec ce {} existe déjà", field),
                )
                .with_field(field.clone())
                .with_next_action("choose a different identifier"),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new(
                    "NOT_FOUND",
                    format!("{} not found", resource),
                    format!("{} introuvable", resource),
                ),
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "INVALID_STATE_TRANSITION",
                    msg.clone(),
                    format!("Changement d'état impossible : {}", msg),
                ),
            ),
            AppError::ContainerClosed { identifier } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "CONTAINER_CLOSED",
                    format!("Container {} is closed and can no longer be modified", identifier),
                    format!("Le colis {} est fermé et ne peut plus être modifié", identifier),
                )
                .with_next_action("pack into an open container"),
            ),
            AppError::InsufficientStock {
                item,
                requested,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "INSUFFICIENT_STOCK",
                    format!(
                        "Insufficient stock for {}: requested {}, available {}",
                        item, requested, available
                    ),
                    format!(
                        "Stock insuffisant pour {} : demandé {}, disponible {}",
                        item, requested, available
                    ),
                )
                .with_next_action("reduce the quantity or adjust stock first"),
            ),
            AppError::DecodeServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new(
                    "DECODE_SERVICE_UNAVAILABLE",
                    "Barcode decode service is temporarily unavailable".to_string(),
                    "Le service de décodage est temporairement indisponible".to_string(),
                )
                .with_next_action("switch to manual code entry"),
            ),
            AppError::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new(
                    "EXTERNAL_SERVICE_ERROR",
                    format!("External service error: {}", msg),
                    format!("Erreur d'un service externe : {}", msg),
                ),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "CONFIGURATION_ERROR",
                    format!("Configuration error: {}", msg),
                    format!("Erreur de configuration : {}", msg),
                ),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "DATABASE_ERROR",
                    "A database error occurred; no stock change was applied".to_string(),
                    "Une erreur de base de données est survenue ; aucun mouvement de stock n'a été appliqué"
                        .to_string(),
                ),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    msg.clone(),
                    "Erreur interne du serveur".to_string(),
                ),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    "Erreur interne du serveur".to_string(),
                ),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
