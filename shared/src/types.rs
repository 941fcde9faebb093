//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Supported languages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    French,
    English,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::French => "fr",
            Language::English => "en",
        }
    }
}

/// Barcode symbologies reported by the decode capability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    Ean13,
    Ean8,
    Code128,
    Code39,
    QrCode,
    DataMatrix,
    Unknown,
}

impl BarcodeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeFormat::Ean13 => "ean_13",
            BarcodeFormat::Ean8 => "ean_8",
            BarcodeFormat::Code128 => "code_128",
            BarcodeFormat::Code39 => "code_39",
            BarcodeFormat::QrCode => "qr_code",
            BarcodeFormat::DataMatrix => "data_matrix",
            BarcodeFormat::Unknown => "unknown",
        }
    }
}

/// A single raw candidate from the decode capability.
///
/// The format label is best-effort; it never influences validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedCandidate {
    pub text: String,
    pub format: BarcodeFormat,
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

/// Date range for queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}
