//! WebAssembly module for the Fleet Operations Platform
//!
//! Provides client-side computation for the scanning screens:
//! - Majority-vote scan confirmation (debouncing raw decode candidates)
//! - Multi-code candidate tally for operator disambiguation
//! - Code validation (shared with the backend manual-entry endpoint)
//! - Catalog search over the browser-cached item list
//!
//! The camera loop stays in JavaScript; each raw decode result is pushed
//! through `ScanConfirmer.submit` synchronously so the loop is never stalled
//! by network latency.

use wasm_bindgen::prelude::*;

use shared::models::CatalogItem;
use shared::scan::{CandidateTally, ScanConfig, ScanEngine, ScanPolicy};
use shared::search;
use shared::validation;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Majority-vote scan confirmation engine driven from the browser capture
/// loop
#[wasm_bindgen]
pub struct ScanConfirmer {
    engine: ScanEngine,
}

#[wasm_bindgen]
impl ScanConfirmer {
    /// Create an engine. `policy` is "alphanumeric" or "numeric_strict".
    #[wasm_bindgen(constructor)]
    pub fn new(window_size: usize, threshold: usize, policy: &str) -> ScanConfirmer {
        let policy = match policy {
            "numeric_strict" => ScanPolicy::NumericStrict,
            _ => ScanPolicy::Alphanumeric,
        };
        ScanConfirmer {
            engine: ScanEngine::new(ScanConfig {
                window_size,
                threshold,
                policy,
            }),
        }
    }

    /// Submit one raw candidate; returns the outcome as a JSON string:
    /// `{"status":"confirmed","code":...}`, `{"status":"pending",...}` or
    /// `{"status":"rejected","reason":...}`.
    pub fn submit(&mut self, raw: &str) -> Result<String, JsValue> {
        let outcome = self.engine.submit(raw);
        serde_json::to_string(&outcome)
            .map_err(|e| JsValue::from_str(&format!("Outcome serialization failed: {}", e)))
    }

    /// Clear the voting window (called when the capture session restarts or
    /// the camera is released)
    pub fn reset(&mut self) {
        self.engine.reset();
    }
}

/// Bounded tally of detected codes for the multi-code confirmation screen
#[wasm_bindgen]
pub struct CandidateList {
    tally: CandidateTally,
}

#[wasm_bindgen]
impl CandidateList {
    #[wasm_bindgen(constructor)]
    pub fn new(capacity: usize) -> CandidateList {
        CandidateList {
            tally: CandidateTally::new(capacity),
        }
    }

    /// Record one detection; returns the updated count for that code
    pub fn record(&mut self, code: &str) -> usize {
        self.tally.record(code)
    }

    /// Ranked candidates as a JSON array of `[code, count]` pairs
    pub fn ranked(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.tally.ranked())
            .map_err(|e| JsValue::from_str(&format!("Tally serialization failed: {}", e)))
    }

    /// Operator picked a candidate; returns it and clears the list, or null
    /// if the code is not in the tally
    pub fn select(&mut self, code: &str) -> Option<String> {
        self.tally.select(code)
    }

    pub fn clear(&mut self) {
        self.tally.clear();
    }
}

/// Validate a code against the scan input filter without an engine instance
#[wasm_bindgen]
pub fn validate_code(code: &str, strict_numeric: bool) -> bool {
    if strict_numeric {
        validation::validate_numeric_code(code).is_ok()
    } else {
        validation::validate_scan_code(code).is_ok()
    }
}

/// Search the browser-cached catalog list. `items_json` is a JSON array of
/// catalog items; returns the matching items ranked, as JSON.
#[wasm_bindgen]
pub fn search_cached_catalog(items_json: &str, query: &str) -> Result<String, JsValue> {
    let items: Vec<CatalogItem> = serde_json::from_str(items_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid items JSON: {}", e)))?;

    let results = search::search_items(&items, query);
    serde_json::to_string(&results)
        .map_err(|e| JsValue::from_str(&format!("Result serialization failed: {}", e)))
}

/// Resolve a confirmed code against the cached list (exact reference/name
/// match); returns the item as JSON or null
#[wasm_bindgen]
pub fn resolve_cached_code(items_json: &str, code: &str) -> Result<Option<String>, JsValue> {
    let items: Vec<CatalogItem> = serde_json::from_str(items_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid items JSON: {}", e)))?;

    match search::find_exact(&items, code) {
        Some(item) => serde_json::to_string(item)
            .map(Some)
            .map_err(|e| JsValue::from_str(&format!("Item serialization failed: {}", e))),
        None => Ok(None),
    }
}
