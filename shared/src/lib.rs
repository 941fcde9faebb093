//! Shared types and models for the Fleet Operations Platform
//!
//! This crate contains types shared between the backend, frontend (via WASM),
//! and other components of the system. The scan confirmation engine and the
//! catalog search logic live here so the browser runs the exact same code as
//! the server.

pub mod models;
pub mod scan;
pub mod search;
pub mod types;
pub mod validation;

pub use models::*;
pub use scan::*;
pub use search::*;
pub use types::*;
pub use validation::*;
