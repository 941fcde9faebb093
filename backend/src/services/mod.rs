//! Business logic services for the Fleet Operations Platform

pub mod auth;
pub mod catalog;
pub mod container;
pub mod packing;
pub mod preparation;
pub mod stock;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use container::ContainerService;
pub use packing::PackingService;
pub use preparation::PreparationService;
pub use stock::StockService;

/// Attempts for stock-mutating transactions before a conflict is surfaced
pub(crate) const MAX_TX_ATTEMPTS: u32 = 3;

/// True for serialization/deadlock failures that are safe to retry after the
/// transaction rolled back (SQLSTATE 40001 and 40P01)
pub(crate) fn is_transient(error: &crate::error::AppError) -> bool {
    match error {
        crate::error::AppError::DatabaseError(sqlx::Error::Database(db)) => {
            matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}
