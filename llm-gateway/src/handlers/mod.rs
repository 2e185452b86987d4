//! HTTP handlers for the gateway.

pub mod health;
pub mod metrics;
pub mod predict;

use service_core::error::AppError;

pub use health::health_check;
pub use predict::predict;

/// Catch-all for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}
