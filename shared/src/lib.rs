//! Shared types for the storefront workspace
//!
//! Error codes and the API envelope, pagination, domain models and
//! id/time utilities used by the server and its tests.

pub mod error;
pub mod models;
pub mod response;
pub mod util;

// Re-exports
pub use axum::Json;
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use response::{PageQuery, PaginatedResponse, Pagination};
