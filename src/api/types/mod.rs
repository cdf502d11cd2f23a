//! Shared API types: envelopes, errors, extractors

pub mod error;
pub mod json;
pub mod response;
pub mod user;

pub use error::{ApiError, ApiErrorResponse, ErrorCode};
pub use json::Json;
pub use response::{ApiResponse, PaginatedResponse, Pagination};
pub use user::UserResponse;
