//! Response envelope shared by every endpoint

use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::json::Json;

/// Standard success envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Envelope with a message and no payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Page window metadata, camelCase on the wire
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub previous_page: Option<u32>,
    pub next_page: Option<u32>,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total_items: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total_items.div_ceil(limit as u64) as u32
        };

        let has_previous_page = page > 1;
        let has_next_page = (page as u64) * (limit as u64) < total_items;

        Self {
            page,
            limit,
            total_items,
            total_pages,
            has_previous_page,
            has_next_page,
            previous_page: has_previous_page.then(|| page - 1),
            next_page: has_next_page.then(|| page + 1),
        }
    }
}

/// Success envelope for list endpoints
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(message: impl Into<String>, data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            pagination,
        }
    }
}

impl<T: Serialize> IntoResponse for PaginatedResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
