//! User management API endpoints
//!
//! All routes require an authenticated user. `/profile` is registered before
//! `/{id}` so the literal segment is never parsed as an id.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResponse, Json, PaginatedResponse, Pagination, UserResponse};
use crate::domain::user::{ListUsersParams, Role, UserId};
use crate::infrastructure::user::service::UserChanges;

const MAX_PAGE_SIZE: u32 = 100;

/// Create the user management router
pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/profile", get(profile))
        .route(
            "/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// User creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub name: String,
    pub role: Option<Role>,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Partial update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: Option<String>,
}

/// List query parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListUsersQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl Default for ListUsersQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            role: None,
            is_active: None,
        }
    }
}

impl ListUsersQuery {
    fn into_params(self) -> ListUsersParams {
        ListUsersParams {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
            search: self.search.filter(|s| !s.trim().is_empty()),
            role: self.role,
            is_active: self.is_active,
        }
    }
}

fn parse_user_id(id: &str) -> Result<UserId, ApiError> {
    UserId::parse(id).map_err(|_| ApiError::validation(format!("Invalid user id: '{}'", id)))
}

/// Create a user
///
/// POST /users
pub async fn create_user(
    _auth: RequireUser,
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, ApiResponse<UserResponse>), ApiError> {
    request.validate()?;

    let user = state
        .user_service
        .create(
            &request.email,
            &request.name,
            request.role.unwrap_or_default(),
            request.password.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new("User created successfully", UserResponse::from_user(&user)),
    ))
}

/// List users with filters and pagination
///
/// GET /users
pub async fn list_users(
    _auth: RequireUser,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<PaginatedResponse<UserResponse>, ApiError> {
    let params = query.into_params();
    let page = state.user_service.list(&params).await?;

    let users = page.users.iter().map(UserResponse::from_user).collect();
    let pagination = Pagination::new(params.page, params.limit, page.total);

    Ok(PaginatedResponse::new(
        "Users retrieved successfully",
        users,
        pagination,
    ))
}

/// Get the authenticated user's own profile
///
/// GET /users/profile
pub async fn profile(RequireUser(user): RequireUser) -> ApiResponse<UserResponse> {
    ApiResponse::new(
        "Profile retrieved successfully",
        UserResponse::from_user(&user),
    )
}

/// Get a user by id
///
/// GET /users/{id}
pub async fn get_user(
    _auth: RequireUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let user = state.user_service.get(parse_user_id(&id)?).await?;

    Ok(ApiResponse::new(
        "User retrieved successfully",
        UserResponse::from_user(&user),
    ))
}

/// Partially update a user
///
/// PATCH /users/{id}
pub async fn update_user(
    _auth: RequireUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    request.validate()?;

    let changes = UserChanges {
        email: request.email,
        name: request.name,
        role: request.role,
        is_active: request.is_active,
        password: request.password,
    };

    let user = state
        .user_service
        .update(parse_user_id(&id)?, changes)
        .await?;

    Ok(ApiResponse::new(
        "User updated successfully",
        UserResponse::from_user(&user),
    ))
}

/// Delete a user
///
/// DELETE /users/{id}
pub async fn delete_user(
    _auth: RequireUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    state.user_service.delete(parse_user_id(&id)?).await?;

    Ok(ApiResponse::message("User deleted successfully"))
}
