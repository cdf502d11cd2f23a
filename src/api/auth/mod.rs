//! Authentication API endpoints
//!
//! Registration, login, token refresh and logout. Every success payload is
//! wrapped in the standard envelope; token pairs ride in `data`.

use axum::{extract::State, http::StatusCode, routing::post, Router};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResponse, Json, UserResponse};
use crate::infrastructure::auth::service::AuthTokens;

/// Create the authentication router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

/// Refresh and logout request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub refresh_token: String,
}

/// Token pair payload, camelCase on the wire
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthData {
    fn from_tokens(tokens: &AuthTokens) -> Self {
        Self {
            user: UserResponse::from_user(&tokens.user),
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
        }
    }
}

/// Register a new account
///
/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<AuthData>), ApiError> {
    request.validate()?;

    let tokens = state
        .auth_service
        .register(&request.email, &request.password, &request.name)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new("User registered successfully", AuthData::from_tokens(&tokens)),
    ))
}

/// Login with email and password
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<ApiResponse<AuthData>, ApiError> {
    request.validate()?;

    let tokens = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;

    Ok(ApiResponse::new(
        "Login successful",
        AuthData::from_tokens(&tokens),
    ))
}

/// Exchange a refresh token for a new pair
///
/// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<ApiResponse<AuthData>, ApiError> {
    request.validate()?;

    let tokens = state.auth_service.refresh(&request.refresh_token).await?;

    Ok(ApiResponse::new(
        "Token refreshed successfully",
        AuthData::from_tokens(&tokens),
    ))
}

/// Invalidate a refresh token
///
/// POST /auth/logout
///
/// Succeeds even when the token is unknown or already revoked.
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    request.validate()?;

    state.auth_service.logout(&request.refresh_token).await?;

    Ok(ApiResponse::message("Logged out successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            email: "a@example.com".to_string(),
            password: "Passw0rd".to_string(),
            name: "Alice".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "Passw0rd".to_string(),
            name: "Alice".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            email: "a@example.com".to_string(),
            password: "short".to_string(),
            name: "Alice".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_validation_errors_become_details() {
        let request = RegisterRequest {
            email: "nope".to_string(),
            password: "x".to_string(),
            name: "a".to_string(),
        };

        let err: ApiError = request.validate().unwrap_err().into();
        let details = err.response.error.details.unwrap();
        assert_eq!(details.len(), 3);
    }

    #[test]
    fn test_auth_data_is_camel_case() {
        use crate::domain::user::{Role, User};

        let user = User::new("a@example.com", None, "Alice", Role::User);
        let data = AuthData {
            user: UserResponse::from_user(&user),
            access_token: "acc".to_string(),
            refresh_token: "ref".to_string(),
        };

        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"accessToken\":\"acc\""));
        assert!(json.contains("\"refreshToken\":\"ref\""));
    }
}
