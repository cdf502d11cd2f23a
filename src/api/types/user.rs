//! User payloads exposed over the wire

use serde::Serialize;

use crate::domain::user::{Role, User};

/// User representation safe to expose, camelCase on the wire
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_string(),
            name: user.name().to_string(),
            role: user.role(),
            is_active: user.is_active(),
            email_verified: user.email_verified(),
            created_at: user.created_at().to_rfc3339(),
            updated_at: user.updated_at().to_rfc3339(),
            last_login_at: user.last_login_at().map(|t| t.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_has_no_password_material() {
        let user = User::new(
            "a@example.com",
            Some("$argon2id$secret".to_string()),
            "Alice",
            Role::User,
        );

        let json = serde_json::to_string(&UserResponse::from_user(&user)).unwrap();

        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"isActive\":true"));
        assert!(json.contains("\"emailVerified\":false"));
    }

    #[test]
    fn test_absent_last_login_is_omitted() {
        let user = User::new("a@example.com", None, "Alice", Role::User);
        let json = serde_json::to_string(&UserResponse::from_user(&user)).unwrap();

        assert!(!json.contains("lastLoginAt"));
    }
}
