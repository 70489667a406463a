use serde::{Deserialize, Serialize};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password-free view of the user returned on login.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserData {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub status: String,
    pub profile_image: Option<String>,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: AuthUserData,
    pub access_token: String,
}

/// Minimal identity attached to every guarded request, re-fetched from the
/// store rather than trusted from stale claims.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_user_data_serializes_camel_case_without_password() {
        let user = AuthUserData {
            id: 1,
            email: "a@b.com".into(),
            name: None,
            status: "active".into(),
            profile_image: Some("/public/uploads/images/1-x.jpg".into()),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("profileImage"));
        assert!(!json.to_lowercase().contains("password"));
    }
}
