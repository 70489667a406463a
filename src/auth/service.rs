use sqlx::PgPool;
use tracing::{info, warn};

use super::dto::{AuthResponse, AuthUserData};
use super::jwt::JwtKeys;
use super::password::verify_password;
use crate::error::ApiError;
use crate::users::repo::{self, User};

const LOGIN_PATH: &str = "/auth/login";

/// Identical wording for unknown email and wrong password; a differing
/// message would let callers enumerate registered addresses.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    keys: JwtKeys,
}

impl From<User> for AuthUserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            status: user.status,
            profile_image: user.profile_image,
        }
    }
}

impl AuthService {
    pub fn new(db: PgPool, keys: JwtKeys) -> Self {
        Self { db, keys }
    }

    /// Checks the supplied credentials and issues an access token.
    ///
    /// This is the only flow that reads the stored password hash; the
    /// returned view never contains it.
    pub async fn validate_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let email = email.trim().to_lowercase();

        let user = repo::find_by_email(&self.db, &email)
            .await
            .map_err(|e| ApiError::internal("Failed to look up user", e).at(LOGIN_PATH))?;

        let Some(user) = user else {
            warn!(email = %email, "login with unknown email");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS).at(LOGIN_PATH));
        };

        let ok = verify_password(password, &user.password_hash)
            .map_err(|e| ApiError::internal("Failed to verify credentials", e).at(LOGIN_PATH))?;
        if !ok {
            warn!(user_id = user.id, "login with invalid password");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS).at(LOGIN_PATH));
        }

        let access_token = self
            .keys
            .sign(user.id, &user.email, user.name.as_deref())
            .map_err(|e| ApiError::internal("Failed to issue token", e).at(LOGIN_PATH))?;

        info!(user_id = user.id, "user logged in");
        Ok(AuthResponse {
            user: user.into(),
            access_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn sample_user() -> User {
        User {
            id: 7,
            name: Some("Alice".into()),
            email: "a@b.com".into(),
            status: "active".into(),
            profile_image: None,
            password_hash: "$argon2id$fake".into(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn auth_user_data_drops_password_hash() {
        let data = AuthUserData::from(sample_user());
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["email"], "a@b.com");
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
    }
}
