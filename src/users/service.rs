use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

use super::dto::{CreateUser, UpdateUser, UserView};
use super::repo::{self, is_unique_violation};
use crate::auth::password::hash_password;
use crate::error::ApiError;

const BASE_PATH: &str = "/users";
const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Strips scheme and host from a full URL, keeping only the path. Values
/// that are not URLs (already-relative paths, opaque strings) pass through
/// unchanged.
pub(crate) fn normalize_image_path(value: &str) -> String {
    let rest = match value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"))
    {
        Some(rest) => rest,
        None => return value.to_string(),
    };
    let path = match rest.find('/') {
        Some(idx) => &rest[idx..],
        // URL with no path component; nothing usable to extract
        None => return value.to_string(),
    };
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.to_string()
}

#[derive(Clone)]
pub struct UsersService {
    db: PgPool,
}

impl UsersService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, mut input: CreateUser) -> Result<UserView, ApiError> {
        input.email = input.email.trim().to_lowercase();

        if !is_valid_email(&input.email) {
            warn!(email = %input.email, "invalid email");
            return Err(ApiError::validation("Invalid email").at(BASE_PATH));
        }
        if input.password.len() < MIN_PASSWORD_LEN {
            warn!("password too short");
            return Err(ApiError::validation("Password too short").at(BASE_PATH));
        }

        // Best-effort pre-check; concurrent creates are caught below by the
        // unique constraint.
        let taken = repo::email_exists(&self.db, &input.email)
            .await
            .map_err(|e| ApiError::internal("Failed to create user", e).at(BASE_PATH))?;
        if taken {
            warn!(email = %input.email, "email already registered");
            return Err(ApiError::conflict("Email already registered").at(BASE_PATH));
        }

        let hash = hash_password(&input.password)
            .map_err(|e| ApiError::internal("Failed to create user", e).at(BASE_PATH))?;

        let view = repo::insert(
            &self.db,
            input.name.as_deref(),
            &input.email,
            input.status.as_deref().unwrap_or("active"),
            input.profile_image.as_deref(),
            &hash,
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("Email already registered").at(BASE_PATH)
            } else {
                ApiError::internal("Failed to create user", e).at(BASE_PATH)
            }
        })?;

        info!(user_id = view.id, email = %view.email, "user created");
        Ok(view)
    }

    pub async fn find_all(&self) -> Result<Vec<UserView>, ApiError> {
        repo::list(&self.db)
            .await
            .map_err(|e| ApiError::internal("Failed to retrieve users", e).at(BASE_PATH))
    }

    pub async fn find_one(&self, id: i64) -> Result<UserView, ApiError> {
        let path = format!("{BASE_PATH}/{id}");
        repo::find_view(&self.db, id)
            .await
            .map_err(|e| ApiError::internal("Failed to retrieve user", e).at(path.clone()))?
            .ok_or_else(|| ApiError::not_found(format!("User with ID {id} not found")).at(path))
    }

    /// Explicit read-modify-write: fetch the current row, overlay only the
    /// supplied fields, write the merged record back.
    pub async fn update(&self, id: i64, input: UpdateUser) -> Result<UserView, ApiError> {
        let path = format!("{BASE_PATH}/{id}");

        let mut user = repo::find_by_id(&self.db, id)
            .await
            .map_err(|e| ApiError::internal("Failed to update user", e).at(path.clone()))?
            .ok_or_else(|| {
                ApiError::not_found(format!("User with ID {id} not found")).at(path.clone())
            })?;

        if let Some(name) = input.name {
            user.name = Some(name);
        }
        if let Some(email) = input.email {
            let email = email.trim().to_lowercase();
            if !is_valid_email(&email) {
                return Err(ApiError::validation("Invalid email").at(path));
            }
            user.email = email;
        }
        if let Some(status) = input.status {
            user.status = status;
        }
        if let Some(password) = input.password {
            if password.len() < MIN_PASSWORD_LEN {
                return Err(ApiError::validation("Password too short").at(path));
            }
            user.password_hash = hash_password(&password)
                .map_err(|e| ApiError::internal("Failed to update user", e).at(path.clone()))?;
        }
        if let Some(image) = input.profile_image {
            user.profile_image = Some(normalize_image_path(&image));
        }

        let view = repo::update_row(&self.db, &user).await.map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("Email already registered").at(path.clone())
            } else {
                ApiError::internal("Failed to update user", e).at(path.clone())
            }
        })?;

        info!(user_id = id, "user updated");
        Ok(view)
    }

    pub async fn remove(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("{BASE_PATH}/{id}");
        let removed = repo::delete(&self.db, id)
            .await
            .map_err(|e| ApiError::internal("Failed to delete user", e).at(path.clone()))?;
        if removed == 0 {
            return Err(ApiError::not_found(format!("User with ID {id} not found")).at(path));
        }
        info!(user_id = id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("user.name+tag@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn full_url_becomes_relative_path() {
        assert_eq!(
            normalize_image_path("http://localhost:4000/public/uploads/images/7-x.jpg"),
            "/public/uploads/images/7-x.jpg"
        );
        assert_eq!(
            normalize_image_path("https://api.example.com/public/uploads/images/a.png?v=2"),
            "/public/uploads/images/a.png"
        );
    }

    #[test]
    fn relative_path_passes_through() {
        assert_eq!(
            normalize_image_path("/public/uploads/images/7-x.jpg"),
            "/public/uploads/images/7-x.jpg"
        );
        assert_eq!(normalize_image_path("7-x.jpg"), "7-x.jpg");
    }

    #[test]
    fn unparseable_value_falls_back_to_raw() {
        assert_eq!(normalize_image_path("http://hostonly"), "http://hostonly");
        assert_eq!(normalize_image_path("ftp://x/y.jpg"), "ftp://x/y.jpg");
        assert_eq!(normalize_image_path("::garbage::"), "::garbage::");
    }
}
