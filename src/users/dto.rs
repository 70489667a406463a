use serde::Serialize;
use time::OffsetDateTime;

/// The only serializable shape of a user record. The full row type in
/// `repo` deliberately has no `Serialize` impl, so the stored password
/// hash cannot leak through any response path.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub status: String,
    pub profile_image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Input for user creation, assembled from the multipart form.
#[derive(Debug, Default, Clone)]
pub struct CreateUser {
    pub name: Option<String>,
    pub email: String,
    pub status: Option<String>,
    pub password: String,
    pub profile_image: Option<String>,
}

/// Partial update; only supplied fields are written back.
#[derive(Debug, Default, Clone)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub password: Option<String>,
    pub profile_image: Option<String>,
}
