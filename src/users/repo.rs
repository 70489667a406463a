use sqlx::PgPool;
use time::OffsetDateTime;

use super::dto::UserView;
use crate::auth::dto::Identity;

/// Full user row, including the password hash. Intentionally not
/// serializable; callers project into [`UserView`] or
/// [`crate::auth::dto::AuthUserData`] before anything leaves the process.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub status: String,
    pub profile_image: Option<String>,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const VIEW_COLUMNS: &str = "id, name, email, status, profile_image, created_at, updated_at";

pub async fn insert(
    db: &PgPool,
    name: Option<&str>,
    email: &str,
    status: &str,
    profile_image: Option<&str>,
    password_hash: &str,
) -> sqlx::Result<UserView> {
    sqlx::query_as::<_, UserView>(&format!(
        r#"
        INSERT INTO users (name, email, status, profile_image, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {VIEW_COLUMNS}
        "#
    ))
    .bind(name)
    .bind(email)
    .bind(status)
    .bind(profile_image)
    .bind(password_hash)
    .fetch_one(db)
    .await
}

pub async fn list(db: &PgPool) -> sqlx::Result<Vec<UserView>> {
    sqlx::query_as::<_, UserView>(&format!(
        r#"SELECT {VIEW_COLUMNS} FROM users ORDER BY id ASC"#
    ))
    .fetch_all(db)
    .await
}

pub async fn find_view(db: &PgPool, id: i64) -> sqlx::Result<Option<UserView>> {
    sqlx::query_as::<_, UserView>(&format!(
        r#"SELECT {VIEW_COLUMNS} FROM users WHERE id = $1"#
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Full row by id, hash included; used by the read-modify-write update path.
pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, status, profile_image, password_hash, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Full row by email, hash included; used only by credential verification.
pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, status, profile_image, password_hash, created_at, updated_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn email_exists(db: &PgPool, email: &str) -> sqlx::Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as(r#"SELECT id FROM users WHERE email = $1"#)
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(row.is_some())
}

/// Writes a merged row back and refreshes `updated_at`.
pub async fn update_row(db: &PgPool, user: &User) -> sqlx::Result<UserView> {
    sqlx::query_as::<_, UserView>(&format!(
        r#"
        UPDATE users
        SET name = $2, email = $3, status = $4, profile_image = $5,
            password_hash = $6, updated_at = now()
        WHERE id = $1
        RETURNING {VIEW_COLUMNS}
        "#
    ))
    .bind(user.id)
    .bind(user.name.as_deref())
    .bind(&user.email)
    .bind(&user.status)
    .bind(user.profile_image.as_deref())
    .bind(&user.password_hash)
    .fetch_one(db)
    .await
}

/// Hard delete; returns the number of rows removed.
pub async fn delete(db: &PgPool, id: i64) -> sqlx::Result<u64> {
    let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Minimal identity for the access guard.
pub async fn find_identity(db: &PgPool, id: i64) -> sqlx::Result<Option<Identity>> {
    sqlx::query_as::<_, Identity>(r#"SELECT id, email, name, status FROM users WHERE id = $1"#)
        .bind(id)
        .fetch_optional(db)
        .await
}

/// True for the Postgres unique-constraint violation; the constraint is the
/// real duplicate-email guarantee, the service pre-check only narrows the
/// race window.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
