use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CreateUser, UpdateUser, UserView};
use crate::auth::extractors::AuthUser;
use crate::media::store::{ext_from_filename, ext_from_mime};
use crate::{error::ApiError, response::ApiResponse, state::AppState};

const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;
const UPLOADS_PREFIX: &str = "/public/uploads/images";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create).get(find_all))
        .route(
            "/users/:id",
            get(find_one).patch(update).put(update).delete(remove),
        )
        .route("/users/:id/profile-image", post(upload_profile_image))
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
}

/// POST /users — public; multipart with user fields and an optional
/// `profileImage` file.
#[instrument(skip(state, mp))]
pub async fn create(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UserView>>), ApiError> {
    let mut input = CreateUser::default();
    let mut upload: Option<(&'static str, Bytes)> = None;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart body").at("/users"))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("name") => input.name = Some(read_text(field, "/users").await?),
            Some("email") => input.email = read_text(field, "/users").await?,
            Some("status") => input.status = Some(read_text(field, "/users").await?),
            Some("password") => input.password = read_text(field, "/users").await?,
            Some("profileImage") => {
                if field.file_name().is_some() {
                    upload = Some(read_image(field, "/users").await?);
                } else {
                    input.profile_image = Some(read_text(field, "/users").await?);
                }
            }
            _ => {}
        }
    }

    if let Some((ext, body)) = upload {
        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        state
            .media
            .save(&filename, body)
            .await
            .map_err(|e| ApiError::internal("Failed to store image", e).at("/users"))?;
        input.profile_image = Some(format!("{UPLOADS_PREFIX}/{filename}"));
    }

    let view = state.users.create(input).await?;
    let body = ApiResponse::success(
        view,
        "User created successfully",
        "/users",
        StatusCode::CREATED,
    );
    Ok((StatusCode::CREATED, Json(body)))
}

#[instrument(skip(state))]
pub async fn find_all(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
) -> Result<Json<ApiResponse<Vec<UserView>>>, ApiError> {
    let users = state.users.find_all().await?;
    Ok(Json(ApiResponse::success(
        users,
        "Users retrieved successfully",
        "/users",
        StatusCode::OK,
    )))
}

#[instrument(skip(state))]
pub async fn find_one(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserView>>, ApiError> {
    let user = state.users.find_one(id).await?;
    Ok(Json(ApiResponse::success(
        user,
        "User retrieved successfully",
        &format!("/users/{id}"),
        StatusCode::OK,
    )))
}

/// PATCH/PUT /users/:id — partial update; `profileImage` may arrive as a
/// file upload or as a text value (URL or path).
#[instrument(skip(state, mp))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
    mut mp: Multipart,
) -> Result<Json<ApiResponse<UserView>>, ApiError> {
    let path = format!("/users/{id}");
    check_ownership(identity.id, id, &path)?;

    let mut input = UpdateUser::default();
    let mut upload: Option<(&'static str, Bytes)> = None;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart body").at(path.clone()))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("name") => input.name = Some(read_text(field, &path).await?),
            Some("email") => input.email = Some(read_text(field, &path).await?),
            Some("status") => input.status = Some(read_text(field, &path).await?),
            Some("password") => input.password = Some(read_text(field, &path).await?),
            Some("profileImage") => {
                if field.file_name().is_some() {
                    upload = Some(read_image(field, &path).await?);
                } else {
                    input.profile_image = Some(read_text(field, &path).await?);
                }
            }
            _ => {}
        }
    }

    if let Some((ext, body)) = upload {
        input.profile_image = Some(store_user_image(&state, id, ext, body, &path).await?);
    }

    let view = state.users.update(id, input).await?;
    Ok(Json(ApiResponse::success(
        view,
        "User updated successfully",
        &path,
        StatusCode::OK,
    )))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let path = format!("/users/{id}");
    check_ownership(identity.id, id, &path)?;
    state.users.remove(id).await?;
    Ok(Json(ApiResponse::empty(
        "User deleted successfully",
        &path,
        StatusCode::OK,
    )))
}

/// POST /users/:id/profile-image — dedicated image upload, field `image`.
#[instrument(skip(state, mp))]
pub async fn upload_profile_image(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
    mut mp: Multipart,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let path = format!("/users/{id}/profile-image");
    check_ownership(identity.id, id, &path)?;

    let mut upload: Option<(&'static str, Bytes)> = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart body").at(path.clone()))?
    {
        if field.name() == Some("image") {
            upload = Some(read_image(field, &path).await?);
        }
    }
    let (ext, body) =
        upload.ok_or_else(|| ApiError::validation("image field is required").at(path.clone()))?;

    let image_url = store_user_image(&state, id, ext, body, &path).await?;
    state
        .users
        .update(
            id,
            UpdateUser {
                profile_image: Some(image_url.clone()),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(
        serde_json::json!({ "imageUrl": image_url }),
        "Profile image uploaded successfully",
        &path,
        StatusCode::OK,
    )))
}

fn check_ownership(actor_id: i64, target_id: i64, path: &str) -> Result<(), ApiError> {
    if actor_id != target_id {
        return Err(ApiError::forbidden("You can only modify your own profile").at(path));
    }
    Ok(())
}

async fn read_text(field: Field<'_>, path: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart body").at(path))
}

/// Validates an uploaded image field: png/jpeg only, max 2 MiB.
async fn read_image(field: Field<'_>, path: &str) -> Result<(&'static str, Bytes), ApiError> {
    let content_type = field.content_type().map(|s| s.to_string());
    let file_name = field.file_name().map(|s| s.to_string());

    let ext = content_type
        .as_deref()
        .and_then(ext_from_mime)
        .or_else(|| file_name.as_deref().and_then(ext_from_filename))
        .ok_or_else(|| ApiError::validation("Only image files are allowed").at(path))?;

    let body = field
        .bytes()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart body").at(path))?;
    if body.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::validation("Image too large (max 2MB)").at(path));
    }
    Ok((ext, body))
}

async fn store_user_image(
    state: &AppState,
    user_id: i64,
    ext: &str,
    body: Bytes,
    path: &str,
) -> Result<String, ApiError> {
    let filename = format!("{}-{}.{}", user_id, Uuid::new_v4(), ext);
    state
        .media
        .save(&filename, body)
        .await
        .map_err(|e| ApiError::internal("Failed to store image", e).at(path))?;
    Ok(format!("{UPLOADS_PREFIX}/{filename}"))
}
