//! Tag endpoints. Plain CRUD scoped to the caller; the owning user is always
//! the caller, whatever the payload says.
//! - `GET    /api/v1/tags`       → list
//! - `POST   /api/v1/tags`       → create (201, 409 on duplicate title)
//! - `GET    /api/v1/tags/{id}`  → detail
//! - `PUT    /api/v1/tags/{id}`  → rename
//! - `PATCH  /api/v1/tags/{id}`  → rename
//! - `DELETE /api/v1/tags/{id}`  → delete (204), detaching it from tasks

use crate::{db, error::AppError, middleware::auth::AuthUser, models::*, routes::tasks::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

pub async fn list_tags(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Tag>>, AppError> {
    let tags = db::list_tags(&state.pool, &auth_user.user_id).await?;
    Ok(Json(tags))
}

pub async fn create_tag(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    let title = match req.title.as_deref() {
        Some(title) if !title.trim().is_empty() => title,
        _ => return Err(AppError::BadRequest("Title is required".to_string())),
    };
    if title.chars().count() > 100 {
        return Err(AppError::BadRequest(
            "Title must be at most 100 characters".to_string(),
        ));
    }

    let tag = db::create_tag(&state.pool, &auth_user.user_id, title).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn get_tag(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Tag>, AppError> {
    let tag = db::get_tag(&state.pool, &auth_user.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(tag))
}

pub async fn update_tag(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateTagRequest>,
) -> Result<Json<Tag>, AppError> {
    if let Some(title) = req.title.as_deref() {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("Title must not be empty".to_string()));
        }
        if title.chars().count() > 100 {
            return Err(AppError::BadRequest(
                "Title must be at most 100 characters".to_string(),
            ));
        }
    }

    let tag = db::update_tag(&state.pool, &auth_user.user_id, &id, &req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(tag))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let deleted = db::delete_tag(&state.pool, &auth_user.user_id, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
