//! Task endpoints, all scoped to the authenticated caller:
//! - `GET    /api/v1/tasks`                      → filtered list
//! - `POST   /api/v1/tasks`                      → create (201)
//! - `GET    /api/v1/tasks/{id}`                 → detail
//! - `PUT    /api/v1/tasks/{id}`                 → update
//! - `PATCH  /api/v1/tasks/{id}`                 → update
//! - `DELETE /api/v1/tasks/{id}`                 → delete (204)
//! - `POST   /api/v1/tasks/{id}/toggle_completed` → flip is_completed
//!
//! A task id belonging to another user is indistinguishable from a missing
//! id: both are 404.

use crate::{db, error::AppError, middleware::auth::AuthUser, models::*};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;

/// Shared application state, injected into every handler via the `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt_secret: String,
}

const MAX_TITLE_LEN: usize = 100;

pub async fn list_tasks(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<TaskResponse>>, AppError> {
    let tasks = db::list_tasks(&state.pool, &auth_user.user_id, &query).await?;

    let mut responses = Vec::with_capacity(tasks.len());
    for task in tasks {
        let tags = db::task_tag_titles(&state.pool, &task.id).await?;
        responses.push(task.into_response(tags));
    }

    Ok(Json(responses))
}

pub async fn create_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), AppError> {
    let title = match req.title.as_deref() {
        Some(title) if !title.trim().is_empty() => title,
        _ => return Err(AppError::BadRequest("Title is required".to_string())),
    };
    validate_title(title)?;

    let tag_titles = req.tags.unwrap_or_default();
    validate_tag_titles(&tag_titles)?;

    // Omitted description is stored as "", never null.
    let description = req.description.as_deref().unwrap_or("");

    // Insert and tag attachment are one transaction; a failure mid-way
    // leaves no tagless task behind.
    let mut tx = state.pool.begin().await?;
    let task = db::create_task(&mut tx, &auth_user.user_id, title, description).await?;
    let tags = db::resolve_tags(&mut tx, &auth_user.user_id, &tag_titles).await?;
    for tag in &tags {
        db::attach_tag(&mut *tx, &task.id, &tag.id).await?;
    }
    tx.commit().await?;

    let tag_titles = db::task_tag_titles(&state.pool, &task.id).await?;
    Ok((StatusCode::CREATED, Json(task.into_response(tag_titles))))
}

pub async fn get_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = db::get_task(&state.pool, &auth_user.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    let tags = db::task_tag_titles(&state.pool, &task.id).await?;
    Ok(Json(task.into_response(tags)))
}

/// PATCH: partial update, every field optional.
pub async fn update_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    apply_task_update(&state, &auth_user.user_id, &id, req).await
}

/// PUT: like PATCH, except `title` is required, matching the stricter
/// contract of a full-resource write.
pub async fn replace_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    if req.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    apply_task_update(&state, &auth_user.user_id, &id, req).await
}

async fn apply_task_update(
    state: &AppState,
    user_id: &str,
    id: &str,
    req: UpdateTaskRequest,
) -> Result<Json<TaskResponse>, AppError> {
    if let Some(title) = req.title.as_deref() {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("Title must not be empty".to_string()));
        }
        validate_title(title)?;
    }

    // A supplied tags list replaces the whole set; an omitted field leaves
    // the existing tags untouched.
    if let Some(tag_titles) = &req.tags {
        validate_tag_titles(tag_titles)?;
    }

    // Field update and tag replacement commit together; the old tag set
    // survives any failure before the commit.
    let mut tx = state.pool.begin().await?;
    let task = db::update_task(&mut tx, user_id, id, &req)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(tag_titles) = &req.tags {
        let tags = db::resolve_tags(&mut tx, user_id, tag_titles).await?;
        db::set_task_tags(&mut tx, &task.id, &tags).await?;
    }
    tx.commit().await?;

    let tags = db::task_tag_titles(&state.pool, &task.id).await?;
    Ok(Json(task.into_response(tags)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let deleted = db::delete_task(&state.pool, &auth_user.user_id, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /tasks/{id}/toggle_completed` always flips; two calls in a row
/// return opposite states.
pub async fn toggle_completed(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let is_completed = db::toggle_task_completed(&state.pool, &auth_user.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(json!({
        "status": "task updated",
        "is_completed": is_completed
    })))
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(
            "Title must be at most 100 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_tag_titles(titles: &[String]) -> Result<(), AppError> {
    for title in titles {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Tag titles must not be empty".to_string(),
            ));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::BadRequest(
                "Tag titles must be at most 100 characters".to_string(),
            ));
        }
    }
    Ok(())
}
