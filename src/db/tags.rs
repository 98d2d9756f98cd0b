//! Tag queries, including the get-or-create resolver used on task writes.
//! Tags are unique per (user, title); the UNIQUE constraint in the schema is
//! what makes the resolver race-safe.

use crate::error::AppError;
use crate::models::*;
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};

pub async fn list_tags(pool: &SqlitePool, user_id: &str) -> Result<Vec<Tag>, AppError> {
    let tags = sqlx::query_as::<_, Tag>(
        "SELECT id, title FROM tags WHERE user_id = ? ORDER BY title",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

pub async fn get_tag(pool: &SqlitePool, user_id: &str, id: &str) -> Result<Option<Tag>, AppError> {
    let tag = sqlx::query_as::<_, Tag>(
        "SELECT id, title FROM tags WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(tag)
}

async fn find_by_title<'a, E>(
    executor: E,
    user_id: &str,
    title: &str,
) -> Result<Option<Tag>, AppError>
where
    E: Executor<'a, Database = Sqlite>,
{
    let tag = sqlx::query_as::<_, Tag>(
        "SELECT id, title FROM tags WHERE user_id = ? AND title = ?",
    )
    .bind(user_id)
    .bind(title)
    .fetch_optional(executor)
    .await?;

    Ok(tag)
}

/// Direct creation through the tags endpoint. A duplicate title within the
/// user's scope is a 409.
pub async fn create_tag(pool: &SqlitePool, user_id: &str, title: &str) -> Result<Tag, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    let result = sqlx::query("INSERT INTO tags (id, user_id, title) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .execute(pool)
        .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict("Tag already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    get_tag(pool, user_id, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created tag".to_string()))
}

/// Look up a tag by title within the user's scope, creating it when absent.
/// Two requests racing on the same new title both succeed: the INSERT loser
/// hits the UNIQUE constraint and falls back to the winner's row.
pub async fn get_or_create_tag(
    conn: &mut SqliteConnection,
    user_id: &str,
    title: &str,
) -> Result<Tag, AppError> {
    if let Some(tag) = find_by_title(&mut *conn, user_id, title).await? {
        return Ok(tag);
    }

    let id = uuid::Uuid::now_v7().to_string();
    let result = sqlx::query("INSERT INTO tags (id, user_id, title) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .execute(&mut *conn)
        .await;

    match result {
        Ok(_) => Ok(Tag {
            id,
            title: title.to_string(),
        }),
        Err(e) if is_unique_violation(&e) => find_by_title(conn, user_id, title)
            .await?
            .ok_or(AppError::Internal("Tag vanished after unique violation".to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Resolve a list of submitted tag titles into tag rows, deduplicating while
/// preserving first-seen order. Resubmitting an existing title never creates
/// a second row.
pub async fn resolve_tags(
    conn: &mut SqliteConnection,
    user_id: &str,
    titles: &[String],
) -> Result<Vec<Tag>, AppError> {
    let mut seen: Vec<&str> = Vec::new();
    let mut tags = Vec::new();

    for title in titles {
        if seen.contains(&title.as_str()) {
            continue;
        }
        seen.push(title.as_str());
        tags.push(get_or_create_tag(&mut *conn, user_id, title).await?);
    }

    Ok(tags)
}

/// Replace a task's entire tag set: clear the join rows, then attach. Runs
/// on the caller's transaction so a failed attach rolls the clear back too.
pub async fn set_task_tags(
    conn: &mut SqliteConnection,
    task_id: &str,
    tags: &[Tag],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM task_tags WHERE task_id = ?")
        .bind(task_id)
        .execute(&mut *conn)
        .await?;

    for tag in tags {
        attach_tag(&mut *conn, task_id, &tag.id).await?;
    }

    Ok(())
}

pub async fn attach_tag<'a, E>(executor: E, task_id: &str, tag_id: &str) -> Result<(), AppError>
where
    E: Executor<'a, Database = Sqlite>,
{
    sqlx::query("INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?, ?)")
        .bind(task_id)
        .bind(tag_id)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn update_tag(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    req: &UpdateTagRequest,
) -> Result<Option<Tag>, AppError> {
    if get_tag(pool, user_id, id).await?.is_none() {
        return Ok(None);
    }

    if let Some(title) = &req.title {
        let result = sqlx::query("UPDATE tags SET title = ? WHERE id = ? AND user_id = ?")
            .bind(title)
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict("Tag already exists".to_string()));
            }
            Err(e) => return Err(e.into()),
        }
    }

    get_tag(pool, user_id, id).await
}

/// Deleting a tag detaches it from every task (join rows cascade); the tasks
/// themselves survive.
pub async fn delete_tag(pool: &SqlitePool, user_id: &str, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
