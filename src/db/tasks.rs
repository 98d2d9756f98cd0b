//! Task queries. Every function takes the owning user's id and scopes the
//! statement with it, so a task belonging to someone else behaves exactly
//! like a task that does not exist.

use chrono::{Duration, NaiveDate};

use crate::error::AppError;
use crate::models::*;
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};

/// Format used both by the strftime('%Y-%m-%dT%H:%M:%fZ') column default and
/// by the bounds we bind for date filtering, so string comparison orders the
/// same way the timestamps do.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const TASK_COLUMNS: &str = "t.id, t.user_id, t.title, t.description, t.is_completed, t.created_at";

/// Takes any executor so it works both standalone and inside a write
/// transaction.
pub async fn get_task<'a, E>(executor: E, user_id: &str, id: &str) -> Result<Option<Task>, AppError>
where
    E: Executor<'a, Database = Sqlite>,
{
    let task = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, user_id, title, description, is_completed, created_at
        FROM tasks
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(task)
}

/// List the user's tasks with the recognized filters AND-composed on top of
/// the user scope. Default ordering is newest first.
pub async fn list_tasks(
    pool: &SqlitePool,
    user_id: &str,
    query: &TaskListQuery,
) -> Result<Vec<Task>, AppError> {
    let mut sql = format!("SELECT DISTINCT {} FROM tasks t", TASK_COLUMNS);
    let mut bindings: Vec<String> = Vec::new();

    if query.tags__title.is_some() {
        sql.push_str(" JOIN task_tags tt ON tt.task_id = t.id JOIN tags g ON g.id = tt.tag_id");
    }

    sql.push_str(" WHERE t.user_id = ?");
    bindings.push(user_id.to_string());

    if let Some(tag_title) = &query.tags__title {
        sql.push_str(" AND g.title = ?");
        bindings.push(tag_title.clone());
    }

    if let Some(is_completed) = query.is_completed {
        sql.push_str(" AND t.is_completed = ?");
        bindings.push(if is_completed { "1" } else { "0" }.to_string());
    }

    if let Some(date) = query.created_at {
        // Calendar date expands to the half-open UTC interval
        // [midnight, midnight + 24h); midnight of the next day is excluded.
        let (start, end) = day_bounds(date);
        sql.push_str(" AND t.created_at >= ? AND t.created_at < ?");
        bindings.push(start);
        bindings.push(end);
    }

    if let Some(term) = query.search.as_deref().filter(|t| !t.is_empty()) {
        sql.push_str(" AND (t.title LIKE ? ESCAPE '\\' OR t.description LIKE ? ESCAPE '\\')");
        let pattern = format!("%{}%", escape_like(term));
        bindings.push(pattern.clone());
        bindings.push(pattern);
    }

    sql.push_str(" ORDER BY ");
    sql.push_str(order_clause(query.ordering.as_deref()));

    let mut q = sqlx::query_as::<_, Task>(&sql);
    for binding in &bindings {
        q = q.bind(binding.as_str());
    }

    Ok(q.fetch_all(pool).await?)
}

/// Runs on a connection so the caller can keep the insert and the tag
/// attachment in one transaction.
pub async fn create_task(
    conn: &mut SqliteConnection,
    user_id: &str,
    title: &str,
    description: &str,
) -> Result<Task, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO tasks (id, user_id, title, description)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(title)
    .bind(description)
    .execute(&mut *conn)
    .await?;

    get_task(&mut *conn, user_id, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created task".to_string()))
}

/// Partial update of title / description / is_completed. The tag set is
/// handled separately by the tag resolver, on the same transaction.
/// `created_at` is immutable.
pub async fn update_task(
    conn: &mut SqliteConnection,
    user_id: &str,
    id: &str,
    req: &UpdateTaskRequest,
) -> Result<Option<Task>, AppError> {
    if get_task(&mut *conn, user_id, id).await?.is_none() {
        return Ok(None);
    }

    let mut assignments = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(title) = &req.title {
        assignments.push("title = ?");
        bindings.push(title.clone());
    }

    if let Some(description) = &req.description {
        assignments.push("description = ?");
        bindings.push(description.clone());
    }

    if let Some(is_completed) = req.is_completed {
        assignments.push("is_completed = ?");
        bindings.push(if is_completed { "1" } else { "0" }.to_string());
    }

    if !assignments.is_empty() {
        let sql = format!(
            "UPDATE tasks SET {} WHERE id = ? AND user_id = ?",
            assignments.join(", ")
        );
        bindings.push(id.to_string());
        bindings.push(user_id.to_string());

        let mut q = sqlx::query(&sql);
        for binding in &bindings {
            q = q.bind(binding.as_str());
        }
        q.execute(&mut *conn).await?;
    }

    get_task(conn, user_id, id).await
}

pub async fn delete_task(pool: &SqlitePool, user_id: &str, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Flip `is_completed` and return the new value, or None when the task is
/// missing or not owned by the caller.
pub async fn toggle_task_completed(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<bool>, AppError> {
    let task = match get_task(pool, user_id, id).await? {
        Some(task) => task,
        None => return Ok(None),
    };

    let new_state = !task.is_completed;
    sqlx::query("UPDATE tasks SET is_completed = ? WHERE id = ? AND user_id = ?")
        .bind(new_state)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(Some(new_state))
}

/// Titles of the tags attached to a task, alphabetical.
pub async fn task_tag_titles(pool: &SqlitePool, task_id: &str) -> Result<Vec<String>, AppError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT g.title
        FROM tags g
        JOIN task_tags tt ON tt.tag_id = g.id
        WHERE tt.task_id = ?
        ORDER BY g.title
        "#,
    )
    .bind(task_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(title,)| title).collect())
}

/// Ordering values are whitelisted; anything unrecognized falls back to the
/// default (newest first).
fn order_clause(ordering: Option<&str>) -> &'static str {
    match ordering {
        Some("created_at") => "t.created_at ASC",
        Some("title") => "t.title ASC",
        Some("-title") => "t.title DESC",
        Some("is_completed") => "t.is_completed ASC",
        Some("-is_completed") => "t.is_completed DESC",
        _ => "t.created_at DESC",
    }
}

fn day_bounds(date: NaiveDate) -> (String, String) {
    let start = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end = start + Duration::days(1);
    (
        start.format(TIMESTAMP_FORMAT).to_string(),
        end.format(TIMESTAMP_FORMAT).to_string(),
    )
}

/// Escape LIKE wildcards so the search term is matched literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("50%_done"), "50\\%\\_done");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn day_bounds_form_half_open_interval() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 12).unwrap();
        let (start, end) = day_bounds(date);
        assert_eq!(start, "2024-09-12T00:00:00.000Z");
        assert_eq!(end, "2024-09-13T00:00:00.000Z");
        // A timestamp at 23:59:59 of the day sorts inside the interval,
        // midnight of the next day does not.
        assert!("2024-09-12T23:59:59.000Z" < end.as_str());
        assert!(!("2024-09-13T00:00:00.000Z" < end.as_str()));
    }

    #[test]
    fn unrecognized_ordering_falls_back_to_default() {
        assert_eq!(order_clause(None), "t.created_at DESC");
        assert_eq!(order_clause(Some("user_id")), "t.created_at DESC");
        assert_eq!(order_clause(Some("title")), "t.title ASC");
        assert_eq!(order_clause(Some("-is_completed")), "t.is_completed DESC");
    }
}
