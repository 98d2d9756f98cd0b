use serde::{Deserialize, Serialize};

/// A row of the `tasks` table. `created_at` is an RFC3339 UTC string as
/// written by SQLite's strftime default.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub created_at: String,
}

/// API representation of a task. Tags are surfaced as plain title strings.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub is_completed: bool,
    pub tags: Vec<String>,
}

impl Task {
    pub fn into_response(self, tags: Vec<String>) -> TaskResponse {
        TaskResponse {
            id: self.id,
            title: self.title,
            description: self.description,
            created_at: self.created_at,
            is_completed: self.is_completed,
            tags,
        }
    }
}

/// `title` is Option so a missing field reaches the handler and comes back
/// as a 400 instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Partial update. `tags: None` means "leave the tag set alone";
/// `tags: Some(...)` replaces it entirely.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_completed: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// Recognized task-list query parameters. Anything else on the query string
/// is ignored by serde.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub is_completed: Option<bool>,
    pub tags__title: Option<String>,
    pub created_at: Option<chrono::NaiveDate>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}
