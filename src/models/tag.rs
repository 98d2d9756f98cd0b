use serde::{Deserialize, Serialize};

/// Tag entity as exposed by the API: `{id, title}`. The owning user lives in
/// the `tags` table but is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: String,
    pub title: String,
}

/// `title` is Option so a missing field surfaces as a 400 from the handler
/// rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagRequest {
    pub title: Option<String>,
}
