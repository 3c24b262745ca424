use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    /// Owning user. Never changes after creation.
    pub user_id: String,
    pub title: String,
    pub contents: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct CreateNote {
    pub user_id: String,
    pub title: String,
    pub contents: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub contents: Option<String>,
}

/// Which read grants make a note show up in a user's note list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityScope {
    /// Only read grants held by the querying user.
    #[default]
    Grantee,
    /// Any read grant held by anyone.
    AnyGrant,
}
