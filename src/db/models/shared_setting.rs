use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Shared Setting Models
// ============================================================================

/// One grantee row of a named sharing template. Rows sharing
/// `(owner_id, name)` form a single template.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SharedSetting {
    pub id: String,
    pub owner_id: String,
    pub shared_user_id: String,
    pub can_read: bool,
    pub can_write: bool,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct TemplateEntry {
    pub shared_user_id: String,
    pub can_read: bool,
    pub can_write: bool,
}
