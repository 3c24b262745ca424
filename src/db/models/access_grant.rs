use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Note Access Models
// ============================================================================

/// A (note, grantee, read, write) record. `can_write` implies `can_read`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AccessGrant {
    pub id: String,
    pub note_id: String,
    pub user_id: String,
    pub can_read: bool,
    pub can_write: bool,
    pub created_at: NaiveDateTime,
}

/// Effective rights of one user on one note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Access {
    pub read: bool,
    pub write: bool,
}

impl Access {
    pub const NONE: Access = Access {
        read: false,
        write: false,
    };
    pub const FULL: Access = Access {
        read: true,
        write: true,
    };

    /// Build an access pair with write forcing read.
    pub fn normalized(read: bool, write: bool) -> Self {
        Access {
            read: read || write,
            write,
        }
    }
}
