//! Moderation and content-lifecycle services.
//!
//! `pending_queue`, `report_queue` and `roles` are the state machines; they
//! trust their inputs to come from an authorized actor. `coordinator` and
//! `content` are what handlers call: they check roles, parse path ids and
//! then delegate.

pub mod content;
pub mod coordinator;
pub mod pending_queue;
pub mod report_queue;
pub mod roles;

use forum_shared::errors::{AppError, AppResult};

pub const MAX_TITLE_LEN: usize = 200;

/// Reject missing or whitespace-only text.
pub(crate) fn require_text(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn require_title(title: &str) -> AppResult<()> {
    require_text(title, "title")?;
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Sorted, de-duplicated copy of requested category ids.
pub(crate) fn normalize_categories(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
pub(crate) mod fixtures {
    use forum_shared::types::auth::{AuthUser, Claims, UserRole};

    use crate::store::MemoryStore;

    pub fn actor(id: i64, role: UserRole) -> AuthUser {
        AuthUser::from(Claims::new(id, role, 3600))
    }

    /// Store with one user per role: alice (user, 1), mod (moderator, 2),
    /// root (admin, 3).
    pub fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_user("alice", UserRole::User).unwrap();
        store.create_user("mod", UserRole::Moderator).unwrap();
        store.create_user("root", UserRole::Admin).unwrap();
        store
    }

    pub const ALICE: i64 = 1;
    pub const MODERATOR: i64 = 2;
    pub const ADMIN: i64 = 3;
}
