use forum_shared::errors::{AppError, AppResult, ErrorCode};
use forum_shared::types::auth::UserRole;

use crate::models::User;
use crate::store::ModerationStore;

pub fn parse_role(raw: &str) -> AppResult<UserRole> {
    raw.parse::<UserRole>().map_err(|_| {
        AppError::new(
            ErrorCode::InvalidRole,
            "role must be one of 'user', 'moderator', 'admin'",
        )
    })
}

/// Set a user's role. Self-demotion is the caller's concern.
pub fn update_user_role<S: ModerationStore + ?Sized>(
    store: &S,
    user_id: i64,
    role: UserRole,
) -> AppResult<()> {
    store.update_user_role(user_id, role)?;
    tracing::info!(user_id, role = role.as_str(), "user role updated");
    Ok(())
}

pub fn list_users<S: ModerationStore + ?Sized>(store: &S) -> AppResult<Vec<User>> {
    store.users()
}
