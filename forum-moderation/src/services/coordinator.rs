//! Moderation coordinator: the entry point for `/mod` and `/admin` handlers.
//!
//! Each operation checks the actor's role first, then parses the external id,
//! then hands off to the queue. The role is re-read from the store on every
//! call. Queue errors pass through unchanged.

use forum_shared::authority;
use forum_shared::errors::{AppError, AppResult, ErrorCode};
use forum_shared::types::auth::{AuthUser, UserRole};

use super::{pending_queue, report_queue, roles};
use crate::models::{Decision, PendingPost, Report, User};
use crate::store::ModerationStore;

/// Parse a path segment into a positive id.
pub fn parse_id(raw: &str, what: &str) -> AppResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::validation(format!("invalid {what} id: {raw:?}"))),
    }
}

/// Authorize against the actor's current stored role.
fn require_current<S: ModerationStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    required: UserRole,
) -> AppResult<()> {
    let role = store
        .user_role(actor.id)?
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "account does not exist"))?;
    authority::require(role, required)
}

pub fn list_pending_posts<S: ModerationStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
) -> AppResult<Vec<PendingPost>> {
    require_current(store, actor, UserRole::Moderator)?;
    pending_queue::list_pending(store)
}

pub fn approve_pending_post<S: ModerationStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    raw_id: &str,
) -> AppResult<i64> {
    require_current(store, actor, UserRole::Moderator)?;
    let pending_id = parse_id(raw_id, "pending post")?;
    pending_queue::approve(store, pending_id, actor.id)
}

pub fn reject_pending_post<S: ModerationStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    raw_id: &str,
    reason: &str,
) -> AppResult<()> {
    require_current(store, actor, UserRole::Moderator)?;
    let pending_id = parse_id(raw_id, "pending post")?;
    pending_queue::reject(store, pending_id, actor.id, reason)
}

pub fn list_reports<S: ModerationStore + ?Sized>(store: &S, actor: &AuthUser) -> AppResult<Vec<Report>> {
    require_current(store, actor, UserRole::Admin)?;
    report_queue::list_pending(store)
}

/// `action` is `approve` or `reject`.
pub fn adjudicate_report<S: ModerationStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    raw_id: &str,
    action: &str,
    response: &str,
) -> AppResult<()> {
    require_current(store, actor, UserRole::Admin)?;
    let report_id = parse_id(raw_id, "report")?;
    let decision = Decision::from_action(action)
        .ok_or_else(|| AppError::validation("action must be 'approve' or 'reject'"))?;
    report_queue::adjudicate(store, report_id, actor.id, decision, response)
}

pub fn list_users<S: ModerationStore + ?Sized>(store: &S, actor: &AuthUser) -> AppResult<Vec<User>> {
    require_current(store, actor, UserRole::Admin)?;
    roles::list_users(store)
}

/// Admins may change any role except their own admin role.
pub fn change_role<S: ModerationStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    raw_id: &str,
    raw_role: &str,
) -> AppResult<()> {
    require_current(store, actor, UserRole::Admin)?;
    let user_id = parse_id(raw_id, "user")?;
    let role = roles::parse_role(raw_role)?;

    if user_id == actor.id && role != UserRole::Admin {
        tracing::warn!(user_id, "admin attempted self-demotion");
        return Err(AppError::new(
            ErrorCode::CannotDemoteSelf,
            "you cannot remove your own admin role",
        ));
    }
    roles::update_user_role(store, user_id, role)
}
