//! Pending-post queue: `pending -> approved | rejected`, both terminal.

use metrics::counter;

use forum_shared::errors::AppResult;

use super::{normalize_categories, require_text, require_title};
use crate::models::{NewSubmission, PendingPost};
use crate::store::ModerationStore;

/// Queue a submission for review. Nothing is persisted if any category is
/// unknown.
pub fn submit<S: ModerationStore + ?Sized>(
    store: &S,
    title: &str,
    content: &str,
    author_id: i64,
    category_ids: &[i64],
) -> AppResult<i64> {
    require_title(title)?;
    require_text(content, "content")?;

    let submission = NewSubmission {
        title: title.trim().to_string(),
        content: content.to_string(),
        author_id,
        category_ids: normalize_categories(category_ids),
    };
    let pending_id = store.submit_pending_post(&submission)?;

    tracing::info!(pending_id, author_id, "post queued for moderation");
    counter!("moderation_pending_posts_total", "decision" => "submitted").increment(1);
    Ok(pending_id)
}

/// Publish a pending post. Returns the id of the new published post.
pub fn approve<S: ModerationStore + ?Sized>(
    store: &S,
    pending_id: i64,
    moderator_id: i64,
) -> AppResult<i64> {
    let post_id = store
        .approve_pending_post(pending_id, moderator_id)
        .inspect_err(|e| tracing::warn!(pending_id, moderator_id, error = %e, "approve refused"))?;

    tracing::info!(pending_id, post_id, moderator_id, "pending post approved");
    counter!("moderation_pending_posts_total", "decision" => "approved").increment(1);
    Ok(post_id)
}

pub fn reject<S: ModerationStore + ?Sized>(
    store: &S,
    pending_id: i64,
    moderator_id: i64,
    reason: &str,
) -> AppResult<()> {
    require_text(reason, "reason")?;

    store
        .reject_pending_post(pending_id, moderator_id, reason.trim())
        .inspect_err(|e| tracing::warn!(pending_id, moderator_id, error = %e, "reject refused"))?;

    tracing::info!(pending_id, moderator_id, "pending post rejected");
    counter!("moderation_pending_posts_total", "decision" => "rejected").increment(1);
    Ok(())
}

pub fn list_pending<S: ModerationStore + ?Sized>(store: &S) -> AppResult<Vec<PendingPost>> {
    store.pending_posts()
}
