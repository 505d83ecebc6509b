use serde::Serialize;

use forum_shared::authority;
use forum_shared::errors::{AppError, AppResult, ErrorCode};
use forum_shared::types::auth::{AuthUser, UserRole};

use super::coordinator::parse_id;
use super::{normalize_categories, pending_queue, require_text, require_title};
use crate::models::{Category, CommentView, NewSubmission, PostView, ReactionKind, TargetType};
use crate::store::{ContentStore, ModerationStore};

/// Where a submission ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "id", rename_all = "lowercase")]
pub enum Submission {
    Pending(i64),
    Published(i64),
}

fn not_found(target: TargetType) -> AppError {
    match target {
        TargetType::Post => AppError::new(ErrorCode::PostNotFound, "post not found"),
        TargetType::Comment => AppError::new(ErrorCode::CommentNotFound, "comment not found"),
    }
}

pub fn categories<S: ContentStore + ?Sized>(store: &S) -> AppResult<Vec<Category>> {
    store.categories()
}

/// Plain users go through the pending queue when approval is required;
/// moderators and admins publish directly.
pub fn submit_post<S: ModerationStore + ?Sized>(
    store: &S,
    author: &AuthUser,
    title: &str,
    content: &str,
    category_ids: &[i64],
    require_approval: bool,
) -> AppResult<Submission> {
    if require_approval && !authority::authorize(author.role, UserRole::Moderator) {
        return pending_queue::submit(store, title, content, author.id, category_ids)
            .map(Submission::Pending);
    }

    require_title(title)?;
    require_text(content, "content")?;
    let post_id = store.create_published(&NewSubmission {
        title: title.trim().to_string(),
        content: content.to_string(),
        author_id: author.id,
        category_ids: normalize_categories(category_ids),
    })?;
    tracing::info!(post_id, author_id = author.id, "post published");
    Ok(Submission::Published(post_id))
}

pub fn post<S: ContentStore + ?Sized>(store: &S, raw_id: &str, viewer_id: Option<i64>) -> AppResult<PostView> {
    let post_id = parse_id(raw_id, "post")?;
    store
        .post(post_id, viewer_id)?
        .ok_or_else(|| not_found(TargetType::Post))
}

pub fn comments<S: ContentStore + ?Sized>(
    store: &S,
    raw_post_id: &str,
    viewer_id: Option<i64>,
) -> AppResult<Vec<CommentView>> {
    let post_id = parse_id(raw_post_id, "post")?;
    if !store.exists(TargetType::Post, post_id)? {
        return Err(not_found(TargetType::Post));
    }
    store.comments(post_id, viewer_id)
}

pub fn create_comment<S: ContentStore + ?Sized>(
    store: &S,
    author: &AuthUser,
    raw_post_id: &str,
    content: &str,
) -> AppResult<i64> {
    let post_id = parse_id(raw_post_id, "post")?;
    require_text(content, "content")?;
    let comment_id = store.create_comment(post_id, author.id, content)?;
    tracing::debug!(comment_id, post_id, author_id = author.id, "comment created");
    Ok(comment_id)
}

pub fn react<S: ContentStore + ?Sized>(
    store: &S,
    user: &AuthUser,
    target: TargetType,
    raw_id: &str,
    reaction: Option<ReactionKind>,
) -> AppResult<()> {
    let target_id = parse_id(raw_id, target.as_str())?;
    store.react(target, target_id, user.id, reaction)
}

/// Authors delete their own content, admins anything.
pub fn delete<S: ContentStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    target: TargetType,
    raw_id: &str,
) -> AppResult<()> {
    let id = parse_id(raw_id, target.as_str())?;
    let author_id = store.author_of(target, id)?.ok_or_else(|| not_found(target))?;
    if author_id != actor.id {
        authority::require(actor.role, UserRole::Admin)?;
    }

    let deleted = match target {
        TargetType::Post => store.delete_post(id)?,
        TargetType::Comment => store.delete_comment(id)?,
    };
    if !deleted {
        return Err(not_found(target));
    }
    tracing::info!(id, target = target.as_str(), actor_id = actor.id, "content deleted");
    Ok(())
}
