//! Storage seam for forum state.
//!
//! Every method is one unit of work: it either applies completely or not at
//! all. Transitions out of `pending` are single-winner: when two callers race
//! on the same record exactly one succeeds and the other observes the record
//! as already processed. Callers hold no locks of their own.
//!
//! - `postgres`: diesel over an r2d2 pool, one transaction per method.
//! - `memory`: a mutex-guarded state, one critical section per method.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use forum_shared::errors::AppResult;
use forum_shared::types::auth::UserRole;

use crate::models::{
    Category, CommentView, Decision, NewSubmission, PendingPost, PostView, ReactionKind, Report,
    ReportFiling, TargetType, User,
};

/// Canonical published content: posts, comments, categories and reactions.
pub trait ContentStore: Send + Sync {
    fn categories(&self) -> AppResult<Vec<Category>>;

    /// Publish directly, bypassing moderation. Returns the new post id.
    fn create_published(&self, submission: &NewSubmission) -> AppResult<i64>;

    fn post(&self, post_id: i64, viewer_id: Option<i64>) -> AppResult<Option<PostView>>;

    fn post_count(&self) -> AppResult<i64>;

    /// Author of a post or comment, `None` when it does not exist.
    fn author_of(&self, target: TargetType, id: i64) -> AppResult<Option<i64>>;

    fn exists(&self, target: TargetType, id: i64) -> AppResult<bool> {
        Ok(self.author_of(target, id)?.is_some())
    }

    /// Delete a post with its comments, reactions and category links.
    /// Returns whether anything was deleted.
    fn delete_post(&self, post_id: i64) -> AppResult<bool>;

    fn delete_comment(&self, comment_id: i64) -> AppResult<bool>;

    fn create_comment(&self, post_id: i64, author_id: i64, content: &str) -> AppResult<i64>;

    /// Comments of a post, oldest first.
    fn comments(&self, post_id: i64, viewer_id: Option<i64>) -> AppResult<Vec<CommentView>>;

    /// Set (`Some`) or clear (`None`) a user's reaction on a post or comment.
    fn react(
        &self,
        target: TargetType,
        target_id: i64,
        user_id: i64,
        reaction: Option<ReactionKind>,
    ) -> AppResult<()>;
}

/// Pending-post queue, report queue and user roles, sharing a unit of work
/// with the content they publish or delete.
pub trait ModerationStore: ContentStore {
    fn submit_pending_post(&self, submission: &NewSubmission) -> AppResult<i64>;

    /// Records still `pending`, newest first, categories populated.
    fn pending_posts(&self) -> AppResult<Vec<PendingPost>>;

    /// Any pending-post record regardless of status.
    fn pending_post(&self, pending_id: i64) -> AppResult<Option<PendingPost>>;

    /// Publish a pending post and mark it approved. Returns the new post id.
    fn approve_pending_post(&self, pending_id: i64, moderator_id: i64) -> AppResult<i64>;

    fn reject_pending_post(&self, pending_id: i64, moderator_id: i64, reason: &str) -> AppResult<()>;

    fn file_report(&self, filing: &ReportFiling) -> AppResult<i64>;

    /// Reports still `pending`, newest first, with the reporter's username.
    fn pending_reports(&self) -> AppResult<Vec<Report>>;

    fn report(&self, report_id: i64) -> AppResult<Option<Report>>;

    /// Close a pending report. An approval deletes the reported content in
    /// the same unit of work.
    fn adjudicate_report(
        &self,
        report_id: i64,
        admin_id: i64,
        decision: Decision,
        response: &str,
    ) -> AppResult<()>;

    fn users(&self) -> AppResult<Vec<User>>;

    /// Current role of an account, `None` when it does not exist.
    fn user_role(&self, user_id: i64) -> AppResult<Option<UserRole>>;

    fn update_user_role(&self, user_id: i64, role: UserRole) -> AppResult<()>;

    /// Cheap liveness probe for health checks.
    fn ping(&self) -> AppResult<()>;
}
