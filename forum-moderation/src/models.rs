use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use forum_shared::types::auth::UserRole;

use crate::schema::{
    categories, comment_reactions, comments, pending_post_categories, pending_posts,
    post_categories, post_reactions, posts, reports, users,
};

// --- Closed vocabularies ---

/// Lifecycle shared by pending posts and reports. `Pending` is the only
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::str::FromStr for ModerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("unknown moderation status: {s}")),
        }
    }
}

/// A moderator's or admin's verdict on a pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// Form/JSON `action` values: `approve` or `reject`.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "approve" => Some(Self::Approved),
            "reject" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn status(&self) -> ModerationStatus {
        match self {
            Self::Approved => ModerationStatus::Approved,
            Self::Rejected => ModerationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Post,
    Comment,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

impl std::str::FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(Self::Post),
            "comment" => Ok(Self::Comment),
            _ => Err(format!("unknown content type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }
}

impl std::str::FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            _ => Err(format!("unknown reaction: {s}")),
        }
    }
}

// --- User ---

#[derive(Debug, Queryable, Identifiable, Clone)]
#[diesel(table_name = users)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

// --- Category ---

#[derive(Debug, Queryable, Identifiable, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

// --- Published post ---

#[derive(Debug, Queryable, Identifiable, Clone)]
#[diesel(table_name = posts)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub user_id: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = post_categories)]
pub struct NewPostCategory {
    pub post_id: i64,
    pub category_id: i64,
}

/// A published post as seen by one viewer. Counts and the viewer's own
/// reaction are derived on read.
#[derive(Debug, Serialize, Clone)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub username: String,
    pub categories: Vec<Category>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes: i64,
    pub dislikes: i64,
    pub viewer_reaction: Option<ReactionKind>,
}

// --- Comment ---

#[derive(Debug, Queryable, Identifiable, Clone)]
#[diesel(table_name = comments)]
pub struct CommentRow {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment<'a> {
    pub content: &'a str,
    pub user_id: i64,
    pub post_id: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct CommentView {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub user_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes: i64,
    pub dislikes: i64,
    pub viewer_reaction: Option<ReactionKind>,
}

// --- Reactions ---

#[derive(Debug, Insertable)]
#[diesel(table_name = post_reactions)]
pub struct NewPostReaction {
    pub user_id: i64,
    pub post_id: i64,
    pub reaction_type: &'static str,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comment_reactions)]
pub struct NewCommentReaction {
    pub user_id: i64,
    pub comment_id: i64,
    pub reaction_type: &'static str,
}

// --- Pending post ---

/// Content a user asked to publish.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub category_ids: Vec<i64>,
}

#[derive(Debug, Queryable, Identifiable, Clone)]
#[diesel(table_name = pending_posts)]
pub struct PendingPostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub status: String,
    pub moderator_id: Option<i64>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pending_posts)]
pub struct NewPendingPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub user_id: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pending_post_categories)]
pub struct NewPendingPostCategory {
    pub pending_post_id: i64,
    pub category_id: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct PendingPost {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub username: String,
    pub categories: Vec<Category>,
    pub status: ModerationStatus,
    pub moderator_id: Option<i64>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- Report ---

#[derive(Debug, Clone)]
pub struct ReportFiling {
    pub target_type: TargetType,
    pub content_id: i64,
    pub reporter_id: i64,
    pub reason: String,
}

#[derive(Debug, Queryable, Identifiable, Clone)]
#[diesel(table_name = reports)]
pub struct ReportRow {
    pub id: i64,
    pub target_type: String,
    pub content_id: i64,
    pub reporter_id: i64,
    pub reason: String,
    pub status: String,
    pub admin_id: Option<i64>,
    pub admin_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReport<'a> {
    pub target_type: &'static str,
    pub content_id: i64,
    pub reporter_id: i64,
    pub reason: &'a str,
}

#[derive(Debug, Serialize, Clone)]
pub struct Report {
    pub id: i64,
    pub target_type: TargetType,
    pub content_id: i64,
    pub reporter_id: i64,
    pub reporter_name: String,
    pub reason: String,
    pub status: ModerationStatus,
    pub admin_id: Option<i64>,
    pub admin_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
