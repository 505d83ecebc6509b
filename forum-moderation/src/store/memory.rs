use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use forum_shared::errors::{AppError, AppResult, ErrorCode};
use forum_shared::types::auth::UserRole;

use super::{ContentStore, ModerationStore};
use crate::models::{
    Category, CommentView, Decision, ModerationStatus, NewSubmission, PendingPost, PostView,
    ReactionKind, Report, ReportFiling, TargetType, User,
};

const DEFAULT_CATEGORIES: [&str; 10] = [
    "General", "Technology", "Sport", "Music", "Cinema",
    "Video games", "Science", "Art", "Politics", "Other",
];

#[derive(Debug, Clone)]
struct UserRecord {
    username: String,
    role: UserRole,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct PostRecord {
    title: String,
    content: String,
    user_id: i64,
    category_ids: BTreeSet<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    post_id: i64,
    content: String,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct PendingRecord {
    title: String,
    content: String,
    user_id: i64,
    category_ids: BTreeSet<i64>,
    status: ModerationStatus,
    moderator_id: Option<i64>,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ReportRecord {
    target_type: TargetType,
    content_id: i64,
    reporter_id: i64,
    reason: String,
    status: ModerationStatus,
    admin_id: Option<i64>,
    admin_response: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Sequences {
    user: i64,
    category: i64,
    post: i64,
    comment: i64,
    pending: i64,
    report: i64,
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct MemoryState {
    seq: Sequences,
    users: BTreeMap<i64, UserRecord>,
    categories: BTreeMap<i64, Category>,
    posts: BTreeMap<i64, PostRecord>,
    comments: BTreeMap<i64, CommentRecord>,
    // keyed by (user_id, target_id)
    post_reactions: HashMap<(i64, i64), ReactionKind>,
    comment_reactions: HashMap<(i64, i64), ReactionKind>,
    pending: BTreeMap<i64, PendingRecord>,
    reports: BTreeMap<i64, ReportRecord>,
}

impl MemoryState {
    fn require_user(&self, user_id: i64) -> AppResult<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::UserNotFound, format!("user {user_id} not found")))
        }
    }

    fn checked_categories(&self, ids: &[i64]) -> AppResult<BTreeSet<i64>> {
        match ids.iter().find(|id| !self.categories.contains_key(id)) {
            Some(missing) => Err(AppError::new(
                ErrorCode::InvalidCategory,
                format!("category {missing} does not exist"),
            )),
            None => Ok(ids.iter().copied().collect()),
        }
    }

    fn username(&self, user_id: i64) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn categories_for(&self, ids: &BTreeSet<i64>) -> Vec<Category> {
        ids.iter().filter_map(|id| self.categories.get(id).cloned()).collect()
    }

    fn insert_post(&mut self, id: i64, title: &str, content: &str, user_id: i64, category_ids: BTreeSet<i64>) {
        let now = Utc::now();
        self.posts.insert(
            id,
            PostRecord {
                title: title.to_string(),
                content: content.to_string(),
                user_id,
                category_ids,
                created_at: now,
                updated_at: now,
            },
        );
    }

    fn remove_comment(&mut self, comment_id: i64) -> bool {
        let removed = self.comments.remove(&comment_id).is_some();
        self.comment_reactions.retain(|(_, target), _| *target != comment_id);
        removed
    }

    fn remove_post(&mut self, post_id: i64) -> bool {
        if self.posts.remove(&post_id).is_none() {
            return false;
        }
        let orphaned: Vec<i64> = self
            .comments
            .iter()
            .filter(|(_, c)| c.post_id == post_id)
            .map(|(id, _)| *id)
            .collect();
        for comment_id in orphaned {
            self.remove_comment(comment_id);
        }
        self.post_reactions.retain(|(_, target), _| *target != post_id);
        true
    }

    fn tally(reactions: &HashMap<(i64, i64), ReactionKind>, target_id: i64, viewer_id: Option<i64>) -> (i64, i64, Option<ReactionKind>) {
        let mut likes = 0;
        let mut dislikes = 0;
        let mut mine = None;
        for ((user_id, target), kind) in reactions {
            if *target != target_id {
                continue;
            }
            match kind {
                ReactionKind::Like => likes += 1,
                ReactionKind::Dislike => dislikes += 1,
            }
            if Some(*user_id) == viewer_id {
                mine = Some(*kind);
            }
        }
        (likes, dislikes, mine)
    }

    fn pending_view(&self, id: i64, record: &PendingRecord) -> PendingPost {
        PendingPost {
            id,
            title: record.title.clone(),
            content: record.content.clone(),
            user_id: record.user_id,
            username: self.username(record.user_id),
            categories: self.categories_for(&record.category_ids),
            status: record.status,
            moderator_id: record.moderator_id,
            reason: record.reason.clone(),
            created_at: record.created_at,
        }
    }

    fn report_view(&self, id: i64, record: &ReportRecord) -> Report {
        Report {
            id,
            target_type: record.target_type,
            content_id: record.content_id,
            reporter_id: record.reporter_id,
            reporter_name: self.username(record.reporter_id),
            reason: record.reason.clone(),
            status: record.status,
            admin_id: record.admin_id,
            admin_response: record.admin_response.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Process-local store. All state sits behind one mutex, so every trait
/// method is atomic and transitions cannot interleave.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with the default category catalog.
    pub fn new() -> Self {
        let mut state = MemoryState::default();
        for name in DEFAULT_CATEGORIES {
            let id = next_id(&mut state.seq.category);
            state.categories.insert(
                id,
                Category {
                    id,
                    name: name.to_string(),
                    description: None,
                },
            );
        }
        Self {
            state: Mutex::new(state),
        }
    }

    /// Store seeded with a single `admin` account (id 1), so a fresh
    /// instance can be administered.
    pub fn with_default_admin() -> AppResult<Self> {
        let store = Self::new();
        store.create_user("admin", UserRole::Admin)?;
        Ok(store)
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::internal("memory store lock poisoned"))
    }

    pub fn create_user(&self, username: &str, role: UserRole) -> AppResult<i64> {
        let mut state = self.lock()?;
        if state.users.values().any(|u| u.username == username) {
            return Err(AppError::validation(format!("username {username} is taken")));
        }
        let id = next_id(&mut state.seq.user);
        state.users.insert(
            id,
            UserRecord {
                username: username.to_string(),
                role,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    /// Publish a post under a caller-chosen id. Later ids continue after it.
    pub fn insert_post_with_id(&self, post_id: i64, author_id: i64, title: &str, content: &str) -> AppResult<()> {
        let mut state = self.lock()?;
        state.require_user(author_id)?;
        if state.posts.contains_key(&post_id) {
            return Err(AppError::validation(format!("post {post_id} already exists")));
        }
        state.insert_post(post_id, title, content, author_id, BTreeSet::new());
        state.seq.post = state.seq.post.max(post_id);
        Ok(())
    }
}

impl ContentStore for MemoryStore {
    fn categories(&self) -> AppResult<Vec<Category>> {
        Ok(self.lock()?.categories.values().cloned().collect())
    }

    fn create_published(&self, submission: &NewSubmission) -> AppResult<i64> {
        let mut state = self.lock()?;
        state.require_user(submission.author_id)?;
        let category_ids = state.checked_categories(&submission.category_ids)?;
        let id = next_id(&mut state.seq.post);
        state.insert_post(id, &submission.title, &submission.content, submission.author_id, category_ids);
        Ok(id)
    }

    fn post(&self, post_id: i64, viewer_id: Option<i64>) -> AppResult<Option<PostView>> {
        let state = self.lock()?;
        let Some(post) = state.posts.get(&post_id) else {
            return Ok(None);
        };
        let (likes, dislikes, viewer_reaction) = MemoryState::tally(&state.post_reactions, post_id, viewer_id);
        Ok(Some(PostView {
            id: post_id,
            title: post.title.clone(),
            content: post.content.clone(),
            user_id: post.user_id,
            username: state.username(post.user_id),
            categories: state.categories_for(&post.category_ids),
            created_at: post.created_at,
            updated_at: post.updated_at,
            likes,
            dislikes,
            viewer_reaction,
        }))
    }

    fn post_count(&self) -> AppResult<i64> {
        Ok(self.lock()?.posts.len() as i64)
    }

    fn author_of(&self, target: TargetType, id: i64) -> AppResult<Option<i64>> {
        let state = self.lock()?;
        Ok(match target {
            TargetType::Post => state.posts.get(&id).map(|p| p.user_id),
            TargetType::Comment => state.comments.get(&id).map(|c| c.user_id),
        })
    }

    fn delete_post(&self, post_id: i64) -> AppResult<bool> {
        Ok(self.lock()?.remove_post(post_id))
    }

    fn delete_comment(&self, comment_id: i64) -> AppResult<bool> {
        Ok(self.lock()?.remove_comment(comment_id))
    }

    fn create_comment(&self, post_id: i64, author_id: i64, content: &str) -> AppResult<i64> {
        let mut state = self.lock()?;
        state.require_user(author_id)?;
        if !state.posts.contains_key(&post_id) {
            return Err(AppError::new(ErrorCode::PostNotFound, "post not found"));
        }
        let id = next_id(&mut state.seq.comment);
        let now = Utc::now();
        state.comments.insert(
            id,
            CommentRecord {
                post_id,
                content: content.to_string(),
                user_id: author_id,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    fn comments(&self, post_id: i64, viewer_id: Option<i64>) -> AppResult<Vec<CommentView>> {
        let state = self.lock()?;
        let mut views: Vec<CommentView> = state
            .comments
            .iter()
            .filter(|(_, c)| c.post_id == post_id)
            .map(|(id, c)| {
                let (likes, dislikes, viewer_reaction) =
                    MemoryState::tally(&state.comment_reactions, *id, viewer_id);
                CommentView {
                    id: *id,
                    post_id,
                    content: c.content.clone(),
                    user_id: c.user_id,
                    username: state.username(c.user_id),
                    created_at: c.created_at,
                    updated_at: c.updated_at,
                    likes,
                    dislikes,
                    viewer_reaction,
                }
            })
            .collect();
        views.sort_by_key(|c| (c.created_at, c.id));
        Ok(views)
    }

    fn react(
        &self,
        target: TargetType,
        target_id: i64,
        user_id: i64,
        reaction: Option<ReactionKind>,
    ) -> AppResult<()> {
        let mut state = self.lock()?;
        state.require_user(user_id)?;
        let reactions = match target {
            TargetType::Post => {
                if !state.posts.contains_key(&target_id) {
                    return Err(AppError::new(ErrorCode::PostNotFound, "post not found"));
                }
                &mut state.post_reactions
            }
            TargetType::Comment => {
                if !state.comments.contains_key(&target_id) {
                    return Err(AppError::new(ErrorCode::CommentNotFound, "comment not found"));
                }
                &mut state.comment_reactions
            }
        };
        match reaction {
            Some(kind) => {
                reactions.insert((user_id, target_id), kind);
            }
            None => {
                reactions.remove(&(user_id, target_id));
            }
        }
        Ok(())
    }
}

impl ModerationStore for MemoryStore {
    fn submit_pending_post(&self, submission: &NewSubmission) -> AppResult<i64> {
        let mut state = self.lock()?;
        state.require_user(submission.author_id)?;
        let category_ids = state.checked_categories(&submission.category_ids)?;
        let id = next_id(&mut state.seq.pending);
        state.pending.insert(
            id,
            PendingRecord {
                title: submission.title.clone(),
                content: submission.content.clone(),
                user_id: submission.author_id,
                category_ids,
                status: ModerationStatus::Pending,
                moderator_id: None,
                reason: None,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    fn pending_posts(&self) -> AppResult<Vec<PendingPost>> {
        let state = self.lock()?;
        let mut views: Vec<PendingPost> = state
            .pending
            .iter()
            .filter(|(_, p)| p.status == ModerationStatus::Pending)
            .map(|(id, p)| state.pending_view(*id, p))
            .collect();
        views.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(views)
    }

    fn pending_post(&self, pending_id: i64) -> AppResult<Option<PendingPost>> {
        let state = self.lock()?;
        Ok(state.pending.get(&pending_id).map(|p| state.pending_view(pending_id, p)))
    }

    fn approve_pending_post(&self, pending_id: i64, moderator_id: i64) -> AppResult<i64> {
        let mut state = self.lock()?;
        let pending = state
            .pending
            .get(&pending_id)
            .cloned()
            .ok_or_else(|| AppError::new(ErrorCode::PendingPostNotFound, "pending post not found"))?;
        if pending.status.is_terminal() {
            return Err(AppError::new(
                ErrorCode::PendingPostAlreadyProcessed,
                "pending post has already been processed",
            ));
        }

        let post_id = next_id(&mut state.seq.post);
        state.insert_post(post_id, &pending.title, &pending.content, pending.user_id, pending.category_ids);
        if let Some(record) = state.pending.get_mut(&pending_id) {
            record.status = ModerationStatus::Approved;
            record.moderator_id = Some(moderator_id);
        }
        Ok(post_id)
    }

    fn reject_pending_post(&self, pending_id: i64, moderator_id: i64, reason: &str) -> AppResult<()> {
        let mut state = self.lock()?;
        let record = state
            .pending
            .get_mut(&pending_id)
            .ok_or_else(|| AppError::new(ErrorCode::PendingPostNotFound, "pending post not found"))?;
        if record.status.is_terminal() {
            return Err(AppError::new(
                ErrorCode::PendingPostAlreadyProcessed,
                "pending post has already been processed",
            ));
        }
        record.status = ModerationStatus::Rejected;
        record.moderator_id = Some(moderator_id);
        record.reason = Some(reason.to_string());
        Ok(())
    }

    fn file_report(&self, filing: &ReportFiling) -> AppResult<i64> {
        let mut state = self.lock()?;
        state.require_user(filing.reporter_id)?;
        let target_exists = match filing.target_type {
            TargetType::Post => state.posts.contains_key(&filing.content_id),
            TargetType::Comment => state.comments.contains_key(&filing.content_id),
        };
        if !target_exists {
            return Err(AppError::new(ErrorCode::ContentNotFound, "reported content not found"));
        }
        let duplicate = state.reports.values().any(|r| {
            r.reporter_id == filing.reporter_id
                && r.target_type == filing.target_type
                && r.content_id == filing.content_id
        });
        if duplicate {
            return Err(AppError::new(
                ErrorCode::DuplicateReport,
                "content already reported by this user",
            ));
        }

        let id = next_id(&mut state.seq.report);
        let now = Utc::now();
        state.reports.insert(
            id,
            ReportRecord {
                target_type: filing.target_type,
                content_id: filing.content_id,
                reporter_id: filing.reporter_id,
                reason: filing.reason.clone(),
                status: ModerationStatus::Pending,
                admin_id: None,
                admin_response: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    fn pending_reports(&self) -> AppResult<Vec<Report>> {
        let state = self.lock()?;
        let mut views: Vec<Report> = state
            .reports
            .iter()
            .filter(|(_, r)| r.status == ModerationStatus::Pending)
            .map(|(id, r)| state.report_view(*id, r))
            .collect();
        views.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(views)
    }

    fn report(&self, report_id: i64) -> AppResult<Option<Report>> {
        let state = self.lock()?;
        Ok(state.reports.get(&report_id).map(|r| state.report_view(report_id, r)))
    }

    fn adjudicate_report(
        &self,
        report_id: i64,
        admin_id: i64,
        decision: Decision,
        response: &str,
    ) -> AppResult<()> {
        let mut state = self.lock()?;
        let record = state
            .reports
            .get_mut(&report_id)
            .ok_or_else(|| AppError::new(ErrorCode::ReportNotFound, "report not found"))?;
        if record.status.is_terminal() {
            return Err(AppError::new(
                ErrorCode::ReportAlreadyReviewed,
                "report has already been processed",
            ));
        }
        record.status = decision.status();
        record.admin_id = Some(admin_id);
        record.admin_response = Some(response.to_string());
        record.updated_at = Utc::now();
        let (target_type, content_id) = (record.target_type, record.content_id);

        if decision == Decision::Approved {
            match target_type {
                TargetType::Post => state.remove_post(content_id),
                TargetType::Comment => state.remove_comment(content_id),
            };
        }
        Ok(())
    }

    fn users(&self) -> AppResult<Vec<User>> {
        let state = self.lock()?;
        Ok(state
            .users
            .iter()
            .map(|(id, u)| User {
                id: *id,
                username: u.username.clone(),
                role: u.role,
                created_at: u.created_at,
            })
            .collect())
    }

    fn user_role(&self, user_id: i64) -> AppResult<Option<UserRole>> {
        Ok(self.lock()?.users.get(&user_id).map(|u| u.role))
    }

    fn update_user_role(&self, user_id: i64, role: UserRole) -> AppResult<()> {
        let mut state = self.lock()?;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, format!("user {user_id} not found")))?;
        user.role = role;
        Ok(())
    }

    fn ping(&self) -> AppResult<()> {
        self.lock().map(|_| ())
    }
}
