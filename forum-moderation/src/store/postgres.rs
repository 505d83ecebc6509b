use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use forum_shared::clients::db::DbPool;
use forum_shared::errors::{AppError, AppResult, ErrorCode};
use forum_shared::types::auth::UserRole;

use super::{ContentStore, ModerationStore};
use crate::models::{
    Category, CommentRow, CommentView, Decision, ModerationStatus, NewComment,
    NewCommentReaction, NewPendingPost, NewPendingPostCategory, NewPost, NewPostCategory,
    NewPostReaction, NewReport, NewSubmission, PendingPost, PendingPostRow, PostRow, PostView,
    ReactionKind, Report, ReportFiling, ReportRow, TargetType, User, UserRow,
};
use crate::schema::{
    categories, comment_reactions, comments, pending_post_categories, pending_posts,
    post_categories, post_reactions, posts, reports, users,
};

type PgPooled = PooledConnection<ConnectionManager<PgConnection>>;

/// Storage faults are logged server-side and reach clients as a generic error.
fn db_err(e: DieselError) -> AppError {
    AppError::Database(e)
}

/// Foreign-key violations become `code`; everything else is a storage fault.
fn fk_err(e: DieselError, code: ErrorCode, message: &str) -> AppError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            AppError::new(code, message)
        }
        other => db_err(other),
    }
}

fn parse_column<T: FromStr<Err = String>>(value: &str) -> AppResult<T> {
    value
        .parse()
        .map_err(|e: String| AppError::internal(format!("corrupt row: {e}")))
}

fn tally(rows: &[(i64, i64, String)], target_id: i64, viewer_id: Option<i64>) -> AppResult<(i64, i64, Option<ReactionKind>)> {
    let mut likes = 0;
    let mut dislikes = 0;
    let mut mine = None;
    for (_, user_id, kind) in rows.iter().filter(|r| r.0 == target_id) {
        let kind: ReactionKind = parse_column(kind)?;
        match kind {
            ReactionKind::Like => likes += 1,
            ReactionKind::Dislike => dislikes += 1,
        }
        if Some(*user_id) == viewer_id {
            mine = Some(kind);
        }
    }
    Ok((likes, dislikes, mine))
}

fn link_post_categories(conn: &mut PgConnection, post_id: i64, category_ids: &[i64]) -> AppResult<()> {
    if category_ids.is_empty() {
        return Ok(());
    }
    let links: Vec<NewPostCategory> = category_ids
        .iter()
        .map(|&category_id| NewPostCategory { post_id, category_id })
        .collect();
    diesel::insert_into(post_categories::table)
        .values(&links)
        .on_conflict_do_nothing()
        .execute(conn)
        .map_err(|e| fk_err(e, ErrorCode::InvalidCategory, "category does not exist"))?;
    Ok(())
}

fn insert_post(conn: &mut PgConnection, title: &str, content: &str, user_id: i64, category_ids: &[i64]) -> AppResult<i64> {
    let post_id: i64 = diesel::insert_into(posts::table)
        .values(&NewPost { title, content, user_id })
        .returning(posts::id)
        .get_result(conn)
        .map_err(|e| fk_err(e, ErrorCode::UserNotFound, "author does not exist"))?;
    link_post_categories(conn, post_id, category_ids)?;
    Ok(post_id)
}

fn post_exists(conn: &mut PgConnection, post_id: i64) -> AppResult<bool> {
    diesel::select(exists(posts::table.find(post_id)))
        .get_result(conn)
        .map_err(db_err)
}

fn comment_exists(conn: &mut PgConnection, comment_id: i64) -> AppResult<bool> {
    diesel::select(exists(comments::table.find(comment_id)))
        .get_result(conn)
        .map_err(db_err)
}

/// Existence check holding a shared row lock until commit, so the content
/// cannot be deleted between the check and the caller's insert.
fn lock_target(conn: &mut PgConnection, target: TargetType, id: i64) -> AppResult<bool> {
    let locked = match target {
        TargetType::Post => posts::table
            .find(id)
            .select(posts::id)
            .for_share()
            .first::<i64>(conn),
        TargetType::Comment => comments::table
            .find(id)
            .select(comments::id)
            .for_share()
            .first::<i64>(conn),
    };
    Ok(locked.optional().map_err(db_err)?.is_some())
}

/// Error for a conditional update that matched nothing: the record is
/// either absent or already terminal.
fn pending_post_miss(conn: &mut PgConnection, pending_id: i64) -> AppError {
    match diesel::select(exists(pending_posts::table.find(pending_id))).get_result::<bool>(conn) {
        Ok(true) => AppError::new(
            ErrorCode::PendingPostAlreadyProcessed,
            "pending post has already been processed",
        ),
        Ok(false) => AppError::new(ErrorCode::PendingPostNotFound, "pending post not found"),
        Err(e) => db_err(e),
    }
}

fn report_miss(conn: &mut PgConnection, report_id: i64) -> AppError {
    match diesel::select(exists(reports::table.find(report_id))).get_result::<bool>(conn) {
        Ok(true) => AppError::new(ErrorCode::ReportAlreadyReviewed, "report has already been processed"),
        Ok(false) => AppError::new(ErrorCode::ReportNotFound, "report not found"),
        Err(e) => db_err(e),
    }
}

fn categories_of_pending(conn: &mut PgConnection, pending_ids: &[i64]) -> AppResult<HashMap<i64, Vec<Category>>> {
    let rows: Vec<(i64, Category)> = pending_post_categories::table
        .inner_join(categories::table)
        .filter(pending_post_categories::pending_post_id.eq_any(pending_ids))
        .order(categories::id.asc())
        .select((pending_post_categories::pending_post_id, categories::all_columns))
        .load(conn)
        .map_err(db_err)?;
    let mut grouped: HashMap<i64, Vec<Category>> = HashMap::new();
    for (pending_id, category) in rows {
        grouped.entry(pending_id).or_default().push(category);
    }
    Ok(grouped)
}

impl PendingPostRow {
    fn into_pending(self, username: String, categories: Vec<Category>) -> AppResult<PendingPost> {
        Ok(PendingPost {
            status: parse_column::<ModerationStatus>(&self.status)?,
            id: self.id,
            title: self.title,
            content: self.content,
            user_id: self.user_id,
            username,
            categories,
            moderator_id: self.moderator_id,
            reason: self.reason,
            created_at: self.created_at,
        })
    }
}

impl ReportRow {
    fn into_report(self, reporter_name: String) -> AppResult<Report> {
        Ok(Report {
            target_type: parse_column::<TargetType>(&self.target_type)?,
            status: parse_column::<ModerationStatus>(&self.status)?,
            id: self.id,
            content_id: self.content_id,
            reporter_id: self.reporter_id,
            reporter_name,
            reason: self.reason,
            admin_id: self.admin_id,
            admin_response: self.admin_response,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// PostgreSQL-backed store. Each method checks out one pooled connection and
/// runs its writes inside a single transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> AppResult<PgPooled> {
        self.pool
            .get()
            .map_err(|e| AppError::internal(format!("db pool error: {e}")))
    }
}

impl ContentStore for PgStore {
    fn categories(&self) -> AppResult<Vec<Category>> {
        let mut conn = self.conn()?;
        categories::table
            .order(categories::id.asc())
            .load::<Category>(&mut conn)
            .map_err(db_err)
    }

    fn create_published(&self, submission: &NewSubmission) -> AppResult<i64> {
        let mut conn = self.conn()?;
        conn.transaction::<_, AppError, _>(|conn| {
            insert_post(
                conn,
                &submission.title,
                &submission.content,
                submission.author_id,
                &submission.category_ids,
            )
        })
    }

    fn post(&self, post_id: i64, viewer_id: Option<i64>) -> AppResult<Option<PostView>> {
        let mut conn = self.conn()?;

        let found: Option<(PostRow, String)> = posts::table
            .inner_join(users::table)
            .filter(posts::id.eq(post_id))
            .select((posts::all_columns, users::username))
            .first(&mut conn)
            .optional()
            .map_err(db_err)?;
        let Some((row, username)) = found else {
            return Ok(None);
        };

        let categories: Vec<Category> = post_categories::table
            .inner_join(categories::table)
            .filter(post_categories::post_id.eq(post_id))
            .order(categories::id.asc())
            .select(categories::all_columns)
            .load(&mut conn)
            .map_err(db_err)?;

        let reactions: Vec<(i64, i64, String)> = post_reactions::table
            .filter(post_reactions::post_id.eq(post_id))
            .select((post_reactions::post_id, post_reactions::user_id, post_reactions::reaction_type))
            .load(&mut conn)
            .map_err(db_err)?;
        let (likes, dislikes, viewer_reaction) = tally(&reactions, post_id, viewer_id)?;

        Ok(Some(PostView {
            id: row.id,
            title: row.title,
            content: row.content,
            user_id: row.user_id,
            username,
            categories,
            created_at: row.created_at,
            updated_at: row.updated_at,
            likes,
            dislikes,
            viewer_reaction,
        }))
    }

    fn post_count(&self) -> AppResult<i64> {
        let mut conn = self.conn()?;
        posts::table.count().get_result(&mut conn).map_err(db_err)
    }

    fn author_of(&self, target: TargetType, id: i64) -> AppResult<Option<i64>> {
        let mut conn = self.conn()?;
        let author = match target {
            TargetType::Post => posts::table
                .find(id)
                .select(posts::user_id)
                .first::<i64>(&mut conn),
            TargetType::Comment => comments::table
                .find(id)
                .select(comments::user_id)
                .first::<i64>(&mut conn),
        };
        author.optional().map_err(db_err)
    }

    fn delete_post(&self, post_id: i64) -> AppResult<bool> {
        let mut conn = self.conn()?;
        // comments, reactions and category links go with it (ON DELETE CASCADE)
        let deleted = diesel::delete(posts::table.find(post_id))
            .execute(&mut conn)
            .map_err(db_err)?;
        Ok(deleted > 0)
    }

    fn delete_comment(&self, comment_id: i64) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(comments::table.find(comment_id))
            .execute(&mut conn)
            .map_err(db_err)?;
        Ok(deleted > 0)
    }

    fn create_comment(&self, post_id: i64, author_id: i64, content: &str) -> AppResult<i64> {
        let mut conn = self.conn()?;
        conn.transaction::<_, AppError, _>(|conn| {
            if !post_exists(conn, post_id)? {
                return Err(AppError::new(ErrorCode::PostNotFound, "post not found"));
            }
            diesel::insert_into(comments::table)
                .values(&NewComment { content, user_id: author_id, post_id })
                .returning(comments::id)
                .get_result::<i64>(conn)
                .map_err(|e| fk_err(e, ErrorCode::UserNotFound, "author does not exist"))
        })
    }

    fn comments(&self, post_id: i64, viewer_id: Option<i64>) -> AppResult<Vec<CommentView>> {
        let mut conn = self.conn()?;

        let rows: Vec<(CommentRow, String)> = comments::table
            .inner_join(users::table)
            .filter(comments::post_id.eq(post_id))
            .order((comments::created_at.asc(), comments::id.asc()))
            .select((comments::all_columns, users::username))
            .load(&mut conn)
            .map_err(db_err)?;

        let ids: Vec<i64> = rows.iter().map(|(c, _)| c.id).collect();
        let reactions: Vec<(i64, i64, String)> = comment_reactions::table
            .filter(comment_reactions::comment_id.eq_any(&ids))
            .select((
                comment_reactions::comment_id,
                comment_reactions::user_id,
                comment_reactions::reaction_type,
            ))
            .load(&mut conn)
            .map_err(db_err)?;

        rows.into_iter()
            .map(|(row, username)| {
                let (likes, dislikes, viewer_reaction) = tally(&reactions, row.id, viewer_id)?;
                Ok(CommentView {
                    id: row.id,
                    post_id: row.post_id,
                    content: row.content,
                    user_id: row.user_id,
                    username,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                    likes,
                    dislikes,
                    viewer_reaction,
                })
            })
            .collect()
    }

    fn react(
        &self,
        target: TargetType,
        target_id: i64,
        user_id: i64,
        reaction: Option<ReactionKind>,
    ) -> AppResult<()> {
        let mut conn = self.conn()?;
        conn.transaction::<_, AppError, _>(|conn| {
            let written = match target {
                TargetType::Post => {
                    if !post_exists(conn, target_id)? {
                        return Err(AppError::new(ErrorCode::PostNotFound, "post not found"));
                    }
                    match reaction {
                        Some(kind) => diesel::insert_into(post_reactions::table)
                            .values(&NewPostReaction {
                                user_id,
                                post_id: target_id,
                                reaction_type: kind.as_str(),
                            })
                            .on_conflict((post_reactions::user_id, post_reactions::post_id))
                            .do_update()
                            .set(post_reactions::reaction_type.eq(kind.as_str()))
                            .execute(conn),
                        None => diesel::delete(post_reactions::table.find((user_id, target_id)))
                            .execute(conn),
                    }
                }
                TargetType::Comment => {
                    if !comment_exists(conn, target_id)? {
                        return Err(AppError::new(ErrorCode::CommentNotFound, "comment not found"));
                    }
                    match reaction {
                        Some(kind) => diesel::insert_into(comment_reactions::table)
                            .values(&NewCommentReaction {
                                user_id,
                                comment_id: target_id,
                                reaction_type: kind.as_str(),
                            })
                            .on_conflict((comment_reactions::user_id, comment_reactions::comment_id))
                            .do_update()
                            .set(comment_reactions::reaction_type.eq(kind.as_str()))
                            .execute(conn),
                        None => diesel::delete(comment_reactions::table.find((user_id, target_id)))
                            .execute(conn),
                    }
                }
            };
            written.map_err(|e| fk_err(e, ErrorCode::UserNotFound, "user does not exist"))?;
            Ok(())
        })
    }
}

impl ModerationStore for PgStore {
    fn submit_pending_post(&self, submission: &NewSubmission) -> AppResult<i64> {
        let mut conn = self.conn()?;
        conn.transaction::<_, AppError, _>(|conn| {
            let pending_id: i64 = diesel::insert_into(pending_posts::table)
                .values(&NewPendingPost {
                    title: &submission.title,
                    content: &submission.content,
                    user_id: submission.author_id,
                })
                .returning(pending_posts::id)
                .get_result(conn)
                .map_err(|e| fk_err(e, ErrorCode::UserNotFound, "author does not exist"))?;

            if !submission.category_ids.is_empty() {
                let links: Vec<NewPendingPostCategory> = submission
                    .category_ids
                    .iter()
                    .map(|&category_id| NewPendingPostCategory { pending_post_id: pending_id, category_id })
                    .collect();
                diesel::insert_into(pending_post_categories::table)
                    .values(&links)
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .map_err(|e| fk_err(e, ErrorCode::InvalidCategory, "category does not exist"))?;
            }
            Ok(pending_id)
        })
    }

    fn pending_posts(&self) -> AppResult<Vec<PendingPost>> {
        let mut conn = self.conn()?;

        let rows: Vec<(PendingPostRow, String)> = pending_posts::table
            .inner_join(users::table)
            .filter(pending_posts::status.eq(ModerationStatus::Pending.as_str()))
            .order((pending_posts::created_at.desc(), pending_posts::id.desc()))
            .select((pending_posts::all_columns, users::username))
            .load(&mut conn)
            .map_err(db_err)?;

        let ids: Vec<i64> = rows.iter().map(|(p, _)| p.id).collect();
        let mut categories = categories_of_pending(&mut conn, &ids)?;

        rows.into_iter()
            .map(|(row, username)| {
                let cats = categories.remove(&row.id).unwrap_or_default();
                row.into_pending(username, cats)
            })
            .collect()
    }

    fn pending_post(&self, pending_id: i64) -> AppResult<Option<PendingPost>> {
        let mut conn = self.conn()?;

        let found: Option<(PendingPostRow, String)> = pending_posts::table
            .inner_join(users::table)
            .filter(pending_posts::id.eq(pending_id))
            .select((pending_posts::all_columns, users::username))
            .first(&mut conn)
            .optional()
            .map_err(db_err)?;
        let Some((row, username)) = found else {
            return Ok(None);
        };

        let cats = categories_of_pending(&mut conn, &[pending_id])?
            .remove(&pending_id)
            .unwrap_or_default();
        row.into_pending(username, cats).map(Some)
    }

    fn approve_pending_post(&self, pending_id: i64, moderator_id: i64) -> AppResult<i64> {
        let mut conn = self.conn()?;
        conn.transaction::<_, AppError, _>(|conn| {
            // Claiming the row is the single-winner step: a concurrent
            // approve/reject blocks on the row lock, then matches nothing.
            let claimed: Option<PendingPostRow> = diesel::update(
                pending_posts::table
                    .filter(pending_posts::id.eq(pending_id))
                    .filter(pending_posts::status.eq(ModerationStatus::Pending.as_str())),
            )
            .set((
                pending_posts::status.eq(ModerationStatus::Approved.as_str()),
                pending_posts::moderator_id.eq(Some(moderator_id)),
            ))
            .get_result(conn)
            .optional()?;

            let Some(pending) = claimed else {
                return Err(pending_post_miss(conn, pending_id));
            };

            let category_ids: Vec<i64> = pending_post_categories::table
                .filter(pending_post_categories::pending_post_id.eq(pending_id))
                .select(pending_post_categories::category_id)
                .load(conn)?;

            insert_post(conn, &pending.title, &pending.content, pending.user_id, &category_ids)
        })
    }

    fn reject_pending_post(&self, pending_id: i64, moderator_id: i64, reason: &str) -> AppResult<()> {
        let mut conn = self.conn()?;
        conn.transaction::<_, AppError, _>(|conn| {
            let updated = diesel::update(
                pending_posts::table
                    .filter(pending_posts::id.eq(pending_id))
                    .filter(pending_posts::status.eq(ModerationStatus::Pending.as_str())),
            )
            .set((
                pending_posts::status.eq(ModerationStatus::Rejected.as_str()),
                pending_posts::moderator_id.eq(Some(moderator_id)),
                pending_posts::reason.eq(Some(reason)),
            ))
            .execute(conn)?;

            if updated == 0 {
                return Err(pending_post_miss(conn, pending_id));
            }
            Ok(())
        })
    }

    fn file_report(&self, filing: &ReportFiling) -> AppResult<i64> {
        let mut conn = self.conn()?;
        conn.transaction::<_, AppError, _>(|conn| {
            if !lock_target(conn, filing.target_type, filing.content_id)? {
                return Err(AppError::new(ErrorCode::ContentNotFound, "reported content not found"));
            }

            diesel::insert_into(reports::table)
                .values(&NewReport {
                    target_type: filing.target_type.as_str(),
                    content_id: filing.content_id,
                    reporter_id: filing.reporter_id,
                    reason: &filing.reason,
                })
                .returning(reports::id)
                .get_result::<i64>(conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => AppError::new(
                        ErrorCode::DuplicateReport,
                        "content already reported by this user",
                    ),
                    other => fk_err(other, ErrorCode::UserNotFound, "reporter does not exist"),
                })
        })
    }

    fn pending_reports(&self) -> AppResult<Vec<Report>> {
        let mut conn = self.conn()?;
        let rows: Vec<(ReportRow, String)> = reports::table
            .inner_join(users::table)
            .filter(reports::status.eq(ModerationStatus::Pending.as_str()))
            .order((reports::created_at.desc(), reports::id.desc()))
            .select((reports::all_columns, users::username))
            .load(&mut conn)
            .map_err(db_err)?;

        rows.into_iter()
            .map(|(row, reporter_name)| row.into_report(reporter_name))
            .collect()
    }

    fn report(&self, report_id: i64) -> AppResult<Option<Report>> {
        let mut conn = self.conn()?;
        let found: Option<(ReportRow, String)> = reports::table
            .inner_join(users::table)
            .filter(reports::id.eq(report_id))
            .select((reports::all_columns, users::username))
            .first(&mut conn)
            .optional()
            .map_err(db_err)?;

        found
            .map(|(row, reporter_name)| row.into_report(reporter_name))
            .transpose()
    }

    fn adjudicate_report(
        &self,
        report_id: i64,
        admin_id: i64,
        decision: Decision,
        response: &str,
    ) -> AppResult<()> {
        let mut conn = self.conn()?;
        conn.transaction::<_, AppError, _>(|conn| {
            let claimed: Option<(String, i64)> = diesel::update(
                reports::table
                    .filter(reports::id.eq(report_id))
                    .filter(reports::status.eq(ModerationStatus::Pending.as_str())),
            )
            .set((
                reports::status.eq(decision.status().as_str()),
                reports::admin_id.eq(Some(admin_id)),
                reports::admin_response.eq(Some(response)),
                reports::updated_at.eq(Utc::now()),
            ))
            .returning((reports::target_type, reports::content_id))
            .get_result(conn)
            .optional()?;

            let Some((target_type, content_id)) = claimed else {
                return Err(report_miss(conn, report_id));
            };

            if decision == Decision::Approved {
                // Content already gone is fine: the report still closes.
                match parse_column::<TargetType>(&target_type)? {
                    TargetType::Post => diesel::delete(posts::table.find(content_id)).execute(conn)?,
                    TargetType::Comment => diesel::delete(comments::table.find(content_id)).execute(conn)?,
                };
            }
            Ok(())
        })
    }

    fn users(&self) -> AppResult<Vec<User>> {
        let mut conn = self.conn()?;
        let rows: Vec<UserRow> = users::table
            .order(users::id.asc())
            .load(&mut conn)
            .map_err(db_err)?;

        rows.into_iter()
            .map(|row| {
                Ok(User {
                    role: parse_column::<UserRole>(&row.role)?,
                    id: row.id,
                    username: row.username,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    fn user_role(&self, user_id: i64) -> AppResult<Option<UserRole>> {
        let mut conn = self.conn()?;
        let stored: Option<String> = users::table
            .find(user_id)
            .select(users::role)
            .first(&mut conn)
            .optional()
            .map_err(db_err)?;

        // an unrecognized stored role grants nothing
        Ok(stored.and_then(|raw| match raw.parse::<UserRole>() {
            Ok(role) => Some(role),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "stored role not recognized");
                None
            }
        }))
    }

    fn update_user_role(&self, user_id: i64, role: UserRole) -> AppResult<()> {
        let mut conn = self.conn()?;
        let updated = diesel::update(users::table.find(user_id))
            .set(users::role.eq(role.as_str()))
            .execute(&mut conn)
            .map_err(db_err)?;

        if updated == 0 {
            return Err(AppError::new(ErrorCode::UserNotFound, format!("user {user_id} not found")));
        }
        Ok(())
    }

    fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use forum_shared::clients::db::create_pool;
    use forum_shared::errors::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn rendered(err: AppError) -> (StatusCode, String) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn storage_faults_do_not_reach_the_client() {
        let err = db_err(DieselError::QueryBuilderError(
            "relation \"reports\" column secret_col".into(),
        ));
        assert_eq!(err.kind(), ErrorKind::Internal);

        let (status, body) = rendered(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("E0001"));
        assert!(!body.contains("secret_col"), "{body}");
    }

    #[tokio::test]
    async fn non_constraint_failures_fall_through_to_storage_faults() {
        let err = fk_err(
            DieselError::QueryBuilderError("column user_id of relation posts".into()),
            ErrorCode::UserNotFound,
            "author does not exist",
        );
        assert_eq!(err.kind(), ErrorKind::Internal);
        let (_, body) = rendered(err).await;
        assert!(!body.contains("relation posts"), "{body}");
    }

    #[tokio::test]
    async fn corrupt_rows_do_not_reach_the_client() {
        let err = parse_column::<UserRole>("superuser").unwrap_err();
        let (status, body) = rendered(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("superuser"), "{body}");
    }

    // Live-database tests. Run with `cargo test -- --ignored` against
    // FORUM_MODERATION__DATABASE_URL with the migrations applied.

    static SEQ: AtomicU32 = AtomicU32::new(0);

    fn live_store() -> PgStore {
        let url = std::env::var("FORUM_MODERATION__DATABASE_URL")
            .expect("FORUM_MODERATION__DATABASE_URL must be set");
        PgStore::new(create_pool(&url, 8).unwrap())
    }

    fn new_user(store: &PgStore, role: UserRole) -> i64 {
        let tag = format!(
            "t{}-{}-{}",
            std::process::id(),
            Utc::now().timestamp_micros(),
            SEQ.fetch_add(1, Ordering::SeqCst)
        );
        let mut conn = store.conn().unwrap();
        diesel::insert_into(users::table)
            .values((
                users::username.eq(&tag),
                users::email.eq(format!("{tag}@example.test")),
                users::role.eq(role.as_str()),
            ))
            .returning(users::id)
            .get_result(&mut conn)
            .unwrap()
    }

    fn submission(author_id: i64, category_ids: Vec<i64>) -> NewSubmission {
        NewSubmission {
            title: "title".into(),
            content: "content".into(),
            author_id,
            category_ids,
        }
    }

    fn filing(target_type: TargetType, content_id: i64, reporter_id: i64) -> ReportFiling {
        ReportFiling {
            target_type,
            content_id,
            reporter_id,
            reason: "spam".into(),
        }
    }

    fn posts_by(store: &PgStore, author_id: i64) -> i64 {
        let mut conn = store.conn().unwrap();
        posts::table
            .filter(posts::user_id.eq(author_id))
            .count()
            .get_result(&mut conn)
            .unwrap()
    }

    #[test]
    #[ignore]
    fn pg_concurrent_approvals_publish_once() {
        let store = live_store();
        let author = new_user(&store, UserRole::User);
        let moderators: Vec<i64> = (0..4).map(|_| new_user(&store, UserRole::Moderator)).collect();
        let pending_id = store.submit_pending_post(&submission(author, vec![1, 2])).unwrap();

        let results: Vec<AppResult<i64>> = std::thread::scope(|s| {
            let handles: Vec<_> = moderators
                .iter()
                .map(|&moderator| {
                    let store = &store;
                    s.spawn(move || store.approve_pending_post(pending_id, moderator))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.code(), ErrorCode::PendingPostAlreadyProcessed);
        }
        assert_eq!(posts_by(&store, author), 1);

        let record = store.pending_post(pending_id).unwrap().unwrap();
        assert_eq!(record.status, ModerationStatus::Approved);
        let post_id = results.into_iter().find_map(Result::ok).unwrap();
        let post = store.post(post_id, None).unwrap().unwrap();
        assert_eq!(post.categories.len(), 2);
    }

    #[test]
    #[ignore]
    fn pg_approve_and_reject_race_has_one_winner() {
        let store = live_store();
        let author = new_user(&store, UserRole::User);
        let moderator = new_user(&store, UserRole::Moderator);
        let pending_id = store.submit_pending_post(&submission(author, vec![])).unwrap();

        let (approved, rejected) = std::thread::scope(|s| {
            let a = s.spawn(|| store.approve_pending_post(pending_id, moderator));
            let r = s.spawn(|| store.reject_pending_post(pending_id, moderator, "off topic"));
            (a.join().unwrap(), r.join().unwrap())
        });

        assert!(approved.is_ok() != rejected.is_ok());
        let record = store.pending_post(pending_id).unwrap().unwrap();
        match approved {
            Ok(_) => {
                assert_eq!(record.status, ModerationStatus::Approved);
                assert_eq!(posts_by(&store, author), 1);
            }
            Err(_) => {
                assert_eq!(record.status, ModerationStatus::Rejected);
                assert_eq!(record.reason.as_deref(), Some("off topic"));
                assert_eq!(posts_by(&store, author), 0);
            }
        }
    }

    #[test]
    #[ignore]
    fn pg_missing_and_processed_records_are_distinct() {
        let store = live_store();
        let author = new_user(&store, UserRole::User);
        let moderator = new_user(&store, UserRole::Moderator);
        let admin = new_user(&store, UserRole::Admin);

        let err = store.approve_pending_post(i64::MAX, moderator).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PendingPostNotFound);

        let pending_id = store.submit_pending_post(&submission(author, vec![])).unwrap();
        store.reject_pending_post(pending_id, moderator, "dup").unwrap();
        let err = store.reject_pending_post(pending_id, moderator, "dup").unwrap_err();
        assert_eq!(err.code(), ErrorCode::PendingPostAlreadyProcessed);

        let err = store
            .adjudicate_report(i64::MAX, admin, Decision::Rejected, "")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ReportNotFound);
    }

    #[test]
    #[ignore]
    fn pg_unknown_category_rolls_back_the_submission() {
        let store = live_store();
        let author = new_user(&store, UserRole::User);

        let err = store
            .submit_pending_post(&submission(author, vec![1, 999_999]))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidCategory);

        let mut conn = store.conn().unwrap();
        let left: i64 = pending_posts::table
            .filter(pending_posts::user_id.eq(author))
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(left, 0);

        let err = store.create_published(&submission(author, vec![999_999])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidCategory);
        assert_eq!(posts_by(&store, author), 0);
    }

    #[test]
    #[ignore]
    fn pg_duplicate_filing_is_rejected() {
        let store = live_store();
        let author = new_user(&store, UserRole::User);
        let reporter = new_user(&store, UserRole::User);
        let post_id = store.create_published(&submission(author, vec![])).unwrap();

        store.file_report(&filing(TargetType::Post, post_id, reporter)).unwrap();
        let err = store
            .file_report(&filing(TargetType::Post, post_id, reporter))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateReport);

        let err = store
            .file_report(&filing(TargetType::Comment, i64::MAX, reporter))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ContentNotFound);
    }

    #[test]
    #[ignore]
    fn pg_concurrent_adjudications_close_once() {
        let store = live_store();
        let author = new_user(&store, UserRole::User);
        let reporter = new_user(&store, UserRole::User);
        let admins: Vec<i64> = (0..4).map(|_| new_user(&store, UserRole::Admin)).collect();
        let post_id = store.create_published(&submission(author, vec![])).unwrap();
        let report_id = store.file_report(&filing(TargetType::Post, post_id, reporter)).unwrap();

        let results: Vec<AppResult<()>> = std::thread::scope(|s| {
            let handles: Vec<_> = admins
                .iter()
                .enumerate()
                .map(|(i, &admin)| {
                    let decision = if i % 2 == 0 { Decision::Approved } else { Decision::Rejected };
                    let store = &store;
                    s.spawn(move || store.adjudicate_report(report_id, admin, decision, "done"))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.code(), ErrorCode::ReportAlreadyReviewed);
        }

        let report = store.report(report_id).unwrap().unwrap();
        let post_gone = !store.exists(TargetType::Post, post_id).unwrap();
        match report.status {
            ModerationStatus::Approved => assert!(post_gone),
            ModerationStatus::Rejected => assert!(!post_gone),
            ModerationStatus::Pending => panic!("report left pending"),
        }
    }

    #[test]
    #[ignore]
    fn pg_role_lookup_tracks_updates() {
        let store = live_store();
        let user = new_user(&store, UserRole::Moderator);
        assert_eq!(store.user_role(user).unwrap(), Some(UserRole::Moderator));

        store.update_user_role(user, UserRole::User).unwrap();
        assert_eq!(store.user_role(user).unwrap(), Some(UserRole::User));
        assert_eq!(store.user_role(i64::MAX).unwrap(), None);
    }
}
