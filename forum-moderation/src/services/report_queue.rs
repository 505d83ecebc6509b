//! Report queue: complaints against published posts and comments, closed by
//! an admin. Approval deletes the reported content.

use metrics::counter;

use forum_shared::errors::{AppError, AppResult, ErrorCode};

use super::require_text;
use crate::models::{Decision, Report, ReportFiling, TargetType};
use crate::store::ModerationStore;

pub fn parse_target(raw: &str) -> AppResult<TargetType> {
    raw.parse::<TargetType>().map_err(|_| {
        AppError::new(
            ErrorCode::InvalidReportTarget,
            "content type must be 'post' or 'comment'",
        )
    })
}

/// File a report. A reporter gets one report per target, ever.
pub fn file<S: ModerationStore + ?Sized>(
    store: &S,
    target_type: &str,
    content_id: i64,
    reporter_id: i64,
    reason: &str,
) -> AppResult<i64> {
    let target_type = parse_target(target_type)?;
    if content_id <= 0 {
        return Err(AppError::validation("content_id must be a positive id"));
    }
    require_text(reason, "reason")?;

    let filing = ReportFiling {
        target_type,
        content_id,
        reporter_id,
        reason: reason.trim().to_string(),
    };
    let report_id = store.file_report(&filing)?;

    tracing::info!(
        report_id,
        reporter_id,
        content_id,
        target_type = target_type.as_str(),
        "report filed"
    );
    counter!("moderation_reports_total", "decision" => "filed").increment(1);
    Ok(report_id)
}

pub fn adjudicate<S: ModerationStore + ?Sized>(
    store: &S,
    report_id: i64,
    admin_id: i64,
    decision: Decision,
    response: &str,
) -> AppResult<()> {
    let status = decision.status().as_str();
    store
        .adjudicate_report(report_id, admin_id, decision, response.trim())
        .inspect_err(|e| tracing::warn!(report_id, admin_id, error = %e, "adjudication refused"))?;

    tracing::info!(report_id, admin_id, decision = status, "report closed");
    counter!("moderation_reports_total", "decision" => status).increment(1);
    Ok(())
}

pub fn list_pending<S: ModerationStore + ?Sized>(store: &S) -> AppResult<Vec<Report>> {
    store.pending_reports()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModerationStatus;
    use crate::services::fixtures::{self, ADMIN, ALICE, MODERATOR};
    use crate::store::ContentStore;
    use forum_shared::errors::ErrorKind;

    #[test]
    fn approved_report_deletes_post_and_rejected_keeps_it() {
        let store = fixtures::store();
        store.insert_post_with_id(42, MODERATOR, "spam", "buy now").unwrap();
        store.insert_post_with_id(43, MODERATOR, "fine", "hello").unwrap();

        let first = file(&store, "post", 42, ALICE, "spam").unwrap();
        let second = file(&store, "post", 43, ALICE, "rude").unwrap();
        assert_eq!((first, second), (1, 2));

        adjudicate(&store, 1, ADMIN, Decision::Approved, "removed").unwrap();
        adjudicate(&store, 2, ADMIN, Decision::Rejected, "looks fine").unwrap();

        assert!(!store.exists(TargetType::Post, 42).unwrap());
        assert!(store.exists(TargetType::Post, 43).unwrap());

        let closed = store.report(2).unwrap().unwrap();
        assert_eq!(closed.status, ModerationStatus::Rejected);
        assert_eq!(closed.admin_id, Some(ADMIN));
        assert_eq!(closed.admin_response.as_deref(), Some("looks fine"));
    }

    #[test]
    fn approving_a_post_report_removes_its_comments() {
        let store = fixtures::store();
        store.insert_post_with_id(42, MODERATOR, "t", "c").unwrap();
        let comment_id = store.create_comment(42, ALICE, "me too").unwrap();

        let report_id = file(&store, "post", 42, ALICE, "spam").unwrap();
        adjudicate(&store, report_id, ADMIN, Decision::Approved, "").unwrap();

        assert!(!store.exists(TargetType::Comment, comment_id).unwrap());
    }

    #[test]
    fn comment_reports_delete_only_the_comment() {
        let store = fixtures::store();
        store.insert_post_with_id(42, MODERATOR, "t", "c").unwrap();
        let comment_id = store.create_comment(42, ALICE, "rude").unwrap();

        let report_id = file(&store, "comment", comment_id, MODERATOR, "insult").unwrap();
        adjudicate(&store, report_id, ADMIN, Decision::Approved, "removed").unwrap();

        assert!(!store.exists(TargetType::Comment, comment_id).unwrap());
        assert!(store.exists(TargetType::Post, 42).unwrap());
    }

    #[test]
    fn filing_validates_its_inputs() {
        let store = fixtures::store();
        store.insert_post_with_id(42, MODERATOR, "t", "c").unwrap();

        let bad_type = file(&store, "user", 42, ALICE, "spam").unwrap_err();
        assert_eq!(bad_type.code(), ErrorCode::InvalidReportTarget);
        assert_eq!(bad_type.kind(), ErrorKind::Validation);

        let no_reason = file(&store, "post", 42, ALICE, "").unwrap_err();
        assert_eq!(no_reason.kind(), ErrorKind::Validation);

        let zero_id = file(&store, "post", 0, ALICE, "spam").unwrap_err();
        assert_eq!(zero_id.kind(), ErrorKind::Validation);

        let missing = file(&store, "post", 7, ALICE, "spam").unwrap_err();
        assert_eq!(missing.code(), ErrorCode::ContentNotFound);
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn second_report_on_same_target_is_duplicate() {
        let store = fixtures::store();
        store.insert_post_with_id(42, MODERATOR, "t", "c").unwrap();
        let report_id = file(&store, "post", 42, ALICE, "spam").unwrap();

        let dup = file(&store, "post", 42, ALICE, "still spam").unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::Duplicate);

        // still blocked once the first report is closed
        adjudicate(&store, report_id, ADMIN, Decision::Rejected, "no").unwrap();
        let dup = file(&store, "post", 42, ALICE, "really").unwrap_err();
        assert_eq!(dup.code(), ErrorCode::DuplicateReport);

        // another reporter is independent
        assert!(file(&store, "post", 42, MODERATOR, "spam").is_ok());
    }

    #[test]
    fn closed_reports_conflict_and_missing_reports_are_not_found() {
        let store = fixtures::store();
        store.insert_post_with_id(42, MODERATOR, "t", "c").unwrap();
        let report_id = file(&store, "post", 42, ALICE, "spam").unwrap();
        adjudicate(&store, report_id, ADMIN, Decision::Rejected, "").unwrap();

        let again = adjudicate(&store, report_id, ADMIN, Decision::Approved, "").unwrap_err();
        assert_eq!(again.kind(), ErrorKind::Conflict);
        assert!(store.exists(TargetType::Post, 42).unwrap());

        let missing = adjudicate(&store, 500, ADMIN, Decision::Rejected, "").unwrap_err();
        assert_eq!(missing.code(), ErrorCode::ReportNotFound);
    }

    #[test]
    fn pending_list_carries_reporter_name_newest_first() {
        let store = fixtures::store();
        store.insert_post_with_id(42, MODERATOR, "t", "c").unwrap();
        let older = file(&store, "post", 42, ALICE, "spam").unwrap();
        let newer = file(&store, "post", 42, MODERATOR, "spam").unwrap();

        let listed = list_pending(&store).unwrap();
        let ids: Vec<i64> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newer, older]);
        assert_eq!(listed[1].reporter_name, "alice");
    }

    #[test]
    fn concurrent_adjudications_apply_once() {
        let store = fixtures::store();
        store.insert_post_with_id(42, MODERATOR, "t", "c").unwrap();
        let report_id = file(&store, "post", 42, ALICE, "spam").unwrap();

        let results: Vec<AppResult<()>> = std::thread::scope(|s| {
            let handles: Vec<_> = [Decision::Approved, Decision::Rejected, Decision::Approved]
                .into_iter()
                .map(|d| {
                    let store = &store;
                    s.spawn(move || adjudicate(store, report_id, ADMIN, d, ""))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let report = store.report(report_id).unwrap().unwrap();
        let deleted = !store.exists(TargetType::Post, 42).unwrap();
        assert_eq!(deleted, report.status == ModerationStatus::Approved);
    }
}
