use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Token errors
/// - E2xxx: User and role errors
/// - E6xxx: Moderation errors (pending posts, reports)
/// - E7xxx: Content errors (posts, comments, categories)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,

    // Token (E1xxx)
    TokenExpired,
    TokenInvalid,

    // User (E2xxx)
    UserNotFound,
    InvalidRole,
    CannotDemoteSelf,

    // Moderation (E6xxx)
    ReportNotFound,
    ReportAlreadyReviewed,
    DuplicateReport,
    InvalidReportTarget,
    PendingPostNotFound,
    PendingPostAlreadyProcessed,

    // Content (E7xxx)
    PostNotFound,
    CommentNotFound,
    ContentNotFound,
    InvalidCategory,
}

/// Coarse failure classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Duplicate,
    Unauthorized,
    Internal,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",

            // Token
            Self::TokenExpired => "E1004",
            Self::TokenInvalid => "E1005",

            // User
            Self::UserNotFound => "E2001",
            Self::InvalidRole => "E2002",
            Self::CannotDemoteSelf => "E2003",

            // Moderation
            Self::ReportNotFound => "E6001",
            Self::ReportAlreadyReviewed => "E6002",
            Self::DuplicateReport => "E6003",
            Self::InvalidReportTarget => "E6004",
            Self::PendingPostNotFound => "E6005",
            Self::PendingPostAlreadyProcessed => "E6006",

            // Content
            Self::PostNotFound => "E7001",
            Self::CommentNotFound => "E7002",
            Self::ContentNotFound => "E7003",
            Self::InvalidCategory => "E7004",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InternalError => ErrorKind::Internal,
            Self::ValidationError | Self::InvalidRole
            | Self::InvalidReportTarget | Self::InvalidCategory => ErrorKind::Validation,
            Self::NotFound | Self::UserNotFound | Self::ReportNotFound
            | Self::PendingPostNotFound | Self::PostNotFound | Self::CommentNotFound
            | Self::ContentNotFound => ErrorKind::NotFound,
            Self::ReportAlreadyReviewed | Self::PendingPostAlreadyProcessed => ErrorKind::Conflict,
            Self::Forbidden | Self::CannotDemoteSelf => ErrorKind::Forbidden,
            Self::DuplicateReport => ErrorKind::Duplicate,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => ErrorKind::Unauthorized,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::Duplicate => StatusCode::CONFLICT,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known { code: ErrorCode, message: String },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Server-side fault. The message is logged, never sent to the client.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(anyhow::Error::msg(message.into()))
    }

    /// The concrete code behind this error; storage failures collapse to
    /// `NotFound` or `InternalError`.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Internal(_) => ErrorCode::InternalError,
            AppError::Database(diesel::result::Error::NotFound) => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::InternalError,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message } => {
                (code.status_code(), ApiErrorResponse::new(code.code(), message))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_and_not_found_stay_distinct() {
        assert_eq!(ErrorCode::PendingPostNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(ErrorCode::PendingPostAlreadyProcessed.kind(), ErrorKind::Conflict);
        assert_eq!(ErrorCode::ReportAlreadyReviewed.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::ReportNotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn duplicate_report_maps_to_conflict_status() {
        let err = AppError::new(ErrorCode::DuplicateReport, "already reported");
        assert_eq!(err.kind(), ErrorKind::Duplicate);
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn storage_errors_hide_details() {
        let err = AppError::from(diesel::result::Error::QueryBuilderError(
            "relation \"reports\" column secret_col".into(),
        ));
        assert_eq!(err.kind(), ErrorKind::Internal);

        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "E0001");
        assert!(!body.to_string().contains("secret_col"));
    }

    #[tokio::test]
    async fn internal_messages_stay_server_side() {
        let err = AppError::internal("pool timed out connecting to 10.0.0.5:5432");
        assert_eq!(err.code(), ErrorCode::InternalError);

        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "internal server error");
        assert!(!body.to_string().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn known_errors_keep_their_message() {
        let (status, body) = body_of(AppError::new(ErrorCode::ReportNotFound, "report not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "report not found");
    }

    #[test]
    fn every_code_is_unique() {
        let codes = [
            ErrorCode::InternalError, ErrorCode::ValidationError, ErrorCode::NotFound,
            ErrorCode::Unauthorized, ErrorCode::Forbidden,
            ErrorCode::TokenExpired, ErrorCode::TokenInvalid,
            ErrorCode::UserNotFound, ErrorCode::InvalidRole, ErrorCode::CannotDemoteSelf,
            ErrorCode::ReportNotFound, ErrorCode::ReportAlreadyReviewed, ErrorCode::DuplicateReport,
            ErrorCode::InvalidReportTarget, ErrorCode::PendingPostNotFound,
            ErrorCode::PendingPostAlreadyProcessed, ErrorCode::PostNotFound,
            ErrorCode::CommentNotFound, ErrorCode::ContentNotFound, ErrorCode::InvalidCategory,
        ];
        let mut seen: Vec<&str> = codes.iter().map(|c| c.code()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), codes.len());
    }
}
