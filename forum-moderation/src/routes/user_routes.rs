use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use forum_shared::errors::AppResult;
use forum_shared::types::api::ApiResponse;
use forum_shared::types::auth::AuthUser;

use super::{validate_body, Created};
use crate::services::report_queue;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    /// `post` or `comment`
    pub content_type: String,
    #[validate(range(min = 1, message = "content_id must be a positive id"))]
    pub content_id: i64,
    #[validate(length(max = 2000, message = "reason is too long"))]
    pub reason: String,
}

pub async fn create_report(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateReportRequest>,
) -> AppResult<Json<ApiResponse<Created>>> {
    validate_body(&body)?;

    let id = report_queue::file(
        state.store.as_ref(),
        &body.content_type,
        body.content_id,
        auth.id,
        &body.reason,
    )?;

    Ok(Json(ApiResponse::ok_with_message(Created { id }, "report submitted")))
}
