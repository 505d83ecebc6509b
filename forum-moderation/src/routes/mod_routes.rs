use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use forum_shared::errors::AppResult;
use forum_shared::middleware::ModeratorUser;
use forum_shared::types::api::ApiResponse;

use super::validate_body;
use crate::models::PendingPost;
use crate::services::coordinator;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RejectRequest {
    #[validate(length(max = 2000, message = "reason is too long"))]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ApprovedPost {
    pub post_id: i64,
}

pub async fn list_pending(
    State(state): State<Arc<AppState>>,
    ModeratorUser(moderator): ModeratorUser,
) -> AppResult<Json<ApiResponse<Vec<PendingPost>>>> {
    let pending = coordinator::list_pending_posts(state.store.as_ref(), &moderator)?;
    Ok(Json(ApiResponse::ok(pending)))
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    ModeratorUser(moderator): ModeratorUser,
    Path(pending_id): Path<String>,
) -> AppResult<Json<ApiResponse<ApprovedPost>>> {
    let post_id = coordinator::approve_pending_post(state.store.as_ref(), &moderator, &pending_id)?;
    Ok(Json(ApiResponse::ok_with_message(
        ApprovedPost { post_id },
        "post approved and published",
    )))
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    ModeratorUser(moderator): ModeratorUser,
    Path(pending_id): Path<String>,
    Json(body): Json<RejectRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    validate_body(&body)?;
    coordinator::reject_pending_post(state.store.as_ref(), &moderator, &pending_id, &body.reason)?;
    Ok(Json(ApiResponse::ok("post rejected")))
}
