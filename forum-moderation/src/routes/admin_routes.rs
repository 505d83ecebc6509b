use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use forum_shared::errors::AppResult;
use forum_shared::middleware::AdminUser;
use forum_shared::types::api::ApiResponse;

use super::validate_body;
use crate::models::{Report, User};
use crate::services::coordinator;
use crate::AppState;

// --- Request types ---

#[derive(Debug, Deserialize, Validate)]
pub struct AdjudicateRequest {
    pub action: String, // "approve" or "reject"
    #[serde(default)]
    #[validate(length(max = 2000, message = "response is too long"))]
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

// --- Reports ---

pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<ApiResponse<Vec<Report>>>> {
    let reports = coordinator::list_reports(state.store.as_ref(), &admin)?;
    Ok(Json(ApiResponse::ok(reports)))
}

pub async fn adjudicate_report(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(report_id): Path<String>,
    Json(body): Json<AdjudicateRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    validate_body(&body)?;
    coordinator::adjudicate_report(
        state.store.as_ref(),
        &admin,
        &report_id,
        &body.action,
        &body.response,
    )?;
    Ok(Json(ApiResponse::ok("report processed")))
}

// --- Users ---

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    let users = coordinator::list_users(state.store.as_ref(), &admin)?;
    Ok(Json(ApiResponse::ok(users)))
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateRoleRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    coordinator::change_role(state.store.as_ref(), &admin, &user_id, &body.role)?;
    Ok(Json(ApiResponse::ok("role updated")))
}
