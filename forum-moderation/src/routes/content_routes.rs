use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use forum_shared::errors::AppResult;
use forum_shared::middleware::OptionalAuthUser;
use forum_shared::types::api::ApiResponse;
use forum_shared::types::auth::AuthUser;

use super::{validate_body, Created};
use crate::models::{Category, CommentView, PostView, ReactionKind, TargetType};
use crate::services::content::{self, Submission};
use crate::AppState;

// --- Request types ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(max = 200, message = "title must be at most 200 characters"))]
    pub title: String,
    #[validate(length(max = 20000, message = "content is too long"))]
    pub content: String,
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(max = 5000, message = "comment is too long"))]
    pub content: String,
}

/// `{"reaction": "like" | "dislike" | null}`; null clears.
#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub reaction: Option<ReactionKind>,
}

// --- Catalog ---

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Category>>>> {
    let categories = content::categories(state.store.as_ref())?;
    Ok(Json(ApiResponse::ok(categories)))
}

// --- Posts ---

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreatePostRequest>,
) -> AppResult<Json<ApiResponse<Submission>>> {
    validate_body(&body)?;

    let outcome = content::submit_post(
        state.store.as_ref(),
        &auth,
        &body.title,
        &body.content,
        &body.category_ids,
        state.config.require_post_approval,
    )?;

    let message = match outcome {
        Submission::Pending(_) => "post submitted for moderation",
        Submission::Published(_) => "post published",
    };
    Ok(Json(ApiResponse::ok_with_message(outcome, message)))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Json<ApiResponse<PostView>>> {
    let post = content::post(state.store.as_ref(), &post_id, viewer.map(|v| v.id))?;
    Ok(Json(ApiResponse::ok(post)))
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    content::delete(state.store.as_ref(), &auth, TargetType::Post, &post_id)?;
    Ok(Json(ApiResponse::ok("post deleted")))
}

pub async fn react_to_post(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(post_id): Path<String>,
    Json(body): Json<ReactionRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    content::react(state.store.as_ref(), &auth, TargetType::Post, &post_id, body.reaction)?;
    Ok(Json(ApiResponse::ok("reaction saved")))
}

// --- Comments ---

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<CommentView>>>> {
    let comments = content::comments(state.store.as_ref(), &post_id, viewer.map(|v| v.id))?;
    Ok(Json(ApiResponse::ok(comments)))
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(post_id): Path<String>,
    Json(body): Json<CreateCommentRequest>,
) -> AppResult<Json<ApiResponse<Created>>> {
    validate_body(&body)?;
    let id = content::create_comment(state.store.as_ref(), &auth, &post_id, &body.content)?;
    Ok(Json(ApiResponse::ok(Created { id })))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(comment_id): Path<String>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    content::delete(state.store.as_ref(), &auth, TargetType::Comment, &comment_id)?;
    Ok(Json(ApiResponse::ok("comment deleted")))
}

pub async fn react_to_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(comment_id): Path<String>,
    Json(body): Json<ReactionRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    content::react(state.store.as_ref(), &auth, TargetType::Comment, &comment_id, body.reaction)?;
    Ok(Json(ApiResponse::ok("reaction saved")))
}
