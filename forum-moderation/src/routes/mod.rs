pub mod admin_routes;
pub mod content_routes;
pub mod health;
pub mod mod_routes;
pub mod user_routes;

use serde::Serialize;
use validator::Validate;

use forum_shared::errors::{AppError, AppResult, ErrorCode};

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: i64,
}

pub(crate) fn validate_body<T: Validate>(body: &T) -> AppResult<()> {
    body.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))
}
