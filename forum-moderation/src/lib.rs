pub mod config;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use forum_shared::middleware::metrics_middleware;
use forum_shared::errors::AppResult;
use forum_shared::types::auth::{RoleLookup, TokenSecret, UserRole};

use crate::config::AppConfig;
use crate::routes::{admin_routes, content_routes, health, mod_routes, user_routes};
use crate::store::ModerationStore;

pub struct AppState {
    pub store: Arc<dyn ModerationStore>,
    pub config: AppConfig,
    /// `None` when no Prometheus recorder is installed (tests).
    pub metrics: Option<PrometheusHandle>,
}

impl TokenSecret for AppState {
    fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }
}

impl RoleLookup for AppState {
    fn current_role(&self, user_id: i64) -> AppResult<Option<UserRole>> {
        self.store.user_role(user_id)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let mod_routes = Router::new()
        .route("/pending", get(mod_routes::list_pending))
        .route("/pending/:id/approve", post(mod_routes::approve))
        .route("/pending/:id/reject", post(mod_routes::reject));

    let admin_routes = Router::new()
        .route("/reports", get(admin_routes::list_reports))
        .route("/reports/:id", post(admin_routes::adjudicate_report))
        .route("/users", get(admin_routes::list_users))
        .route("/users/:id/role", put(admin_routes::update_role));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/categories", get(content_routes::list_categories))
        .route("/posts", post(content_routes::create_post))
        .route(
            "/posts/:id",
            get(content_routes::get_post).delete(content_routes::delete_post),
        )
        .route(
            "/posts/:id/comments",
            get(content_routes::list_comments).post(content_routes::create_comment),
        )
        .route("/posts/:id/reaction", put(content_routes::react_to_post))
        .route("/comments/:id", delete(content_routes::delete_comment))
        .route("/comments/:id/reaction", put(content_routes::react_to_comment))
        .route("/reports", post(user_routes::create_report))
        .nest("/mod", mod_routes)
        .nest("/admin", admin_routes)
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
