use std::sync::Arc;

use forum_moderation::config::{AppConfig, StorageBackend};
use forum_moderation::store::{MemoryStore, ModerationStore, PgStore};
use forum_moderation::AppState;
use forum_shared::clients::db::create_pool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    forum_shared::middleware::init_tracing("forum-moderation");

    let config = AppConfig::load()?;
    let port = config.port;

    let store: Arc<dyn ModerationStore> = match config.storage {
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database_url, config.db_pool_size)?;
            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, state is lost on restart");
            Arc::new(MemoryStore::with_default_admin()?)
        }
    };

    let metrics = Some(forum_shared::middleware::init_metrics()?);

    let state = Arc::new(AppState { store, config, metrics });
    let app = forum_moderation::router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "forum-moderation starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
