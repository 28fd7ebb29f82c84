//! Wanderlist - a small travel planner

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wanderlist::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{SqlxSessionRepository, SqlxUserRepository},
    },
    services::{Catalog, UserService},
    views::ViewEngine,
};

/// How often expired sessions are purged
const SESSION_CLEANUP_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wanderlist=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Wanderlist...");

    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database).await?;
    pool.ping().await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let user_service = Arc::new(UserService::with_session_expiration(
        SqlxUserRepository::boxed(pool.clone()),
        SqlxSessionRepository::boxed(pool.clone()),
        config.session.expiration_days,
    ));

    let catalog = Catalog::from_config(&config.catalog);
    tracing::info!("Catalog loaded: {} destination(s)", catalog.destinations().len());

    let views = ViewEngine::new(&config.views.path)?;

    let state = AppState {
        user_service: user_service.clone(),
        catalog: Arc::new(catalog),
        views: Arc::new(views),
        session_config: Arc::new(config.session.clone()),
    };

    {
        let service = user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
                SESSION_CLEANUP_INTERVAL_SECS,
            ));
            loop {
                interval.tick().await;
                match service.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!("Removed {} expired session(s)", n),
                    Err(e) => tracing::warn!("Session cleanup failed: {}", e),
                }
            }
        });
    }

    let app = api::build_router(state, &config.server.public_path);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    pool.close().await;
    Ok(())
}
