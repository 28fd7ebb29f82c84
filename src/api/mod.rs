//! HTTP layer - handlers and routing
//!
//! Public routes: the login page (`/`) and registration (`/registration`,
//! `/register`). Everything else that is routed sits behind
//! [`middleware::require_auth`]. Unrouted paths fall through to files in the
//! public directory.

pub mod auth;
pub mod middleware;
pub mod pages;
pub mod search;
pub mod want_to_go;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::path::Path;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use middleware::{AppState, AuthSession, WebError};

/// Build the complete router with middleware
pub fn build_router(state: AppState, public_path: &Path) -> Router {
    let public_routes = Router::new()
        .route("/", get(auth::login_page).post(auth::login))
        .route("/registration", get(auth::registration_page))
        .route("/register", post(auth::register));

    let protected_routes = Router::new()
        .merge(pages::router())
        .route("/wanttogo", get(want_to_go::list).post(want_to_go::add))
        .route("/search", post(search::search))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback_service(ServeDir::new(public_path))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
