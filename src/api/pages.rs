//! Home and destination content pages

use axum::{extract::State, response::Html, routing::get, Router};
use tera::Context as TeraContext;

use crate::api::middleware::{AppState, AuthSession, WebError};

/// Content pages served at `/<name>` from the view of the same name
pub const STATIC_PAGES: &[&str] = &[
    "annapurna",
    "bali",
    "hiking",
    "inca",
    "islands",
    "cities",
    "rome",
    "paris",
    "santorini",
];

/// Routes for `/home` and every static page
pub fn router() -> Router<AppState> {
    STATIC_PAGES
        .iter()
        .fold(Router::new().route("/home", get(home)), |router, &page| {
            router.route(
                &format!("/{}", page),
                get(move |State(state): State<AppState>| static_page(state, page)),
            )
        })
}

/// GET /home
pub async fn home(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Html<String>, WebError> {
    let mut context = TeraContext::new();
    context.insert("username", &session.username);
    context.insert("destinations", state.catalog.destinations());
    state.render("home", &context)
}

async fn static_page(state: AppState, view: &'static str) -> Result<Html<String>, WebError> {
    state.render(view, &TeraContext::new())
}
