//! Catalog search

use axum::{extract::State, response::Html, Form};
use serde::Deserialize;
use tera::Context as TeraContext;

use crate::api::middleware::{AppState, WebError};

/// The search box posts its value as `Search`
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(rename = "Search")]
    pub search: String,
}

/// POST /search
pub async fn search(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Html<String>, WebError> {
    let search_key = form.search.to_lowercase();
    let results = state.catalog.search(&search_key);
    tracing::debug!("Search {:?} matched {} destination(s)", search_key, results.len());

    let mut context = TeraContext::new();
    context.insert("search_key", &search_key);
    context.insert("results", &results);
    state.render("searchresults", &context)
}
