//! Want-to-go list handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tera::Context as TeraContext;

use crate::api::middleware::{AppState, AuthSession, WebError};
use crate::services::UserServiceError;

#[derive(Debug, Deserialize)]
pub struct WantToGoForm {
    pub destination: String,
}

/// POST /wanttogo
///
/// Responds with an empty 200 on success.
pub async fn add(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Form(form): Form<WantToGoForm>,
) -> Result<Response, WebError> {
    match state
        .user_service
        .add_to_want_to_go(&session.username, &form.destination)
        .await
    {
        Ok(()) => Ok(StatusCode::OK.into_response()),
        Err(UserServiceError::AlreadyListed(_)) => Err(WebError::bad_request(
            "This destination is already in your Want-to-Go list!",
        )),
        Err(e) => Err(WebError::internal(format!(
            "Failed to add {:?} for {}: {}",
            form.destination, session.username, e
        ))),
    }
}

/// GET /wanttogo
pub async fn list(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Html<String>, WebError> {
    let destinations = state
        .user_service
        .want_to_go_list(&session.username)
        .await
        .map_err(|e| WebError::internal(format!("Failed to load want-to-go list: {}", e)))?;

    let mut context = TeraContext::new();
    context.insert("destinations", &destinations);
    state.render("wanttogo", &context)
}
