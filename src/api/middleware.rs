//! HTTP middleware and shared request plumbing
//!
//! - `AppState`: services shared by every handler
//! - `WebError`: plain-text error responses
//! - `require_auth`: the session gate in front of protected routes
//! - `AuthSession`: extractor for the session attached by the gate

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::fmt::Display;
use std::sync::Arc;
use tera::Context as TeraContext;

use crate::config::SessionConfig;
use crate::models::Session;
use crate::services::{Catalog, UserService};
use crate::views::ViewEngine;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub catalog: Arc<Catalog>,
    pub views: Arc<ViewEngine>,
    pub session_config: Arc<SessionConfig>,
}

impl AppState {
    /// Render a view into an HTML response body
    pub fn render(&self, view: &str, context: &TeraContext) -> Result<Html<String>, WebError> {
        self.views
            .render(view, context)
            .map(Html)
            .map_err(|e| WebError::internal(format!("{:#}", e)))
    }

    /// `Set-Cookie` value carrying a new session id
    pub fn session_cookie(&self, session: &Session) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.session_config.cookie_name,
            session.id,
            self.session_config.max_age_seconds()
        )
    }
}

/// Error returned by handlers, rendered as a plain-text body
#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Log the cause and hide it from the client
    pub fn internal(cause: impl Display) -> Self {
        tracing::error!("{}", cause);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Session id from the named cookie, if present and non-empty
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Let the request through with a live session, otherwise redirect to `/`
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let Some(token) = extract_session_token(request.headers(), &state.session_config.cookie_name)
    else {
        return Ok(Redirect::to("/").into_response());
    };

    let session = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(|e| WebError::internal(format!("Session validation failed: {:#}", e)))?;

    match session {
        Some(session) => {
            request.extensions_mut().insert(AuthSession(session));
            Ok(next.run(request).await)
        }
        None => Ok(Redirect::to("/").into_response()),
    }
}

/// The session attached by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthSession(pub Session);

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or_else(|| Redirect::to("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_extract_session_token() {
        let headers = headers_with_cookie("theme=dark; session=abc-123; lang=en");

        assert_eq!(
            extract_session_token(&headers, "session"),
            Some("abc-123".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_custom_name() {
        let headers = headers_with_cookie("sid=xyz");

        assert_eq!(extract_session_token(&headers, "sid"), Some("xyz".to_string()));
        assert_eq!(extract_session_token(&headers, "session"), None);
    }

    #[test]
    fn test_extract_session_token_ignores_prefix_match() {
        let headers = headers_with_cookie("session_old=stale");

        assert_eq!(extract_session_token(&headers, "session"), None);
    }

    #[test]
    fn test_extract_session_token_empty_value() {
        let headers = headers_with_cookie("session=");

        assert_eq!(extract_session_token(&headers, "session"), None);
    }

    #[test]
    fn test_extract_session_token_no_cookie_header() {
        assert_eq!(extract_session_token(&HeaderMap::new(), "session"), None);
    }

    #[test]
    fn test_web_error_response() {
        let response = WebError::bad_request("nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = WebError::internal("db down").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
