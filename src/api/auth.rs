//! Login and registration pages

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tera::Context as TeraContext;

use crate::api::middleware::{AppState, WebError};
use crate::services::{LoginInput, RegisterInput, UserServiceError};

const MSG_INVALID_CREDENTIALS: &str = "Invalid username or password!";
const MSG_FIELDS_REQUIRED: &str = "Username and password are required!";
const MSG_USERNAME_TAKEN: &str = "Username already exists! Please choose a different one.";
const MSG_REGISTERED: &str = "Registration successful! Please log in.";

/// Submitted login or registration form. Missing fields read as empty.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    pub message: Option<String>,
}

/// GET /
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginPageQuery>,
) -> Result<Response, WebError> {
    let mut context = TeraContext::new();
    if let Some(message) = query.message {
        context.insert("message", &message);
    }
    Ok(state.render("login", &context)?.into_response())
}

/// POST /
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, WebError> {
    match state
        .user_service
        .login(LoginInput::new(form.username, form.password))
        .await
    {
        Ok(session) => {
            tracing::info!("User {} logged in", session.username);
            let cookie = state.session_cookie(&session);
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/home")).into_response())
        }
        Err(UserServiceError::AuthenticationError(_)) => {
            render_with_error(&state, "login", StatusCode::UNAUTHORIZED, MSG_INVALID_CREDENTIALS)
        }
        Err(e) => Err(WebError::internal(format!("Login failed: {}", e))),
    }
}

/// GET /registration
pub async fn registration_page(State(state): State<AppState>) -> Result<Response, WebError> {
    Ok(state.render("registration", &TeraContext::new())?.into_response())
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, WebError> {
    match state
        .user_service
        .register(RegisterInput::new(form.username, form.password))
        .await
    {
        Ok(_) => {
            let location = format!("/?message={}", urlencoding::encode(MSG_REGISTERED));
            Ok(Redirect::to(&location).into_response())
        }
        Err(UserServiceError::ValidationError(_)) => {
            render_with_error(&state, "registration", StatusCode::BAD_REQUEST, MSG_FIELDS_REQUIRED)
        }
        Err(UserServiceError::UserExists(_)) => {
            render_with_error(&state, "registration", StatusCode::BAD_REQUEST, MSG_USERNAME_TAKEN)
        }
        Err(e) => Err(WebError::internal(format!("Registration failed: {}", e))),
    }
}

fn render_with_error(
    state: &AppState,
    view: &str,
    status: StatusCode,
    error: &str,
) -> Result<Response, WebError> {
    let mut context = TeraContext::new();
    context.insert("error", error);
    Ok((status, state.render(view, &context)?).into_response())
}
