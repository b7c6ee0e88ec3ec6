//! HTTP request handlers

use super::assets::serve_static;
use super::render::{render_halted, render_page};
use super::session::{Session, SESSION_COOKIE};
use super::types::{ChatForm, ConversationResponse, ErrorResponse, VersionResponse};
use super::{AppState, Backend};
use crate::chat::{ChatEngine, Submission};
use crate::conversation::{Conversation, Event};
use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::{headers::Cookie, TypedHeader};

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // The chat page
        .route("/", get(index))
        // Form actions; both redirect back to `/`
        .route("/chat", post(send_chat))
        .route("/reset", post(reset_chat))
        // JSON snapshot of the caller's conversation
        .route("/api/conversation", get(get_conversation))
        // Embedded stylesheet
        .route("/assets/*path", get(serve_static))
        .route("/version", get(get_version))
        .with_state(state)
}

fn session_id(cookies: Option<&TypedHeader<Cookie>>) -> Option<&str> {
    cookies.and_then(|TypedHeader(cookie)| cookie.get(SESSION_COOKIE))
}

/// The chat engine, or the startup error if configuration failed
fn ready(state: &AppState) -> Result<&ChatEngine, AppError> {
    match &state.backend {
        Backend::Ready(engine) => Ok(engine),
        Backend::Halted(message) => Err(AppError::Halted(message.clone())),
    }
}

/// Attach the session cookie to a response if the session was just created
fn with_session_cookie(session: &Session, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if let Some(cookie) = session.cookie() {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "Session cookie is not a valid header value"),
        }
    }
    response
}

// ============================================================
// Page
// ============================================================

// Reads never create a session. A caller without one sees the seed.

async fn index(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Html<String>, AppError> {
    ready(&state)?;
    let page = match state.sessions.lookup(session_id(cookies.as_ref())) {
        Some(conversation) => render_page(&*conversation.lock().await),
        None => render_page(&Conversation::new()),
    };
    Ok(Html(page))
}

// ============================================================
// Form actions
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
    form: Result<Form<ChatForm>, FormRejection>,
) -> Result<Response, AppError> {
    let engine = ready(&state)?;
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let session = state.sessions.resolve(session_id(cookies.as_ref()));

    let outcome = {
        let mut conversation = session.conversation.lock().await;
        engine.submit(&mut conversation, &form.message).await
    };

    match outcome {
        Submission::Ignored => {
            tracing::debug!(session = %session.id, "Ignoring empty submission");
        }
        Submission::Answered => {
            tracing::info!(session = %session.id, "Answered travel query");
        }
        Submission::Failed(e) => {
            tracing::warn!(
                session = %session.id,
                error = %e,
                kind = e.kind.as_str(),
                "Generation failed, error recorded as reply"
            );
        }
    }

    Ok(with_session_cookie(&session, Redirect::to("/")))
}

async fn reset_chat(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Redirect, AppError> {
    ready(&state)?;
    let id = session_id(cookies.as_ref());

    // Without a session there is nothing but the seed to reset to
    if let Some(conversation) = state.sessions.lookup(id) {
        conversation.lock().await.apply(Event::Reset);
        tracing::info!(session = id.unwrap_or_default(), "Conversation reset");
    }

    Ok(Redirect::to("/"))
}

// ============================================================
// JSON endpoints
// ============================================================

async fn get_conversation(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Json<ConversationResponse>, AppError> {
    ready(&state).map_err(AppError::into_json)?;
    let body = match state.sessions.lookup(session_id(cookies.as_ref())) {
        Some(conversation) => ConversationResponse::from(&*conversation.lock().await),
        None => ConversationResponse::from(&Conversation::new()),
    };
    Ok(Json(body))
}

async fn get_version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        model: match &state.backend {
            Backend::Ready(engine) => Some(engine.model_id().to_string()),
            Backend::Halted(_) => None,
        },
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    /// Startup failed; render the error page
    Halted(String),
    /// Startup failed; JSON body for API callers
    Unavailable(String),
}

impl AppError {
    fn into_json(self) -> Self {
        match self {
            AppError::Halted(message) | AppError::Unavailable(message) => {
                AppError::Unavailable(message)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Halted(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, Html(render_halted(&message))).into_response()
            }
            AppError::Unavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new(message)),
            )
                .into_response(),
        }
    }
}
