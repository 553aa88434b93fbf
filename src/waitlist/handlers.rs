use axum::{
    extract::{Request, State},
    http::Method,
    routing::{any, get},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    error::SignupError,
    state::AppState,
    waitlist::{
        dto::SignupResponse,
        services::{build_record, is_valid_email, read_payload},
    },
};

pub fn signup_routes() -> Router<AppState> {
    // Every method lands in the handler so the 405 carries the JSON body.
    Router::new().route("/waitlist", any(signup))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(|| async { "ok" }))
}

#[instrument(skip_all, fields(method = %request.method()))]
pub async fn signup(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<SignupResponse>, SignupError> {
    if request.method() != Method::POST {
        warn!("signup with wrong method");
        return Err(SignupError::MethodNotAllowed);
    }

    let Some(store) = state.store.clone() else {
        error!("signup store credentials are not configured");
        return Err(SignupError::NotConfigured);
    };

    let (parts, body) = request.into_parts();
    let payload = read_payload(&parts.headers, body).await.map_err(|e| {
        error!(error = %format!("{e:#}"), "unexpected error reading signup body");
        SignupError::Unexpected(e)
    })?;

    let honeypot = payload.company.as_deref().unwrap_or_default().trim();
    if !honeypot.is_empty() {
        info!("honeypot filled; dropping signup");
        return Ok(Json(SignupResponse::success()));
    }

    let email = payload.email.as_deref().unwrap_or_default().trim().to_string();
    if !is_valid_email(&email) {
        warn!("invalid email");
        return Err(SignupError::InvalidEmail);
    }

    let record = build_record(email, &payload, &parts.headers);
    store.upsert_signup(&record).await.map_err(|e| {
        error!(error = %e, "insert failed");
        SignupError::from(e)
    })?;

    info!(email = %record.email, "waitlist signup stored");
    Ok(Json(SignupResponse::success()))
}
