//! Landing endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;

use crate::auth::extract_bearer_token;
use crate::AppState;

/// GET / serves the landing page.
///
/// Callers presenting a valid bearer token are sent straight to the
/// catalog (303); anonymous callers get a JSON welcome payload. An
/// invalid token is treated as anonymous here rather than rejected,
/// since the landing page is public.
#[tracing::instrument(skip(state, headers))]
pub async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let authenticated = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .is_some_and(|token| state.jwt.validate_access_token(token).is_ok());

    if authenticated {
        return Redirect::to("/catalogue/").into_response();
    }

    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "message": "Bienvenue à la boutique",
        "catalogue": "/catalogue/",
    }))
    .into_response()
}
