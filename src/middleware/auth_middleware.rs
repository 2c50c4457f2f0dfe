// Authentication middleware for protected routes
// Validates session JWTs and injects AuthenticatedUser into request extensions

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::{app::AppState, middleware::auth::AuthenticatedUser};

fn unauthorized() -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" })))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware function that validates the session and adds AuthenticatedUser to extensions
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return unauthorized().into_response();
    };

    let claims = match app_state.jwt_service.validate_access_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Session validation failed: {}", e);
            return unauthorized().into_response();
        },
    };

    match AuthenticatedUser::from_claims(claims, token) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        },
        None => {
            tracing::warn!("Session subject is not a user id");
            unauthorized().into_response()
        },
    }
}

/// Extractor for AuthenticatedUser from request extensions
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(unauthorized)
    }
}
