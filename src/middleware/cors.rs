use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, HeaderValue},
        Method, Request, Response, StatusCode,
    },
    middleware::Next,
};
use tracing::debug;

use crate::{app::AppState, app_config::AppConfig};

/// Origin to echo back, if the request's origin is allowed.
/// A `*` entry reflects any origin outside production so credentials still work.
pub fn allowed_origin(config: &AppConfig, origin: Option<&str>) -> Option<HeaderValue> {
    let origin = origin?;
    let has_wildcard = config.cors_allowed_origins.iter().any(|o| o == "*");

    let allowed = if has_wildcard && !config.is_production() {
        debug!("CORS: Reflecting origin for development: {}", origin);
        true
    } else {
        let listed = config.cors_allowed_origins.iter().any(|o| o == origin);
        if !listed {
            debug!("CORS: Origin not in whitelist: {}", origin);
        }
        listed
    };

    if allowed {
        HeaderValue::from_str(origin).ok()
    } else {
        None
    }
}

/// CORS middleware driven by `CORS_ALLOWED_ORIGINS`
pub async fn cors_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response<Body>, StatusCode> {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());
    let allowed = allowed_origin(&state.config, origin);

    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        if let Some(allowed) = allowed {
            let headers = response.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allowed);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("content-type, authorization, accept, origin, x-requested-with"),
            );
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("3600"));
        }
        *response.status_mut() = StatusCode::OK;
        return Ok(response);
    }

    let mut response = next.run(req).await;

    if let Some(allowed) = allowed {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allowed);
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }

    Ok(response)
}
