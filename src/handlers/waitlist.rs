use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    app::AppState, handlers::JsonBody, models::waitlist::JoinWaitlistRequest,
    services::waitlist::WaitlistService, utils::service_error::ServiceError,
};

/// Join the pre-launch waitlist; no session required
/// POST /api/waitlist
#[utoipa::path(
    post,
    path = "/api/waitlist",
    tag = "Waitlist",
    operation_id = "joinWaitlist",
    request_body = JoinWaitlistRequest,
    responses(
        (status = 200, description = "Added to the waitlist"),
        (status = 400, description = "Email missing or already on the waitlist")
    )
)]
pub async fn join_waitlist(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<JoinWaitlistRequest>,
) -> Result<Json<Value>, ServiceError> {
    WaitlistService::new(&state).join(request.email).await?;
    Ok(Json(json!({ "success": true })))
}
