// Profile endpoints. Responses use the `{ data }` / `{ error }` envelope.

use axum::extract::{Multipart, State};

use crate::{
    app::AppState,
    handlers::{read_multipart, JsonBody},
    middleware::AuthenticatedUser,
    models::profile::{AccountStatus, Profile, UpdateProfileRequest, UserAnalytics},
    services::user::UserService,
    utils::{api_response::ApiResponse, service_error::ServiceError},
};

/// GET /api/profile
#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "Profile",
    operation_id = "getProfile",
    responses(
        (status = 200, description = "`{ data: Profile }`", body = Profile),
        (status = 404, description = "Profile not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResponse<Profile> {
    UserService::new(&state)
        .get_profile(user.user_id)
        .await
        .into()
}

/// PUT /api/profile
#[utoipa::path(
    put,
    path = "/api/profile",
    tag = "Profile",
    operation_id = "updateProfile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "`{ data: Profile }`", body = Profile),
        (status = 400, description = "Validation failed")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<JsonBody<UpdateProfileRequest>, ServiceError>,
) -> ApiResponse<Profile> {
    let JsonBody(request) = match body {
        Ok(body) => body,
        Err(e) => return ApiResponse::err(&e),
    };
    UserService::new(&state)
        .update_profile(user.user_id, request)
        .await
        .into()
}

/// Whether onboarding is done and which profile fields are still empty
/// GET /api/profile/status
#[utoipa::path(
    get,
    path = "/api/profile/status",
    tag = "Profile",
    operation_id = "getAccountStatus",
    responses((status = 200, description = "`{ data: AccountStatus }`", body = AccountStatus)),
    security(("bearerAuth" = []))
)]
pub async fn account_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResponse<AccountStatus> {
    UserService::new(&state)
        .account_status(user.user_id)
        .await
        .into()
}

/// GET /api/profile/analytics
#[utoipa::path(
    get,
    path = "/api/profile/analytics",
    tag = "Profile",
    operation_id = "getUserAnalytics",
    responses((status = 200, description = "`{ data: UserAnalytics }`", body = UserAnalytics)),
    security(("bearerAuth" = []))
)]
pub async fn analytics(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResponse<UserAnalytics> {
    UserService::new(&state)
        .analytics(user.user_id)
        .await
        .into()
}

/// POST /api/profile/avatar
#[utoipa::path(
    post,
    path = "/api/profile/avatar",
    tag = "Profile",
    operation_id = "uploadProfileAvatar",
    responses(
        (status = 200, description = "`{ data: Profile }` with the new avatar URL", body = Profile),
        (status = 400, description = "No file or file too large")
    ),
    security(("bearerAuth" = []))
)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> ApiResponse<Profile> {
    let upload = match read_multipart(multipart).await {
        Ok(form) => form.file,
        Err(e) => return ApiResponse::err(&e),
    };
    let Some(upload) = upload else {
        return ApiResponse::err(&ServiceError::validation("No file uploaded", &["avatar"]));
    };

    UserService::new(&state)
        .upload_avatar(user.user_id, upload)
        .await
        .into()
}
