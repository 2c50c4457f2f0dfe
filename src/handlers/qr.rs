// QR code endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    app::AppState,
    handlers::JsonBody,
    middleware::AuthenticatedUser,
    models::qr_code::LinkQrRequest,
    services::qr::{QrCodeView, QrService},
    utils::service_error::ServiceError,
};

/// Codes linked to any of the caller's pets
/// GET /api/qr
#[utoipa::path(
    get,
    path = "/api/qr",
    tag = "QR Codes",
    operation_id = "listQrCodes",
    responses(
        (status = 200, description = "Codes on the user's pets", body = [QrCodeView]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_user_qr_codes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<QrCodeView>>, ServiceError> {
    let codes = QrService::new(&state).for_user(user.user_id).await?;
    Ok(Json(codes))
}

/// GET /api/qr/{code}
#[utoipa::path(
    get,
    path = "/api/qr/{code}",
    tag = "QR Codes",
    operation_id = "getQrCode",
    params(("code" = String, Path, description = "Printed QR code")),
    responses(
        (status = 200, description = "The code", body = QrCodeView),
        (status = 404, description = "QR code not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_qr_code(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(code): Path<String>,
) -> Result<Json<QrCodeView>, ServiceError> {
    let qr_code = QrService::new(&state).get_by_code(&code).await?;
    Ok(Json(qr_code))
}

/// POST /api/qr/{code}/link
#[utoipa::path(
    post,
    path = "/api/qr/{code}/link",
    tag = "QR Codes",
    operation_id = "linkQrCode",
    params(("code" = String, Path, description = "Printed QR code")),
    request_body = LinkQrRequest,
    responses(
        (status = 200, description = "Linked code", body = QrCodeView),
        (status = 400, description = "QR code is not active"),
        (status = 404, description = "QR code or pet not found"),
        (status = 409, description = "QR code is already linked to another pet")
    ),
    security(("bearerAuth" = []))
)]
pub async fn link_qr_code(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(code): Path<String>,
    JsonBody(request): JsonBody<LinkQrRequest>,
) -> Result<Json<QrCodeView>, ServiceError> {
    let qr_code = QrService::new(&state)
        .link(user.user_id, &code, request.pet_id)
        .await?;
    Ok(Json(qr_code))
}

/// POST /api/qr/{code}/unlink
#[utoipa::path(
    post,
    path = "/api/qr/{code}/unlink",
    tag = "QR Codes",
    operation_id = "unlinkQrCode",
    params(("code" = String, Path, description = "Printed QR code")),
    responses(
        (status = 200, description = "Unlinked code", body = QrCodeView),
        (status = 404, description = "QR code not found or pet not owned")
    ),
    security(("bearerAuth" = []))
)]
pub async fn unlink_qr_code(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(code): Path<String>,
) -> Result<Json<QrCodeView>, ServiceError> {
    let qr_code = QrService::new(&state).unlink(user.user_id, &code).await?;
    Ok(Json(qr_code))
}
