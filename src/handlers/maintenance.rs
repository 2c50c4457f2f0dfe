// Pet maintenance endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    app::AppState,
    handlers::JsonBody,
    middleware::AuthenticatedUser,
    models::maintenance::{
        CreateMaintenanceRequest, DeleteMaintenanceRequest, PetMaintenance,
        UpdateMaintenanceRequest,
    },
    services::maintenance::MaintenanceService,
    utils::service_error::ServiceError,
};

/// GET /api/pets/{id}/maintenance
#[utoipa::path(
    get,
    path = "/api/pets/{id}/maintenance",
    tag = "Maintenance",
    operation_id = "listMaintenance",
    params(("id" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 200, description = "Maintenance items by start date", body = [PetMaintenance]),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_maintenance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
) -> Result<Json<Vec<PetMaintenance>>, ServiceError> {
    let items = MaintenanceService::new(&state)
        .list(user.user_id, pet_id)
        .await?;
    Ok(Json(items))
}

/// POST /api/pets/{id}/maintenance
#[utoipa::path(
    post,
    path = "/api/pets/{id}/maintenance",
    tag = "Maintenance",
    operation_id = "createMaintenance",
    params(("id" = Uuid, Path, description = "Pet ID")),
    request_body = CreateMaintenanceRequest,
    responses(
        (status = 201, description = "Maintenance item created", body = PetMaintenance),
        (status = 400, description = "Missing fields or invalid frequency"),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_maintenance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    JsonBody(request): JsonBody<CreateMaintenanceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = MaintenanceService::new(&state)
        .create(user.user_id, pet_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/pets/{id}/maintenance
#[utoipa::path(
    put,
    path = "/api/pets/{id}/maintenance",
    tag = "Maintenance",
    operation_id = "updateMaintenance",
    params(("id" = Uuid, Path, description = "Pet ID")),
    request_body = UpdateMaintenanceRequest,
    responses(
        (status = 200, description = "Updated item", body = PetMaintenance),
        (status = 400, description = "Maintenance ID is required, or invalid frequency"),
        (status = 404, description = "Pet or maintenance item not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_maintenance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateMaintenanceRequest>,
) -> Result<Json<PetMaintenance>, ServiceError> {
    let item = MaintenanceService::new(&state)
        .update(user.user_id, pet_id, request)
        .await?;
    Ok(Json(item))
}

/// DELETE /api/pets/{id}/maintenance
#[utoipa::path(
    delete,
    path = "/api/pets/{id}/maintenance",
    tag = "Maintenance",
    operation_id = "deleteMaintenance",
    params(("id" = Uuid, Path, description = "Pet ID")),
    request_body = DeleteMaintenanceRequest,
    responses(
        (status = 200, description = "Maintenance item deleted"),
        (status = 400, description = "Maintenance ID is required"),
        (status = 404, description = "Pet or maintenance item not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_maintenance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    JsonBody(request): JsonBody<DeleteMaintenanceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    MaintenanceService::new(&state)
        .delete(user.user_id, pet_id, request.maintenance_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}
