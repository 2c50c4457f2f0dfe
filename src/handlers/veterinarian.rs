// Pet veterinarian endpoints. A pet has at most one veterinarian row.

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
    models::veterinarian::{
        CreateVeterinarianRequest, DeleteVeterinarianRequest, PetVeterinarian,
        UpdateVeterinarianRequest,
    },
    services::veterinarian::VeterinarianService,
    utils::service_error::ServiceError,
};

/// GET /api/pets/{id}/veterinarian
#[utoipa::path(
    get,
    path = "/api/pets/{id}/veterinarian",
    tag = "Veterinarian",
    operation_id = "listVeterinarian",
    params(("id" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 200, description = "Zero or one veterinarian", body = [PetVeterinarian]),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_veterinarian(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
) -> Result<Json<Vec<PetVeterinarian>>, ServiceError> {
    let vets = VeterinarianService::new(&state)
        .list(user.user_id, pet_id)
        .await?;
    Ok(Json(vets))
}

/// POST /api/pets/{id}/veterinarian
#[utoipa::path(
    post,
    path = "/api/pets/{id}/veterinarian",
    tag = "Veterinarian",
    operation_id = "createVeterinarian",
    params(("id" = Uuid, Path, description = "Pet ID")),
    request_body = CreateVeterinarianRequest,
    responses(
        (status = 201, description = "Veterinarian created", body = PetVeterinarian),
        (status = 400, description = "Missing required fields"),
        (status = 404, description = "Pet not found or access denied"),
        (status = 409, description = "Pet already has a veterinarian")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_veterinarian(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    JsonBody(request): JsonBody<CreateVeterinarianRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let vet = VeterinarianService::new(&state)
        .create(user.user_id, pet_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(vet)))
}

/// PUT /api/pets/{id}/veterinarian
#[utoipa::path(
    put,
    path = "/api/pets/{id}/veterinarian",
    tag = "Veterinarian",
    operation_id = "updateVeterinarian",
    params(("id" = Uuid, Path, description = "Pet ID")),
    request_body = UpdateVeterinarianRequest,
    responses(
        (status = 200, description = "Updated veterinarian", body = PetVeterinarian),
        (status = 400, description = "Veterinarian ID is required"),
        (status = 404, description = "Pet or veterinarian not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_veterinarian(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateVeterinarianRequest>,
) -> Result<Json<PetVeterinarian>, ServiceError> {
    let vet = VeterinarianService::new(&state)
        .update(user.user_id, pet_id, request)
        .await?;
    Ok(Json(vet))
}

/// DELETE /api/pets/{id}/veterinarian
#[utoipa::path(
    delete,
    path = "/api/pets/{id}/veterinarian",
    tag = "Veterinarian",
    operation_id = "deleteVeterinarian",
    params(("id" = Uuid, Path, description = "Pet ID")),
    request_body = DeleteVeterinarianRequest,
    responses(
        (status = 200, description = "Veterinarian deleted"),
        (status = 400, description = "Veterinarian ID is required"),
        (status = 404, description = "Pet or veterinarian not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_veterinarian(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    JsonBody(request): JsonBody<DeleteVeterinarianRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    VeterinarianService::new(&state)
        .delete(user.user_id, pet_id, request.vet_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}
