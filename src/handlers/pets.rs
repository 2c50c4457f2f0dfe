// Pet REST endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    app::AppState,
    handlers::{read_multipart, JsonBody},
    middleware::AuthenticatedUser,
    models::pet::{CreatePetRequest, Pet, UpdatePetRequest},
    services::{pet::PetService, qr::QrService},
    utils::service_error::ServiceError,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetQuery {
    #[serde(default)]
    pub include_relations: Option<String>,
}

impl PetQuery {
    fn wants_relations(&self) -> bool {
        self.include_relations.as_deref() == Some("true")
    }
}

/// List the caller's pets
/// GET /api/pets
#[utoipa::path(
    get,
    path = "/api/pets",
    tag = "Pets",
    operation_id = "listPets",
    responses(
        (status = 200, description = "Pets of the signed-in user, by name", body = [Pet]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_pets(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Pet>>, ServiceError> {
    let pets = PetService::new(&state).get_user_pets(user.user_id).await?;
    Ok(Json(pets))
}

/// Create a pet
/// POST /api/pets
#[utoipa::path(
    post,
    path = "/api/pets",
    tag = "Pets",
    operation_id = "createPet",
    request_body = CreatePetRequest,
    responses(
        (status = 201, description = "Pet created", body = Pet),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_pet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(request): JsonBody<CreatePetRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let pet = PetService::new(&state)
        .create_pet(user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(pet)))
}

/// Get one pet, optionally with contacts, maintenance and veterinarian
/// GET /api/pets/{id}
#[utoipa::path(
    get,
    path = "/api/pets/{id}",
    tag = "Pets",
    operation_id = "getPet",
    params(
        ("id" = Uuid, Path, description = "Pet ID"),
        ("includeRelations" = Option<String>, Query, description = "\"true\" to embed sub-resources")
    ),
    responses(
        (status = 200, description = "The pet", body = crate::models::pet::PetWithRelations),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_pet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    Query(query): Query<PetQuery>,
) -> Result<Response, ServiceError> {
    let service = PetService::new(&state);
    if query.wants_relations() {
        let pet = service.get_pet_with_relations(user.user_id, pet_id).await?;
        Ok(Json(pet).into_response())
    } else {
        let pet = service.get_pet(user.user_id, pet_id).await?;
        Ok(Json(pet).into_response())
    }
}

/// Update a pet
/// PUT /api/pets/{id}
#[utoipa::path(
    put,
    path = "/api/pets/{id}",
    tag = "Pets",
    operation_id = "updatePet",
    params(("id" = Uuid, Path, description = "Pet ID")),
    request_body = UpdatePetRequest,
    responses(
        (status = 200, description = "Updated pet", body = Pet),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_pet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdatePetRequest>,
) -> Result<Json<Pet>, ServiceError> {
    let pet = PetService::new(&state)
        .update_pet(user.user_id, pet_id, request)
        .await?;
    Ok(Json(pet))
}

/// Delete a pet and everything attached to it
/// DELETE /api/pets/{id}
#[utoipa::path(
    delete,
    path = "/api/pets/{id}",
    tag = "Pets",
    operation_id = "deletePet",
    params(("id" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 200, description = "Pet deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_pet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    PetService::new(&state)
        .delete_pet(user.user_id, pet_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// Replace the pet's avatar (multipart field `avatar`)
/// POST /api/pets/{id}/avatar
#[utoipa::path(
    post,
    path = "/api/pets/{id}/avatar",
    tag = "Pets",
    operation_id = "uploadPetAvatar",
    params(("id" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 200, description = "Pet with its new avatar URL", body = Pet),
        (status = 400, description = "No file or file too large"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Pet>, ServiceError> {
    let form = read_multipart(multipart).await?;
    let upload = form
        .file
        .ok_or_else(|| ServiceError::validation("No file uploaded", &["avatar"]))?;

    let pet = PetService::new(&state)
        .upload_avatar(user.user_id, pet_id, upload)
        .await?;
    Ok(Json(pet))
}

/// QR codes linked to the pet
/// GET /api/pets/{id}/qr-codes
#[utoipa::path(
    get,
    path = "/api/pets/{id}/qr-codes",
    tag = "QR Codes",
    operation_id = "listPetQrCodes",
    params(("id" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 200, description = "Codes linked to the pet", body = [crate::services::qr::QrCodeView]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_qr_codes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let codes = QrService::new(&state).for_pet(user.user_id, pet_id).await?;
    Ok(Json(codes))
}
