// Pet contact endpoints

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
    models::contact::{CreateContactRequest, DeleteContactRequest, PetContact, UpdateContactRequest},
    services::contact::ContactService,
    utils::service_error::ServiceError,
};

/// GET /api/pets/{id}/contacts
#[utoipa::path(
    get,
    path = "/api/pets/{id}/contacts",
    tag = "Contacts",
    operation_id = "listContacts",
    params(("id" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 200, description = "Contacts, primary first", body = [PetContact]),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
) -> Result<Json<Vec<PetContact>>, ServiceError> {
    let contacts = ContactService::new(&state)
        .list(user.user_id, pet_id)
        .await?;
    Ok(Json(contacts))
}

/// POST /api/pets/{id}/contacts
#[utoipa::path(
    post,
    path = "/api/pets/{id}/contacts",
    tag = "Contacts",
    operation_id = "createContact",
    params(("id" = Uuid, Path, description = "Pet ID")),
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Contact created", body = PetContact),
        (status = 400, description = "Missing required fields"),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_contact(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    JsonBody(request): JsonBody<CreateContactRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let contact = ContactService::new(&state)
        .create(user.user_id, pet_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// PUT /api/pets/{id}/contacts
#[utoipa::path(
    put,
    path = "/api/pets/{id}/contacts",
    tag = "Contacts",
    operation_id = "updateContact",
    params(("id" = Uuid, Path, description = "Pet ID")),
    request_body = UpdateContactRequest,
    responses(
        (status = 200, description = "Updated contact", body = PetContact),
        (status = 400, description = "Contact ID is required"),
        (status = 404, description = "Pet or contact not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_contact(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateContactRequest>,
) -> Result<Json<PetContact>, ServiceError> {
    let contact = ContactService::new(&state)
        .update(user.user_id, pet_id, request)
        .await?;
    Ok(Json(contact))
}

/// DELETE /api/pets/{id}/contacts
#[utoipa::path(
    delete,
    path = "/api/pets/{id}/contacts",
    tag = "Contacts",
    operation_id = "deleteContact",
    params(("id" = Uuid, Path, description = "Pet ID")),
    request_body = DeleteContactRequest,
    responses(
        (status = 200, description = "Contact deleted"),
        (status = 400, description = "Contact ID is required, or it is the only contact"),
        (status = 404, description = "Pet or contact not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_contact(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    JsonBody(request): JsonBody<DeleteContactRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    ContactService::new(&state)
        .delete(user.user_id, pet_id, request.contact_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}
