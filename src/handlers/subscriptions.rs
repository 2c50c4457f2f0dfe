// Pet subscription endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    app::AppState,
    handlers::JsonBody,
    middleware::AuthenticatedUser,
    models::subscription::{
        PetSubscription, PlanType, SubscriptionRequest, UpdateSubscriptionRequest,
    },
    services::subscription::{plans, SubscriptionPlan, SubscriptionService},
    utils::{service_error::ServiceError, validation::require_id},
};

const SUBSCRIPTION_ID_REQUIRED: &str = "Subscription ID is required";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetIdQuery {
    pub pet_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionIdQuery {
    pub id: Option<Uuid>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    #[serde(alias = "plan_type")]
    pub plan_type: Option<String>,
}

/// Subscription of one pet (`?petId`) or of every pet the user owns
/// GET /api/pets/subscriptions
#[utoipa::path(
    get,
    path = "/api/pets/subscriptions",
    tag = "Subscriptions",
    operation_id = "listSubscriptions",
    params(("petId" = Option<Uuid>, Query, description = "Limit to one pet")),
    responses(
        (status = 200, description = "One subscription (or null) with petId, otherwise a summary per pet", body = [crate::models::subscription::PetSubscriptionSummary]),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PetIdQuery>,
) -> Result<Response, ServiceError> {
    let service = SubscriptionService::new(&state);
    match query.pet_id {
        Some(pet_id) => {
            let subscription = service.get_pet_subscription(user.user_id, pet_id).await?;
            Ok(Json(subscription).into_response())
        },
        None => {
            let summaries = service.user_pet_subscriptions(user.user_id).await?;
            Ok(Json(summaries).into_response())
        },
    }
}

/// Start or switch a pet's plan
/// POST /api/pets/subscriptions
#[utoipa::path(
    post,
    path = "/api/pets/subscriptions",
    tag = "Subscriptions",
    operation_id = "createSubscription",
    request_body = SubscriptionRequest,
    responses(
        (status = 201, description = "Subscription on the new plan", body = PetSubscription),
        (status = 400, description = "Missing fields or invalid plan type"),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(request): JsonBody<SubscriptionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (Some(pet_id), Some(plan_type)) = (request.pet_id, request.plan_type.as_deref()) else {
        return Err(ServiceError::MissingFields(vec![
            "petId".to_string(),
            "planType".to_string(),
        ]));
    };
    let plan = PlanType::parse_input(plan_type)?;

    let subscription = SubscriptionService::new(&state)
        .subscribe(user.user_id, pet_id, plan)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// PUT /api/pets/subscriptions
#[utoipa::path(
    put,
    path = "/api/pets/subscriptions",
    tag = "Subscriptions",
    operation_id = "updateSubscription",
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Updated subscription", body = PetSubscription),
        (status = 400, description = "Invalid plan type or status"),
        (status = 404, description = "Subscription not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(request): JsonBody<UpdateSubscriptionRequest>,
) -> Result<Json<PetSubscription>, ServiceError> {
    let subscription_id = require_id(
        request.subscription_id,
        SUBSCRIPTION_ID_REQUIRED,
        "subscriptionId",
    )?;
    let changes = request.fields.changes()?;
    let subscription = SubscriptionService::new(&state)
        .update_subscription(user.user_id, subscription_id, changes)
        .await?;
    Ok(Json(subscription))
}

/// Cancel at the end of the current period
/// DELETE /api/pets/subscriptions?id=
#[utoipa::path(
    delete,
    path = "/api/pets/subscriptions",
    tag = "Subscriptions",
    operation_id = "cancelSubscription",
    params(("id" = Uuid, Query, description = "Subscription ID")),
    responses(
        (status = 200, description = "Subscription marked to cancel", body = PetSubscription),
        (status = 400, description = "Missing id"),
        (status = 404, description = "Subscription not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<SubscriptionIdQuery>,
) -> Result<Json<PetSubscription>, ServiceError> {
    let subscription_id = require_id(query.id, SUBSCRIPTION_ID_REQUIRED, "id")?;
    let subscription = SubscriptionService::new(&state)
        .cancel_by_id(user.user_id, subscription_id)
        .await?;
    Ok(Json(subscription))
}

/// Plan catalogue; no session required
/// GET /api/pets/subscriptions/plans
#[utoipa::path(
    get,
    path = "/api/pets/subscriptions/plans",
    tag = "Subscriptions",
    operation_id = "listPlans",
    responses(
        (status = 200, description = "Available plans, cheapest first", body = [SubscriptionPlan])
    )
)]
pub async fn list_plans() -> Json<Vec<SubscriptionPlan>> {
    Json(plans())
}

/// GET /api/pets/subscriptions/{petId}
#[utoipa::path(
    get,
    path = "/api/pets/subscriptions/{petId}",
    tag = "Subscriptions",
    operation_id = "getPetSubscription",
    params(("petId" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 200, description = "Latest subscription, or null", body = PetSubscription),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_pet_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
) -> Result<Json<Option<PetSubscription>>, ServiceError> {
    let subscription = SubscriptionService::new(&state)
        .get_pet_subscription(user.user_id, pet_id)
        .await?;
    Ok(Json(subscription))
}

/// POST /api/pets/subscriptions/{petId}
#[utoipa::path(
    post,
    path = "/api/pets/subscriptions/{petId}",
    tag = "Subscriptions",
    operation_id = "subscribePet",
    params(("petId" = Uuid, Path, description = "Pet ID")),
    request_body = PlanRequest,
    responses(
        (status = 201, description = "Subscription on the new plan", body = PetSubscription),
        (status = 400, description = "Missing or invalid plan type"),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn subscribe_pet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    JsonBody(request): JsonBody<PlanRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let plan_type = request
        .plan_type
        .ok_or_else(|| ServiceError::MissingFields(vec!["planType".to_string()]))?;
    let plan = PlanType::parse_input(&plan_type)?;

    let subscription = SubscriptionService::new(&state)
        .subscribe(user.user_id, pet_id, plan)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// Update the pet's latest subscription or start one
/// PUT /api/pets/subscriptions/{petId}
#[utoipa::path(
    put,
    path = "/api/pets/subscriptions/{petId}",
    tag = "Subscriptions",
    operation_id = "upsertPetSubscription",
    params(("petId" = Uuid, Path, description = "Pet ID")),
    request_body = SubscriptionRequest,
    responses(
        (status = 200, description = "Stored subscription", body = PetSubscription),
        (status = 400, description = "Invalid plan type or status"),
        (status = 404, description = "Pet not found or access denied")
    ),
    security(("bearerAuth" = []))
)]
pub async fn upsert_pet_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    JsonBody(request): JsonBody<SubscriptionRequest>,
) -> Result<Json<PetSubscription>, ServiceError> {
    let changes = request.changes()?;
    let subscription = SubscriptionService::new(&state)
        .upsert_pet_subscription(user.user_id, pet_id, changes)
        .await?;
    Ok(Json(subscription))
}

/// DELETE /api/pets/subscriptions/{petId}
#[utoipa::path(
    delete,
    path = "/api/pets/subscriptions/{petId}",
    tag = "Subscriptions",
    operation_id = "cancelPetSubscription",
    params(("petId" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 200, description = "Subscription marked to cancel", body = PetSubscription),
        (status = 404, description = "Pet or subscription not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn cancel_pet_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
) -> Result<Json<PetSubscription>, ServiceError> {
    let subscription = SubscriptionService::new(&state)
        .cancel(user.user_id, pet_id)
        .await?;
    Ok(Json(subscription))
}
