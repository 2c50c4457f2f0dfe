// Signed-in landing data: profile, pets and what is due next

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::AuthenticatedUser,
    models::{maintenance::UpcomingMaintenance, pet::Pet, profile::Profile},
    services::{maintenance::MaintenanceService, pet::PetService, user::UserService},
    utils::service_error::ServiceError,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub pet_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub profile: Option<Profile>,
    pub pets: Vec<Pet>,
    pub selected_pet: Option<Pet>,
    pub upcoming_maintenance: Vec<UpcomingMaintenance>,
}

/// The requested pet when it is one of the user's, otherwise the first pet
fn select_pet(pets: &[Pet], requested: Option<Uuid>) -> Option<Pet> {
    requested
        .and_then(|id| pets.iter().find(|pet| pet.id == id))
        .or_else(|| pets.first())
        .cloned()
}

/// GET /api/dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    operation_id = "getDashboard",
    params(("petId" = Option<Uuid>, Query, description = "Pet to select")),
    responses(
        (status = 200, description = "Dashboard data", body = Dashboard),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, ServiceError> {
    let profile = match UserService::new(&state).get_profile(user.user_id).await {
        Ok(profile) => Some(profile),
        Err(ServiceError::NotFound(_)) => None,
        Err(e) => return Err(e),
    };
    let pets = PetService::new(&state).get_user_pets(user.user_id).await?;
    let selected_pet = select_pet(&pets, query.pet_id);
    let upcoming_maintenance = MaintenanceService::new(&state)
        .upcoming(user.user_id, None)
        .await?;

    Ok(Json(Dashboard {
        profile,
        pets,
        selected_pet,
        upcoming_maintenance,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::pet_store::tests::pet;

    #[test]
    fn test_select_requested_or_first_pet() {
        let owner = Uuid::new_v4();
        let pets = vec![pet(owner, "Bella"), pet(owner, "Rex")];

        assert_eq!(select_pet(&pets, Some(pets[1].id)).map(|p| p.name), Some("Rex".into()));
        assert_eq!(select_pet(&pets, None).map(|p| p.name), Some("Bella".into()));
        assert_eq!(
            select_pet(&pets, Some(Uuid::new_v4())).map(|p| p.name),
            Some("Bella".into())
        );
        assert!(select_pet(&[], None).is_none());
    }
}
