// Recurring maintenance items and their due dates

use chrono::Utc;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{
        maintenance::{
            upcoming, CreateMaintenanceRequest, MaintenanceChanges, PetMaintenance,
            UpcomingMaintenance, UpdateMaintenanceRequest,
        },
        pet::{ensure_owned, Pet},
    },
    utils::{service_error::ServiceError, validation::require_id},
};

pub const MAINTENANCE_ID_REQUIRED: &str = "Maintenance ID is required";

pub struct MaintenanceService {
    diesel_pool: DieselPool,
}

impl MaintenanceService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, owner_id: Uuid, pet_id: Uuid) -> Result<Vec<PetMaintenance>, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;
        Ok(PetMaintenance::list_for_pet(&mut conn, pet_id).await?)
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        request: CreateMaintenanceRequest,
    ) -> Result<PetMaintenance, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let item = request.into_new_maintenance(pet_id)?;
        let created = PetMaintenance::create(&mut conn, &item).await?;
        info!("Added maintenance item {} to pet {}", created.id, pet_id);
        Ok(created)
    }

    #[instrument(skip(self, request), fields(maintenance_id = ?request.maintenance_id))]
    pub async fn update(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        request: UpdateMaintenanceRequest,
    ) -> Result<PetMaintenance, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let maintenance_id =
            require_id(request.maintenance_id, MAINTENANCE_ID_REQUIRED, "maintenanceId")?;
        let changes = request.changes()?;
        Self::find_for_pet(&mut conn, pet_id, maintenance_id).await?;
        Ok(PetMaintenance::update(&mut conn, maintenance_id, &changes).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        maintenance_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;
        let maintenance_id = require_id(maintenance_id, MAINTENANCE_ID_REQUIRED, "maintenanceId")?;

        Self::find_for_pet(&mut conn, pet_id, maintenance_id).await?;
        PetMaintenance::delete(&mut conn, maintenance_id).await?;
        Ok(())
    }

    /// Restart the recurrence from now, pushing the next due date forward
    #[instrument(skip(self))]
    pub async fn mark_complete(
        &self,
        owner_id: Uuid,
        maintenance_id: Uuid,
    ) -> Result<PetMaintenance, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let item = PetMaintenance::find_by_id(&mut conn, maintenance_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Maintenance item"))?;
        ensure_owned(Pet::find_by_id(&mut conn, item.pet_id).await?, owner_id)?;

        let now = Utc::now();
        let changes = MaintenanceChanges {
            start_date: Some(now),
            updated_at: Some(now),
            ..Default::default()
        };
        let updated = PetMaintenance::update(&mut conn, maintenance_id, &changes).await?;
        info!("Maintenance item {} marked complete", maintenance_id);
        Ok(updated)
    }

    /// Show or hide every maintenance item of a pet on its public page
    #[instrument(skip(self))]
    pub async fn set_visibility(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        is_public: bool,
    ) -> Result<usize, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;
        Ok(PetMaintenance::set_visibility_for_pet(&mut conn, pet_id, is_public).await?)
    }

    /// Items of one owned pet, or of all the user's pets, soonest due first
    #[instrument(skip(self))]
    pub async fn upcoming(
        &self,
        owner_id: Uuid,
        pet_id: Option<Uuid>,
    ) -> Result<Vec<UpcomingMaintenance>, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;

        let pets = match pet_id {
            Some(pet_id) => vec![ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?],
            None => Pet::list_for_owner(&mut conn, owner_id).await?,
        };
        if pets.is_empty() {
            return Ok(Vec::new());
        }

        let names: HashMap<Uuid, String> = pets.iter().map(|p| (p.id, p.name.clone())).collect();
        let pet_ids: Vec<Uuid> = pets.iter().map(|p| p.id).collect();
        let items = PetMaintenance::list_for_pets(&mut conn, &pet_ids).await?;

        let named = items
            .into_iter()
            .map(|item| {
                let name = names.get(&item.pet_id).cloned();
                (item, name)
            })
            .collect();
        Ok(upcoming(named, Utc::now()))
    }

    async fn find_for_pet(
        conn: &mut diesel_async::AsyncPgConnection,
        pet_id: Uuid,
        maintenance_id: Uuid,
    ) -> Result<PetMaintenance, ServiceError> {
        PetMaintenance::find_by_id(conn, maintenance_id)
            .await?
            .filter(|item| item.pet_id == pet_id)
            .ok_or_else(|| ServiceError::not_found("Maintenance item"))
    }
}
