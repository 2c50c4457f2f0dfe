// Veterinarian details; each pet has at most one row

use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{
        pet::{ensure_owned, Pet},
        veterinarian::{CreateVeterinarianRequest, PetVeterinarian, UpdateVeterinarianRequest},
    },
    utils::{service_error::ServiceError, validation::require_id},
};

pub const VETERINARIAN_ID_REQUIRED: &str = "Veterinarian ID is required";
pub const VETERINARIAN_EXISTS: &str = "A veterinarian already exists for this pet";

pub struct VeterinarianService {
    diesel_pool: DieselPool,
}

impl VeterinarianService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, owner_id: Uuid, pet_id: Uuid) -> Result<Vec<PetVeterinarian>, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;
        Ok(PetVeterinarian::list_for_pet(&mut conn, pet_id).await?)
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        request: CreateVeterinarianRequest,
    ) -> Result<PetVeterinarian, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let vet = request.into_new_veterinarian(pet_id)?;
        if PetVeterinarian::find_for_pet(&mut conn, pet_id).await?.is_some() {
            return Err(ServiceError::Conflict(VETERINARIAN_EXISTS.to_string()));
        }

        // A concurrent insert trips the unique index on pet_id
        let created = PetVeterinarian::create(&mut conn, &vet)
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::Conflict(_) => ServiceError::Conflict(VETERINARIAN_EXISTS.to_string()),
                other => other,
            })?;
        info!("Added veterinarian {} to pet {}", created.id, pet_id);
        Ok(created)
    }

    #[instrument(skip(self, request), fields(vet_id = ?request.vet_id))]
    pub async fn update(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        request: UpdateVeterinarianRequest,
    ) -> Result<PetVeterinarian, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let vet_id = require_id(request.vet_id, VETERINARIAN_ID_REQUIRED, "vetId")?;
        let changes = request.changes()?;
        PetVeterinarian::update_for_pet(&mut conn, pet_id, vet_id, &changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("Veterinarian"))
    }

    /// Replace the pet's veterinarian details, inserting the row when absent
    #[instrument(skip(self, request))]
    pub async fn upsert(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        request: CreateVeterinarianRequest,
    ) -> Result<PetVeterinarian, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let vet = request.into_new_veterinarian(pet_id)?;
        Ok(PetVeterinarian::upsert(&mut conn, &vet).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        vet_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;
        let vet_id = require_id(vet_id, VETERINARIAN_ID_REQUIRED, "vetId")?;

        match PetVeterinarian::delete_for_pet(&mut conn, pet_id, vet_id).await? {
            0 => Err(ServiceError::not_found("Veterinarian")),
            _ => Ok(()),
        }
    }
}
