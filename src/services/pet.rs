// Pet profiles: ownership checks, CRUD and avatars

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{
        contact::PetContact,
        maintenance::PetMaintenance,
        pet::{ensure_owned, CreatePetRequest, NewPet, Pet, PetChanges, PetWithRelations, UpdatePetRequest},
        veterinarian::PetVeterinarian,
    },
    services::storage::ObjectStorage,
    utils::{service_error::ServiceError, validation::file_extension},
};

/// Largest accepted avatar upload (5 MiB)
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// File received from a multipart upload
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AvatarUpload {
    pub fn check(&self) -> Result<(), ServiceError> {
        if self.bytes.is_empty() {
            return Err(ServiceError::validation("No file uploaded", &["avatar"]));
        }
        if self.bytes.len() > MAX_AVATAR_BYTES {
            return Err(ServiceError::validation(
                "Avatar must be 5MB or smaller",
                &["avatar"],
            ));
        }
        Ok(())
    }

    /// Object name `{owner}-{unix_millis}.{ext}`
    pub fn object_path(&self, owner: Uuid) -> String {
        format!(
            "{}-{}.{}",
            owner,
            Utc::now().timestamp_millis(),
            file_extension(&self.file_name)
        )
    }
}

pub struct PetService {
    diesel_pool: DieselPool,
    storage: Arc<dyn ObjectStorage>,
    pet_avatar_bucket: String,
}

impl PetService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
            storage: state.storage.clone(),
            pet_avatar_bucket: state.config.storage.pet_avatar_bucket.clone(),
        }
    }

    /// All pets owned by the user, ordered by name
    #[instrument(skip(self))]
    pub async fn get_user_pets(&self, owner_id: Uuid) -> Result<Vec<Pet>, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        Ok(Pet::list_for_owner(&mut conn, owner_id).await?)
    }

    /// Load a pet and check it belongs to `owner_id`
    #[instrument(skip(self))]
    pub async fn find_owned_pet(&self, owner_id: Uuid, pet_id: Uuid) -> Result<Pet, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)
    }

    pub async fn get_pet(&self, owner_id: Uuid, pet_id: Uuid) -> Result<Pet, ServiceError> {
        self.find_owned_pet(owner_id, pet_id).await
    }

    /// Pet with its contacts, maintenance items and veterinarian
    #[instrument(skip(self))]
    pub async fn get_pet_with_relations(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
    ) -> Result<PetWithRelations, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let pet = ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let pet_contacts = PetContact::list_for_pet(&mut conn, pet_id).await?;
        let pet_maintenance = PetMaintenance::list_for_pet(&mut conn, pet_id).await?;
        let pet_veterinarian = PetVeterinarian::list_for_pet(&mut conn, pet_id).await?;

        Ok(PetWithRelations {
            pet,
            pet_contacts,
            pet_maintenance,
            pet_veterinarian,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn create_pet(
        &self,
        owner_id: Uuid,
        request: CreatePetRequest,
    ) -> Result<Pet, ServiceError> {
        let new_pet = request.into_new_pet(owner_id)?;
        self.insert_pet(&new_pet).await
    }

    /// Create a pet whose avatar arrives with the form. The image is stored
    /// first and removed again if the insert fails.
    #[instrument(skip(self, request, avatar))]
    pub async fn create_pet_with_avatar(
        &self,
        owner_id: Uuid,
        request: CreatePetRequest,
        avatar: Option<AvatarUpload>,
    ) -> Result<Pet, ServiceError> {
        let mut new_pet = request.into_new_pet(owner_id)?;
        let Some(avatar) = avatar.filter(|a| !a.bytes.is_empty()) else {
            return self.insert_pet(&new_pet).await;
        };
        avatar.check()?;

        let path = avatar.object_path(owner_id);
        let public_url = self
            .storage
            .upload(&self.pet_avatar_bucket, &path, avatar.bytes, &avatar.content_type)
            .await?;
        new_pet.avatar_url = Some(public_url);

        let result = self.insert_pet(&new_pet).await;
        if result.is_err() {
            if let Err(e) = self
                .storage
                .remove(&self.pet_avatar_bucket, std::slice::from_ref(&path))
                .await
            {
                warn!("Orphaned avatar {} left in storage: {}", path, e);
            }
        }
        result
    }

    pub async fn insert_pet(&self, new_pet: &NewPet) -> Result<Pet, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let pet = Pet::create(&mut conn, new_pet).await?;
        info!("Created pet {} for profile {}", pet.id, pet.profile_id);
        Ok(pet)
    }

    #[instrument(skip(self, request))]
    pub async fn update_pet(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        request: UpdatePetRequest,
    ) -> Result<Pet, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let changes = request.into_changes()?;
        Ok(Pet::update(&mut conn, pet_id, &changes).await?)
    }

    /// Deletes an owned pet. Sub-resources cascade; the avatar object is removed best-effort.
    #[instrument(skip(self))]
    pub async fn delete_pet(&self, owner_id: Uuid, pet_id: Uuid) -> Result<(), ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let pet = ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;
        self.remove_pet(&mut conn, pet).await
    }

    /// Form deletion: the typed name must match and a foreign pet is refused outright
    #[instrument(skip(self))]
    pub async fn delete_pet_confirmed(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        confirm_name: &str,
    ) -> Result<(), ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let pet = Pet::find_by_id(&mut conn, pet_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Pet"))?;

        if pet.profile_id != owner_id {
            return Err(ServiceError::Forbidden("Unauthorized".to_string()));
        }
        if pet.name != confirm_name.trim() {
            return Err(ServiceError::validation(
                "Confirmation name doesn't match",
                &["confirmName"],
            ));
        }

        self.remove_pet(&mut conn, pet).await
    }

    async fn remove_pet(
        &self,
        conn: &mut diesel_async::AsyncPgConnection,
        pet: Pet,
    ) -> Result<(), ServiceError> {
        if let Some(path) = pet
            .avatar_url
            .as_deref()
            .and_then(|url| self.storage.object_path(&self.pet_avatar_bucket, url))
        {
            if let Err(e) = self.storage.remove(&self.pet_avatar_bucket, &[path]).await {
                warn!("Could not remove avatar of pet {}: {}", pet.id, e);
            }
        }

        Pet::delete(conn, pet.id).await?;
        info!("Deleted pet {}", pet.id);
        Ok(())
    }

    /// Upload a new avatar and point the pet at it. If the row update fails the
    /// uploaded object is removed again.
    #[instrument(skip(self, upload), fields(file = %upload.file_name))]
    pub async fn upload_avatar(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        upload: AvatarUpload,
    ) -> Result<Pet, ServiceError> {
        upload.check()?;

        let mut conn = self.diesel_pool.get().await?;
        let pet = ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let path = upload.object_path(pet_id);
        let public_url = self
            .storage
            .upload(&self.pet_avatar_bucket, &path, upload.bytes, &upload.content_type)
            .await?;

        let changes = PetChanges {
            avatar_url: Some(Some(public_url)),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        let updated = match Pet::update(&mut conn, pet_id, &changes).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Err(cleanup) = self
                    .storage
                    .remove(&self.pet_avatar_bucket, std::slice::from_ref(&path))
                    .await
                {
                    warn!("Orphaned avatar {} left in storage: {}", path, cleanup);
                }
                return Err(e.into());
            },
        };

        if let Some(old) = pet
            .avatar_url
            .as_deref()
            .and_then(|url| self.storage.object_path(&self.pet_avatar_bucket, url))
            .filter(|old| *old != path)
        {
            if let Err(e) = self.storage.remove(&self.pet_avatar_bucket, &[old]).await {
                warn!("Could not remove previous avatar of pet {}: {}", pet_id, e);
            }
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, size: usize) -> AvatarUpload {
        AvatarUpload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0u8; size],
        }
    }

    #[test]
    fn test_avatar_size_limits() {
        assert!(upload("rex.png", 1024).check().is_ok());
        assert!(upload("rex.png", MAX_AVATAR_BYTES).check().is_ok());

        let err = upload("rex.png", MAX_AVATAR_BYTES + 1).check().unwrap_err();
        assert!(matches!(err, ServiceError::Validation { ref fields, .. } if fields == &vec!["avatar".to_string()]));

        let err = upload("rex.png", 0).check().unwrap_err();
        assert_eq!(err.to_string(), "No file uploaded");
    }

    #[test]
    fn test_avatar_object_path() {
        let owner = Uuid::new_v4();
        let path = upload("Rex.JPG", 10).object_path(owner);

        assert!(path.starts_with(&format!("{}-", owner)));
        assert!(path.ends_with(".jpg"));
        let millis = path
            .trim_start_matches(&format!("{}-", owner))
            .trim_end_matches(".jpg");
        assert!(millis.parse::<i64>().is_ok());
    }
}
