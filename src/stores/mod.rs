// In-process state containers that mirror service calls for a single user.
// Each one publishes its state through a `tokio::sync::watch` channel.

pub mod pet_store;
pub mod qr_store;
pub mod selected_pet;
pub mod user_store;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    models::{
        pet::{CreatePetRequest, Pet, PetWithRelations, UpdatePetRequest},
        profile::{Profile, UpdateProfileRequest},
    },
    services::{pet::PetService, qr::QrCodeView, qr::QrService, user::UserService},
    utils::service_error::ServiceResult,
};

pub use pet_store::{PetState, PetStore};
pub use qr_store::{QrState, QrStore};
pub use selected_pet::{JsonFileSelection, MemorySelection, SelectedPetStore, SelectionPersistence};
pub use user_store::{UserState, UserStore};

// =============================================================================
// BACKENDS
// =============================================================================

#[async_trait]
pub trait PetBackend: Send + Sync {
    async fn list_pets(&self, owner_id: Uuid) -> ServiceResult<Vec<Pet>>;
    async fn pet_details(&self, owner_id: Uuid, pet_id: Uuid) -> ServiceResult<PetWithRelations>;
    async fn create_pet(&self, owner_id: Uuid, request: CreatePetRequest) -> ServiceResult<Pet>;
    async fn update_pet(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        request: UpdatePetRequest,
    ) -> ServiceResult<Pet>;
    async fn delete_pet(&self, owner_id: Uuid, pet_id: Uuid) -> ServiceResult<()>;
}

#[async_trait]
pub trait QrBackend: Send + Sync {
    async fn codes_for_user(&self, owner_id: Uuid) -> ServiceResult<Vec<QrCodeView>>;
    async fn code(&self, code: &str) -> ServiceResult<QrCodeView>;
    async fn codes_for_pet(&self, owner_id: Uuid, pet_id: Uuid) -> ServiceResult<Vec<QrCodeView>>;
    async fn link(&self, owner_id: Uuid, code: &str, pet_id: Uuid) -> ServiceResult<QrCodeView>;
    async fn unlink(&self, owner_id: Uuid, code: &str) -> ServiceResult<QrCodeView>;
}

#[async_trait]
pub trait ProfileBackend: Send + Sync {
    async fn profile(&self, user_id: Uuid) -> ServiceResult<Profile>;
    async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> ServiceResult<Profile>;
    async fn toggle_email_subscription(&self, user_id: Uuid) -> ServiceResult<bool>;
}

#[async_trait]
impl PetBackend for PetService {
    async fn list_pets(&self, owner_id: Uuid) -> ServiceResult<Vec<Pet>> {
        self.get_user_pets(owner_id).await
    }

    async fn pet_details(&self, owner_id: Uuid, pet_id: Uuid) -> ServiceResult<PetWithRelations> {
        self.get_pet_with_relations(owner_id, pet_id).await
    }

    async fn create_pet(&self, owner_id: Uuid, request: CreatePetRequest) -> ServiceResult<Pet> {
        PetService::create_pet(self, owner_id, request).await
    }

    async fn update_pet(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        request: UpdatePetRequest,
    ) -> ServiceResult<Pet> {
        PetService::update_pet(self, owner_id, pet_id, request).await
    }

    async fn delete_pet(&self, owner_id: Uuid, pet_id: Uuid) -> ServiceResult<()> {
        PetService::delete_pet(self, owner_id, pet_id).await
    }
}

#[async_trait]
impl QrBackend for QrService {
    async fn codes_for_user(&self, owner_id: Uuid) -> ServiceResult<Vec<QrCodeView>> {
        self.for_user(owner_id).await
    }

    async fn code(&self, code: &str) -> ServiceResult<QrCodeView> {
        self.get_by_code(code).await
    }

    async fn codes_for_pet(&self, owner_id: Uuid, pet_id: Uuid) -> ServiceResult<Vec<QrCodeView>> {
        self.for_pet(owner_id, pet_id).await
    }

    async fn link(&self, owner_id: Uuid, code: &str, pet_id: Uuid) -> ServiceResult<QrCodeView> {
        QrService::link(self, owner_id, code, pet_id).await
    }

    async fn unlink(&self, owner_id: Uuid, code: &str) -> ServiceResult<QrCodeView> {
        QrService::unlink(self, owner_id, code).await
    }
}

#[async_trait]
impl ProfileBackend for UserService {
    async fn profile(&self, user_id: Uuid) -> ServiceResult<Profile> {
        self.get_profile(user_id).await
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> ServiceResult<Profile> {
        UserService::update_profile(self, user_id, request).await
    }

    async fn toggle_email_subscription(&self, user_id: Uuid) -> ServiceResult<bool> {
        UserService::toggle_email_subscription(self, user_id).await
    }
}
