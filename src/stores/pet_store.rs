use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use super::PetBackend;
use crate::{
    models::pet::{CreatePetRequest, Pet, PetWithRelations, UpdatePetRequest},
    utils::service_error::ServiceResult,
};

#[derive(Debug, Clone, Default)]
pub struct PetState {
    pub pets: Vec<Pet>,
    pub current_pet: Option<PetWithRelations>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Pets of one user plus the pet currently being viewed
pub struct PetStore {
    backend: Arc<dyn PetBackend>,
    owner_id: Uuid,
    state: watch::Sender<PetState>,
}

impl PetStore {
    pub fn new(backend: Arc<dyn PetBackend>, owner_id: Uuid) -> Self {
        let (state, _) = watch::channel(PetState::default());
        Self {
            backend,
            owner_id,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PetState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PetState {
        self.state.borrow().clone()
    }

    pub fn get_pet_by_id(&self, pet_id: Uuid) -> Option<Pet> {
        self.state.borrow().pets.iter().find(|p| p.id == pet_id).cloned()
    }

    pub fn has_pets(&self) -> bool {
        !self.state.borrow().pets.is_empty()
    }

    fn start(&self) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    /// Clear the loading flag and either apply the result or record its error
    fn finish<T>(&self, result: &ServiceResult<T>, apply: impl FnOnce(&mut PetState, &T)) {
        self.state.send_modify(|s| {
            s.is_loading = false;
            match result {
                Ok(value) => apply(s, value),
                Err(e) => s.error = Some(e.to_string()),
            }
        });
    }

    pub async fn load_user_pets(&self) -> ServiceResult<Vec<Pet>> {
        self.start();
        let result = self.backend.list_pets(self.owner_id).await;
        self.finish(&result, |s, pets| s.pets = pets.clone());
        result
    }

    pub async fn load_pet_details(&self, pet_id: Uuid) -> ServiceResult<PetWithRelations> {
        self.start();
        let result = self.backend.pet_details(self.owner_id, pet_id).await;
        self.finish(&result, |s, pet| s.current_pet = Some(pet.clone()));
        result
    }

    /// Creates the pet and reloads the whole list
    pub async fn create_pet(&self, request: CreatePetRequest) -> ServiceResult<Pet> {
        self.start();
        let result = self.backend.create_pet(self.owner_id, request).await;
        self.finish(&result, |_, _| {});
        let pet = result?;

        self.load_user_pets().await?;
        Ok(pet)
    }

    pub async fn update_pet(&self, pet_id: Uuid, request: UpdatePetRequest) -> ServiceResult<Pet> {
        self.start();
        let result = self.backend.update_pet(self.owner_id, pet_id, request).await;
        self.finish(&result, |s, updated| {
            for pet in s.pets.iter_mut().filter(|p| p.id == updated.id) {
                *pet = updated.clone();
            }
            if let Some(current) = s.current_pet.as_mut().filter(|c| c.pet.id == updated.id) {
                current.pet = updated.clone();
            }
        });
        result
    }

    pub async fn delete_pet(&self, pet_id: Uuid) -> ServiceResult<()> {
        self.start();
        let result = self.backend.delete_pet(self.owner_id, pet_id).await;
        self.finish(&result, |s, _| {
            s.pets.retain(|p| p.id != pet_id);
            if s.current_pet.as_ref().is_some_and(|c| c.pet.id == pet_id) {
                s.current_pet = None;
            }
        });
        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::utils::service_error::ServiceError;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use std::sync::Mutex;

    pub(crate) fn pet(owner: Uuid, name: &str) -> Pet {
        Pet {
            id: Uuid::new_v4(),
            profile_id: owner,
            name: name.to_string(),
            second_name: None,
            date_of_birth: NaiveDate::from_ymd_opt(2021, 4, 12).unwrap(),
            gender: "female".to_string(),
            pet_type: "dog".to_string(),
            breed: "Collie".to_string(),
            temperament: None,
            food: None,
            favourite_treats: None,
            allergies: None,
            bio: None,
            profile_url: None,
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Pet backend over a vector, sorted by name like the database
    #[derive(Default)]
    pub(crate) struct MemoryPets {
        pub pets: Mutex<Vec<Pet>>,
    }

    impl MemoryPets {
        pub(crate) fn with(pets: Vec<Pet>) -> Arc<Self> {
            Arc::new(Self {
                pets: Mutex::new(pets),
            })
        }

        fn owned(&self, owner_id: Uuid, pet_id: Uuid) -> ServiceResult<Pet> {
            self.pets
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == pet_id && p.profile_id == owner_id)
                .cloned()
                .ok_or_else(ServiceError::pet_access_denied)
        }
    }

    #[async_trait]
    impl PetBackend for MemoryPets {
        async fn list_pets(&self, owner_id: Uuid) -> ServiceResult<Vec<Pet>> {
            let mut pets: Vec<Pet> = self
                .pets
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.profile_id == owner_id)
                .cloned()
                .collect();
            pets.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(pets)
        }

        async fn pet_details(&self, owner_id: Uuid, pet_id: Uuid) -> ServiceResult<PetWithRelations> {
            Ok(PetWithRelations {
                pet: self.owned(owner_id, pet_id)?,
                pet_contacts: Vec::new(),
                pet_maintenance: Vec::new(),
                pet_veterinarian: Vec::new(),
            })
        }

        async fn create_pet(&self, owner_id: Uuid, request: CreatePetRequest) -> ServiceResult<Pet> {
            let new_pet = request.into_new_pet(owner_id)?;
            let mut created = pet(owner_id, &new_pet.name);
            created.breed = new_pet.breed;
            self.pets.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update_pet(
            &self,
            owner_id: Uuid,
            pet_id: Uuid,
            request: UpdatePetRequest,
        ) -> ServiceResult<Pet> {
            let mut updated = self.owned(owner_id, pet_id)?;
            if let Some(name) = request.name {
                updated.name = name;
            }
            let mut pets = self.pets.lock().unwrap();
            for p in pets.iter_mut().filter(|p| p.id == pet_id) {
                *p = updated.clone();
            }
            Ok(updated)
        }

        async fn delete_pet(&self, owner_id: Uuid, pet_id: Uuid) -> ServiceResult<()> {
            self.owned(owner_id, pet_id)?;
            self.pets.lock().unwrap().retain(|p| p.id != pet_id);
            Ok(())
        }
    }

    fn create_request(name: &str) -> CreatePetRequest {
        CreatePetRequest {
            name: Some(name.to_string()),
            date_of_birth: Some("2022-02-02".to_string()),
            gender: Some("male".to_string()),
            pet_type: Some("cat".to_string()),
            breed: Some("Siamese".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_user_pets() {
        let owner = Uuid::new_v4();
        let backend = MemoryPets::with(vec![pet(owner, "Pepper"), pet(owner, "Biscuit"), pet(Uuid::new_v4(), "Stranger")]);
        let store = PetStore::new(backend, owner);

        let pets = store.load_user_pets().await.unwrap();
        assert_eq!(pets.len(), 2);

        let state = store.snapshot();
        assert!(!state.is_loading);
        assert_eq!(state.pets[0].name, "Biscuit");
        assert!(store.has_pets());
    }

    #[tokio::test]
    async fn test_create_reloads_list() {
        let owner = Uuid::new_v4();
        let store = PetStore::new(MemoryPets::with(vec![pet(owner, "Pepper")]), owner);
        let mut changes = store.subscribe();

        let created = store.create_pet(create_request("Apollo")).await.unwrap();

        assert!(changes.has_changed().unwrap());
        let names: Vec<String> = changes.borrow_and_update().pets.iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["Apollo", "Pepper"]);
        assert_eq!(store.get_pet_by_id(created.id).unwrap().name, "Apollo");
    }

    #[tokio::test]
    async fn test_create_failure_records_error() {
        let owner = Uuid::new_v4();
        let store = PetStore::new(MemoryPets::with(vec![]), owner);

        let result = store.create_pet(CreatePetRequest::default()).await;

        assert!(matches!(result, Err(ServiceError::MissingFields(_))));
        let state = store.snapshot();
        assert_eq!(state.error.as_deref(), Some("Missing required fields"));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_update_replaces_in_list_and_current() {
        let owner = Uuid::new_v4();
        let biscuit = pet(owner, "Biscuit");
        let store = PetStore::new(MemoryPets::with(vec![biscuit.clone()]), owner);
        store.load_user_pets().await.unwrap();
        store.load_pet_details(biscuit.id).await.unwrap();

        let request = UpdatePetRequest {
            name: Some("Biscuit II".to_string()),
            ..Default::default()
        };
        store.update_pet(biscuit.id, request).await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.pets[0].name, "Biscuit II");
        assert_eq!(state.current_pet.unwrap().pet.name, "Biscuit II");
    }

    #[tokio::test]
    async fn test_delete_filters_list_and_clears_current() {
        let owner = Uuid::new_v4();
        let biscuit = pet(owner, "Biscuit");
        let pepper = pet(owner, "Pepper");
        let store = PetStore::new(MemoryPets::with(vec![biscuit.clone(), pepper.clone()]), owner);
        store.load_user_pets().await.unwrap();
        store.load_pet_details(biscuit.id).await.unwrap();

        store.delete_pet(biscuit.id).await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.pets.len(), 1);
        assert_eq!(state.pets[0].id, pepper.id);
        assert!(state.current_pet.is_none());
    }

    #[tokio::test]
    async fn test_foreign_pet_details_are_denied() {
        let owner = Uuid::new_v4();
        let foreign = pet(Uuid::new_v4(), "Stranger");
        let store = PetStore::new(MemoryPets::with(vec![foreign.clone()]), owner);

        let err = store.load_pet_details(foreign.id).await.unwrap_err();
        assert_eq!(err, ServiceError::pet_access_denied());
        assert_eq!(
            store.snapshot().error.as_deref(),
            Some("Pet not found or access denied")
        );
    }
}
