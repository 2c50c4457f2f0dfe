use serde::{Deserialize, Serialize};
use std::{
    path::PathBuf,
    sync::{Mutex, PoisonError},
};
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use super::PetState;
use crate::models::pet::Pet;

/// Where the chosen pet id survives between runs
pub trait SelectionPersistence: Send + Sync {
    fn load(&self) -> Option<Uuid>;
    fn save(&self, pet_id: Option<Uuid>) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectionFile {
    selected_pet_id: Option<Uuid>,
}

/// Keeps the selection in a small JSON file
pub struct JsonFileSelection {
    path: PathBuf,
}

impl JsonFileSelection {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SelectionPersistence for JsonFileSelection {
    fn load(&self) -> Option<Uuid> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("No saved pet selection at {}: {}", self.path.display(), e);
                return None;
            },
        };
        match serde_json::from_str::<SelectionFile>(&raw) {
            Ok(file) => file.selected_pet_id,
            Err(e) => {
                warn!("Ignoring unreadable pet selection file {}: {}", self.path.display(), e);
                None
            },
        }
    }

    fn save(&self, pet_id: Option<Uuid>) -> anyhow::Result<()> {
        match pet_id {
            Some(_) => {
                let body = serde_json::to_string(&SelectionFile {
                    selected_pet_id: pet_id,
                })?;
                std::fs::write(&self.path, body)?;
            },
            None => match std::fs::remove_file(&self.path) {
                Ok(()) => {},
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySelection {
    value: Mutex<Option<Uuid>>,
}

impl MemorySelection {
    pub fn new(initial: Option<Uuid>) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }
}

impl SelectionPersistence for MemorySelection {
    fn load(&self) -> Option<Uuid> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save(&self, pet_id: Option<Uuid>) -> anyhow::Result<()> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = pet_id;
        Ok(())
    }
}

/// The pet the user is working with, looked up by id in the pet list
pub struct SelectedPetStore {
    selected: watch::Sender<Option<Uuid>>,
    pets: watch::Receiver<PetState>,
    persistence: Box<dyn SelectionPersistence>,
}

impl SelectedPetStore {
    pub fn new(pets: watch::Receiver<PetState>, persistence: Box<dyn SelectionPersistence>) -> Self {
        let (selected, _) = watch::channel(persistence.load());
        Self {
            selected,
            pets,
            persistence,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Uuid>> {
        self.selected.subscribe()
    }

    pub fn selected_pet_id(&self) -> Option<Uuid> {
        *self.selected.borrow()
    }

    /// `None` when nothing is selected or the id is no longer in the list
    pub fn selected_pet(&self) -> Option<Pet> {
        let selected = self.selected_pet_id()?;
        self.pets.borrow().pets.iter().find(|p| p.id == selected).cloned()
    }

    pub fn select_pet(&self, pet_id: Uuid) {
        self.set(Some(pet_id));
    }

    pub fn clear_selection(&self) {
        self.set(None);
    }

    /// Picks the first pet in the list when nothing is selected yet
    pub fn select_first_pet_if_none_selected(&self) -> Option<Uuid> {
        if self.selected_pet_id().is_some() {
            return None;
        }
        let first = self.pets.borrow().pets.first().map(|p| p.id)?;
        self.select_pet(first);
        Some(first)
    }

    fn set(&self, pet_id: Option<Uuid>) {
        self.selected.send_replace(pet_id);
        if let Err(e) = self.persistence.save(pet_id) {
            warn!("Failed to persist pet selection: {}", e);
        }
    }
}
