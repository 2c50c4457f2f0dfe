use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use super::QrBackend;
use crate::{services::qr::QrCodeView, utils::service_error::ServiceResult};

#[derive(Debug, Clone, Default)]
pub struct QrState {
    pub qr_codes: Vec<QrCodeView>,
    pub current_qr_code: Option<QrCodeView>,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct QrStore {
    backend: Arc<dyn QrBackend>,
    owner_id: Uuid,
    state: watch::Sender<QrState>,
}

impl QrStore {
    pub fn new(backend: Arc<dyn QrBackend>, owner_id: Uuid) -> Self {
        let (state, _) = watch::channel(QrState::default());
        Self {
            backend,
            owner_id,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<QrState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> QrState {
        self.state.borrow().clone()
    }

    pub fn linked(&self) -> Vec<QrCodeView> {
        self.filtered(true)
    }

    pub fn unlinked(&self) -> Vec<QrCodeView> {
        self.filtered(false)
    }

    /// Distinct pets that have at least one code
    pub fn linked_pets(&self) -> Vec<Uuid> {
        let mut pet_ids = Vec::new();
        for pet_id in self.state.borrow().qr_codes.iter().filter_map(|qr| qr.qr_code.pet_id) {
            if !pet_ids.contains(&pet_id) {
                pet_ids.push(pet_id);
            }
        }
        pet_ids
    }

    fn filtered(&self, linked: bool) -> Vec<QrCodeView> {
        self.state
            .borrow()
            .qr_codes
            .iter()
            .filter(|qr| qr.qr_code.is_linked() == linked)
            .cloned()
            .collect()
    }

    fn start(&self) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn finish<T>(&self, result: &ServiceResult<T>, apply: impl FnOnce(&mut QrState, &T)) {
        self.state.send_modify(|s| {
            s.is_loading = false;
            match result {
                Ok(value) => apply(s, value),
                Err(e) => s.error = Some(e.to_string()),
            }
        });
    }

    /// Swap the stored copy of a code for the one the backend returned
    fn replace(state: &mut QrState, updated: &QrCodeView) {
        let code = &updated.qr_code.code;
        for qr in state.qr_codes.iter_mut().filter(|qr| &qr.qr_code.code == code) {
            *qr = updated.clone();
        }
        if let Some(current) = state.current_qr_code.as_mut().filter(|c| &c.qr_code.code == code) {
            *current = updated.clone();
        }
    }

    pub async fn load_user_qr_codes(&self) -> ServiceResult<Vec<QrCodeView>> {
        self.start();
        let result = self.backend.codes_for_user(self.owner_id).await;
        self.finish(&result, |s, codes| s.qr_codes = codes.clone());
        result
    }

    pub async fn get_qr_by_code(&self, code: &str) -> ServiceResult<QrCodeView> {
        self.start();
        let result = self.backend.code(code).await;
        self.finish(&result, |s, qr| s.current_qr_code = Some(qr.clone()));
        result
    }

    /// Codes of one pet; returned only, the stored list is left as is
    pub async fn get_qr_codes_for_pet(&self, pet_id: Uuid) -> ServiceResult<Vec<QrCodeView>> {
        self.start();
        let result = self.backend.codes_for_pet(self.owner_id, pet_id).await;
        self.finish(&result, |_, _| {});
        result
    }

    pub async fn link_qr_code_to_pet(&self, code: &str, pet_id: Uuid) -> ServiceResult<QrCodeView> {
        self.start();
        let result = self.backend.link(self.owner_id, code, pet_id).await;
        self.finish(&result, Self::replace);
        result
    }

    pub async fn unlink_qr_code(&self, code: &str) -> ServiceResult<QrCodeView> {
        self.start();
        let result = self.backend.unlink(self.owner_id, code).await;
        self.finish(&result, Self::replace);
        result
    }
}
