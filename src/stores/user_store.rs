use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use super::ProfileBackend;
use crate::{
    models::profile::{Profile, UpdateProfileRequest},
    utils::service_error::ServiceResult,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserState {
    pub profile: Option<Profile>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Profile of the signed-in user
pub struct UserStore {
    backend: Arc<dyn ProfileBackend>,
    user_id: Uuid,
    state: watch::Sender<UserState>,
}

impl UserStore {
    pub fn new(backend: Arc<dyn ProfileBackend>, user_id: Uuid) -> Self {
        let (state, _) = watch::channel(UserState::default());
        Self {
            backend,
            user_id,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UserState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> UserState {
        self.state.borrow().clone()
    }

    pub fn has_completed_onboarding(&self) -> bool {
        self.state
            .borrow()
            .profile
            .as_ref()
            .is_some_and(|p| p.has_completed_onboarding)
    }

    /// "First Last", or empty before the profile is loaded
    pub fn full_name(&self) -> String {
        self.state
            .borrow()
            .profile
            .as_ref()
            .map(|p| format!("{} {}", p.first_name, p.last_name).trim().to_string())
            .unwrap_or_default()
    }

    fn start(&self) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn finish<T>(&self, result: &ServiceResult<T>, apply: impl FnOnce(&mut UserState, &T)) {
        self.state.send_modify(|s| {
            s.is_loading = false;
            match result {
                Ok(value) => apply(s, value),
                Err(e) => s.error = Some(e.to_string()),
            }
        });
    }

    pub async fn load_profile(&self) -> ServiceResult<Profile> {
        self.start();
        let result = self.backend.profile(self.user_id).await;
        self.finish(&result, |s, profile| s.profile = Some(profile.clone()));
        result
    }

    pub async fn update_profile(&self, request: UpdateProfileRequest) -> ServiceResult<Profile> {
        self.start();
        let result = self.backend.update_profile(self.user_id, request).await;
        self.finish(&result, |s, profile| s.profile = Some(profile.clone()));
        result
    }

    pub async fn toggle_email_subscription(&self) -> ServiceResult<bool> {
        self.start();
        let result = self.backend.toggle_email_subscription(self.user_id).await;
        self.finish(&result, |s, unsubscribed| {
            if let Some(profile) = s.profile.as_mut() {
                profile.unsubscribed = *unsubscribed;
            }
        });
        result
    }
}
