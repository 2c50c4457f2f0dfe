// Account profile, onboarding and credential operations

use chrono::Utc;
use diesel_async::{scoped_futures::ScopedFutureExt, AsyncConnection};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{
        account_deletion::AccountDeletion,
        onboarding::OnboardingForm,
        pet::Pet,
        profile::{AccountStatus, Profile, ProfileChanges, UpdateProfileRequest, UserAnalytics},
        qr_code::QrCode,
    },
    services::{
        auth_provider::AuthProvider, email::EmailService, pet::AvatarUpload,
        storage::ObjectStorage,
    },
    utils::{
        service_error::ServiceError,
        validation::{is_plausible_email, validate_password_change},
    },
};

pub const RECOVERY_EXPIRED: &str = "Recovery code expired. Please log out, then use \"Forgot Password\" on the sign in page to reset your password. Codes are valid for 15 minutes.";
pub const INVALID_PASSWORD: &str = "Invalid password";

/// Fields of the change-password form
#[derive(Debug, Clone, Default)]
pub struct PasswordChange {
    pub new_password1: String,
    pub new_password2: String,
    pub current_password: String,
}

/// Who is acting, as far as the auth provider is concerned
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
    /// Time of the recovery login (Unix seconds) when the session came from a reset link
    pub recovery_at: Option<i64>,
}

/// Onboarding failures keep the step that failed so the form can say which
#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error(transparent)]
    Invalid(ServiceError),

    #[error("Error updating profile. Please try again.")]
    Profile(ServiceError),

    #[error("Error creating pet. Please try again.")]
    Pet(ServiceError),
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingResult {
    pub profile: Profile,
    pub pets: Vec<Pet>,
}

/// Whether a recovery session is still inside its window
pub fn recovery_still_valid(recovery_at: i64, now: i64, window_secs: u64) -> bool {
    now.saturating_sub(recovery_at) <= window_secs as i64
}

pub struct UserService {
    diesel_pool: DieselPool,
    auth_provider: Arc<dyn AuthProvider>,
    storage: Arc<dyn ObjectStorage>,
    email_service: Arc<EmailService>,
    profile_avatar_bucket: String,
    recovery_window_secs: u64,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
            auth_provider: state.auth_provider.clone(),
            storage: state.storage.clone(),
            email_service: state.email_service.clone(),
            profile_avatar_bucket: state.config.storage.profile_avatar_bucket.clone(),
            recovery_window_secs: state.config.auth.recovery_window_secs,
        }
    }

    // =========================================================================
    // PROFILE
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Profile, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        Profile::find_by_id(&mut conn, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile"))
    }

    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<Profile, ServiceError> {
        request.validate()?;
        let mut conn = self.diesel_pool.get().await?;
        Ok(Profile::update(&mut conn, user_id, &request.changes()).await?)
    }

    /// Flip the marketing-email opt-out and return the new value
    #[instrument(skip(self))]
    pub async fn toggle_email_subscription(&self, user_id: Uuid) -> Result<bool, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let profile = Profile::find_by_id(&mut conn, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile"))?;

        let changes = ProfileChanges {
            unsubscribed: Some(!profile.unsubscribed),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        let updated = Profile::update(&mut conn, user_id, &changes).await?;
        Ok(updated.unsubscribed)
    }

    #[instrument(skip(self))]
    pub async fn account_status(&self, user_id: Uuid) -> Result<AccountStatus, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let profile = Profile::find_by_id(&mut conn, user_id).await?;
        Ok(AccountStatus::for_profile(profile.as_ref()))
    }

    #[instrument(skip(self))]
    pub async fn complete_onboarding(&self, user_id: Uuid) -> Result<Profile, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let changes = ProfileChanges {
            has_completed_onboarding: Some(true),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        Ok(Profile::update(&mut conn, user_id, &changes).await?)
    }

    /// Replace the profile picture. A failed row update removes the new object again.
    #[instrument(skip(self, upload), fields(file = %upload.file_name))]
    pub async fn upload_avatar(
        &self,
        user_id: Uuid,
        upload: AvatarUpload,
    ) -> Result<Profile, ServiceError> {
        upload.check()?;

        let path = upload.object_path(user_id);
        let public_url = self
            .storage
            .upload(&self.profile_avatar_bucket, &path, upload.bytes, &upload.content_type)
            .await?;

        let changes = ProfileChanges {
            avatar_url: Some(Some(public_url)),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        let result = async {
            let mut conn = self.diesel_pool.get().await?;
            Ok::<_, ServiceError>(Profile::update(&mut conn, user_id, &changes).await?)
        }
        .await;

        if result.is_err() {
            if let Err(e) = self
                .storage
                .remove(&self.profile_avatar_bucket, std::slice::from_ref(&path))
                .await
            {
                warn!("Orphaned avatar {} left in storage: {}", path, e);
            }
        }
        result
    }

    #[instrument(skip(self))]
    pub async fn record_account_deletion(
        &self,
        user_id: Uuid,
        reason: &str,
    ) -> Result<AccountDeletion, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        Ok(AccountDeletion::record(&mut conn, user_id, reason).await?)
    }

    #[instrument(skip(self))]
    pub async fn has_pets(&self, user_id: Uuid) -> Result<bool, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        Ok(Pet::count_for_owner(&mut conn, user_id).await? > 0)
    }

    #[instrument(skip(self))]
    pub async fn analytics(&self, user_id: Uuid) -> Result<UserAnalytics, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let pet_ids = Pet::ids_for_owner(&mut conn, user_id).await?;
        let linked_qr_codes_count = if pet_ids.is_empty() {
            0
        } else {
            QrCode::count_for_pets(&mut conn, &pet_ids).await?
        };

        Ok(UserAnalytics {
            pet_count: pet_ids.len() as i64,
            linked_qr_codes_count,
        })
    }

    // =========================================================================
    // CREDENTIALS
    // =========================================================================

    #[instrument(skip(self, password))]
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<bool, ServiceError> {
        Ok(self.auth_provider.verify_password(email, password).await?)
    }

    /// Starts the email change; the auth service confirms it with the user
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub async fn update_email(
        &self,
        session: &SessionIdentity,
        new_email: &str,
    ) -> Result<(), ServiceError> {
        let new_email = new_email.trim();
        if new_email.is_empty() {
            return Err(ServiceError::validation(
                "An email address is required",
                &["email"],
            ));
        }
        if !is_plausible_email(new_email) {
            return Err(ServiceError::validation(
                "A valid email address is required",
                &["email"],
            ));
        }

        self.auth_provider
            .update_email(&session.access_token, new_email)
            .await?;
        info!("Email change requested for {}", session.user_id);
        Ok(())
    }

    /// Change the password. A recovery session inside its window may omit the
    /// current password; otherwise the current password is verified first.
    #[instrument(skip(self, session, change), fields(user_id = %session.user_id))]
    pub async fn update_password(
        &self,
        session: &SessionIdentity,
        change: &PasswordChange,
    ) -> Result<(), ServiceError> {
        let recovery_at = session
            .recovery_at
            .filter(|_| change.current_password.is_empty());
        if let Some(recovery_at) = recovery_at {
            if !recovery_still_valid(recovery_at, Utc::now().timestamp(), self.recovery_window_secs) {
                return Err(ServiceError::validation(RECOVERY_EXPIRED, &[]));
            }
        }
        let is_recovery_session = recovery_at.is_some();

        validate_password_change(
            &change.new_password1,
            &change.new_password2,
            &change.current_password,
            is_recovery_session,
        )?;

        if !is_recovery_session
            && !self
                .auth_provider
                .verify_password(&session.email, &change.current_password)
                .await?
        {
            return Err(ServiceError::validation(INVALID_PASSWORD, &["currentPassword"]));
        }

        self.auth_provider
            .update_password(&session.access_token, &change.new_password1)
            .await?;
        info!("Password changed for {}", session.user_id);
        Ok(())
    }

    /// Verify the password, record why the user left, delete their rows, then
    /// remove the auth user.
    #[instrument(skip(self, session, password), fields(user_id = %session.user_id))]
    pub async fn delete_account(
        &self,
        session: &SessionIdentity,
        password: &str,
        reason: &str,
    ) -> Result<(), ServiceError> {
        if password.is_empty() {
            return Err(ServiceError::validation("Password is required", &["currentPassword"]));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::validation("Please select a reason", &["reason"]));
        }
        if !self
            .auth_provider
            .verify_password(&session.email, password)
            .await?
        {
            return Err(ServiceError::validation(INVALID_PASSWORD, &["currentPassword"]));
        }

        let user_id = session.user_id;
        let reason = reason.to_string();
        let mut conn = self.diesel_pool.get().await?;
        conn.transaction::<_, ServiceError, _>(|conn| {
            async move {
                AccountDeletion::record(conn, user_id, &reason).await?;
                // Pets and everything they own cascade from the profile
                Profile::delete(conn, user_id).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        self.auth_provider.delete_user(user_id).await?;
        info!("Deleted account {}", user_id);
        Ok(())
    }

    // =========================================================================
    // ONBOARDING
    // =========================================================================

    /// Save the profile and the first pets, mark onboarding complete and send the
    /// welcome email in the background.
    #[instrument(skip(self, form), fields(pets = form.pets.len()))]
    pub async fn onboard(
        &self,
        user_id: Uuid,
        form: OnboardingForm,
    ) -> Result<OnboardingResult, OnboardingError> {
        form.validate().map_err(OnboardingError::Invalid)?;
        let new_pets = form
            .pets
            .iter()
            .cloned()
            .map(|pet| pet.into_new_pet(user_id))
            .collect::<Result<Vec<_>, _>>()
            .map_err(OnboardingError::Invalid)?;

        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| OnboardingError::Profile(e.into()))?;

        Profile::upsert(&mut conn, &form.new_profile(user_id))
            .await
            .map_err(|e| {
                error!("Error updating profile during onboarding: {}", e);
                OnboardingError::Profile(e.into())
            })?;

        let pets = conn
            .transaction::<_, ServiceError, _>(|conn| {
                async move {
                    let mut created = Vec::with_capacity(new_pets.len());
                    for new_pet in &new_pets {
                        created.push(Pet::create(conn, new_pet).await?);
                    }
                    Ok(created)
                }
                .scope_boxed()
            })
            .await
            .map_err(|e| {
                error!("Error creating pet during onboarding: {}", e);
                OnboardingError::Pet(e)
            })?;

        let changes = ProfileChanges {
            has_completed_onboarding: Some(true),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        let profile = Profile::update(&mut conn, user_id, &changes)
            .await
            .map_err(|e| OnboardingError::Profile(e.into()))?;

        if let Some(first_pet) = pets.first() {
            self.email_service.spawn_welcome_email(
                profile.email.clone(),
                profile.first_name.clone(),
                first_pet.name.clone(),
            );
        }

        info!("Onboarded {} with {} pet(s)", user_id, pets.len());
        Ok(OnboardingResult { profile, pets })
    }
}
