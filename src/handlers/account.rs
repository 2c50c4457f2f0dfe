// Account form actions. Bodies are urlencoded (multipart for add-pet) and
// failures come back as `ActionFailure` with the submitted values echoed.

use axum::{
    extract::{Multipart, Path, State},
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use crate::{
    app::AppState,
    handlers::{read_multipart, MultipartForm},
    middleware::AuthenticatedUser,
    models::{
        onboarding::OnboardingForm,
        pet::{CreatePetRequest, UpdatePetRequest},
        veterinarian::CreateVeterinarianRequest,
    },
    services::{
        maintenance::MaintenanceService,
        pet::PetService,
        user::{OnboardingError, PasswordChange, UserService},
        veterinarian::VeterinarianService,
    },
    utils::{action_failure::ActionFailure, service_error::ServiceError},
};

type ActionResult = Result<Json<Value>, ActionFailure>;

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// Parse a required id field, reporting it by its form name
fn form_id(raw: &str, field: &str) -> Result<Uuid, ActionFailure> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ActionFailure::bad_request(format!("{} is required", field)).with_fields([field]));
    }
    Uuid::parse_str(raw)
        .map_err(|_| ActionFailure::bad_request(format!("Invalid {}", field)).with_fields([field]))
}

// =============================================================================
// FORMS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct EmailForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordForm {
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
    #[serde(default)]
    pub current_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePetForm {
    #[serde(default)]
    pub pet_id: String,
    #[serde(default)]
    pub confirm_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMaintenanceForm {
    #[serde(default)]
    pub maintenance_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PetDetailsForm {
    pub name: Option<String>,
    pub second_name: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    #[serde(rename = "type")]
    pub pet_type: Option<String>,
    pub breed: Option<String>,
    pub temperament: Option<String>,
    pub allergies: Option<String>,
    pub food: Option<String>,
    pub favourite_treats: Option<String>,
}

impl From<PetDetailsForm> for UpdatePetRequest {
    fn from(form: PetDetailsForm) -> Self {
        UpdatePetRequest {
            name: form.name,
            second_name: form.second_name,
            date_of_birth: form.date_of_birth,
            gender: form.gender,
            pet_type: form.pet_type,
            breed: form.breed,
            temperament: form.temperament,
            food: form.food,
            favourite_treats: form.favourite_treats,
            allergies: form.allergies,
            bio: form.bio,
            ..Default::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityForm {
    #[serde(default)]
    pub hide_details: String,
}

impl VisibilityForm {
    fn is_public(&self) -> bool {
        self.hide_details != "true"
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VeterinarianForm {
    pub country: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub is_public: Option<String>,
}

impl From<VeterinarianForm> for CreateVeterinarianRequest {
    fn from(form: VeterinarianForm) -> Self {
        CreateVeterinarianRequest {
            country: form.country,
            address: form.address,
            email: form.email,
            phone_number: form.phone_number,
            // Unchecked boxes are not submitted at all
            is_public: Some(form.is_public.as_deref() == Some("on")),
        }
    }
}

fn create_pet_request(form: &MultipartForm) -> CreatePetRequest {
    CreatePetRequest {
        name: form.value("name"),
        second_name: form.value("second_name"),
        date_of_birth: form.value("date_of_birth"),
        gender: form.value("gender"),
        pet_type: form.value("pet_type"),
        breed: form.value("breed"),
        temperament: form.value("temperament"),
        food: form.value("food"),
        favourite_treats: form.value("favourite_treats"),
        allergies: form.value("allergies"),
        bio: form.value("bio"),
        ..Default::default()
    }
}

// =============================================================================
// ACCOUNT SETTINGS
// =============================================================================

/// POST /account/toggle-email-subscription
pub async fn toggle_email_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ActionResult {
    match UserService::new(&state)
        .toggle_email_subscription(user.user_id)
        .await
    {
        Ok(unsubscribed) => Ok(Json(json!({ "unsubscribed": unsubscribed }))),
        Err(e) => {
            error!("Error toggling email subscription for {}: {}", user.user_id, e);
            Err(ActionFailure::server_error("Failed to update subscription status"))
        },
    }
}

/// POST /account/update-email
pub async fn update_email(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Form(form): Form<EmailForm>,
) -> ActionResult {
    UserService::new(&state)
        .update_email(&user.session_identity(), &form.email)
        .await
        .map_err(|e| ActionFailure::from(e).with_value("email", form.email.clone()))?;
    Ok(Json(json!({ "email": form.email.trim() })))
}

/// POST /account/update-password
pub async fn update_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Form(form): Form<PasswordForm>,
) -> ActionResult {
    let change = PasswordChange {
        new_password1: form.new_password1,
        new_password2: form.new_password2,
        current_password: form.current_password,
    };

    UserService::new(&state)
        .update_password(&user.session_identity(), &change)
        .await
        .map_err(|e| {
            ActionFailure::from(e)
                .with_value("newPassword1", change.new_password1.clone())
                .with_value("newPassword2", change.new_password2.clone())
                .with_value("currentPassword", change.current_password.clone())
        })?;
    Ok(success())
}

/// POST /account/delete-account
pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Form(form): Form<DeleteAccountForm>,
) -> ActionResult {
    UserService::new(&state)
        .delete_account(&user.session_identity(), &form.current_password, &form.reason)
        .await
        .map_err(|e| ActionFailure::from(e).with_value("reason", form.reason.clone()))?;
    Ok(success())
}

// =============================================================================
// ONBOARDING
// =============================================================================

impl From<OnboardingError> for ActionFailure {
    fn from(error: OnboardingError) -> Self {
        match error {
            OnboardingError::Invalid(e) => e.into(),
            e => ActionFailure::server_error(e.to_string()),
        }
    }
}

/// POST /account/onboarding
pub async fn onboarding(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Form(pairs): Form<Vec<(String, String)>>,
) -> ActionResult {
    let form = OnboardingForm::from_pairs(&pairs);
    let echo: Vec<(&'static str, String)> = form
        .echo_values()
        .iter()
        .map(|(key, value)| (*key, value.to_string()))
        .collect();

    match UserService::new(&state).onboard(user.user_id, form).await {
        Ok(result) => Ok(Json(json!({
            "success": true,
            "profile": result.profile,
            "pets": result.pets,
        }))),
        Err(e) => Err(echo
            .into_iter()
            .fold(ActionFailure::from(e), |failure, (key, value)| {
                failure.with_value(key, value)
            })),
    }
}

// =============================================================================
// PETS
// =============================================================================

/// POST /account/add-pet (multipart, optional `avatar` file)
pub async fn add_pet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> ActionResult {
    let form = read_multipart(multipart).await?;
    let request = create_pet_request(&form);

    PetService::new(&state)
        .create_pet_with_avatar(user.user_id, request, form.file)
        .await
        .map_err(|e| match e {
            ServiceError::Storage(_) => {
                error!("Error uploading avatar: {}", e);
                ActionFailure::server_error("Error uploading avatar")
            },
            ServiceError::Database(_) | ServiceError::Pool(_) => {
                error!("Error creating pet: {}", e);
                ActionFailure::server_error("Error creating pet")
            },
            e => e.into(),
        })?;
    Ok(success())
}

/// POST /account/delete-pet
pub async fn delete_pet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Form(form): Form<DeletePetForm>,
) -> ActionResult {
    let pet_id = form_id(&form.pet_id, "petId")?;
    PetService::new(&state)
        .delete_pet_confirmed(user.user_id, pet_id, &form.confirm_name)
        .await?;
    Ok(success())
}

/// POST /account/maintenance/complete
pub async fn complete_maintenance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Form(form): Form<CompleteMaintenanceForm>,
) -> ActionResult {
    let maintenance_id = form_id(&form.maintenance_id, "maintenanceId")?;
    MaintenanceService::new(&state)
        .mark_complete(user.user_id, maintenance_id)
        .await?;
    Ok(success())
}

/// POST /account/pet-profile/{id}/details
pub async fn update_pet_details(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    Form(form): Form<PetDetailsForm>,
) -> ActionResult {
    let pet = PetService::new(&state)
        .update_pet(user.user_id, pet_id, form.into())
        .await?;
    Ok(Json(json!({ "success": true, "pet": pet })))
}

/// POST /account/pet-profile/{id}/maintenance/visibility
pub async fn set_maintenance_visibility(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    Form(form): Form<VisibilityForm>,
) -> ActionResult {
    let service = MaintenanceService::new(&state);
    service
        .set_visibility(user.user_id, pet_id, form.is_public())
        .await?;
    let maintenance = service.list(user.user_id, pet_id).await?;
    Ok(Json(json!({ "success": true, "maintenance": maintenance })))
}

/// POST /account/pet-profile/{id}/veterinarian
pub async fn upsert_veterinarian(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<Uuid>,
    Form(form): Form<VeterinarianForm>,
) -> ActionResult {
    let veterinarian = VeterinarianService::new(&state)
        .upsert(user.user_id, pet_id, form.into())
        .await?;
    Ok(Json(json!({ "success": true, "veterinarian": veterinarian })))
}
