// OpenAPI document generated from the handler annotations

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use utoipa::{
    openapi::{
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
        Server,
    },
    Modify, OpenApi,
};

use crate::{
    app::AppState,
    app_config::AppConfig,
    handlers::{
        contacts, dashboard, maintenance, pets, profile, qr, subscriptions, veterinarian, waitlist,
    },
    models::{
        contact::{CreateContactRequest, DeleteContactRequest, PetContact, UpdateContactRequest},
        maintenance::{
            CreateMaintenanceRequest, DeleteMaintenanceRequest, MaintenanceFrequency,
            PetMaintenance, UpcomingMaintenance, UpdateMaintenanceRequest,
        },
        pet::{CreatePetRequest, Pet, PetWithRelations, UpdatePetRequest},
        profile::{AccountStatus, Profile, UpdateProfileRequest, UserAnalytics},
        qr_code::{LinkQrRequest, QrCode},
        subscription::{
            PetSubscription, PetSubscriptionSummary, PlanType, SubscriptionRequest,
            UpdateSubscriptionRequest,
        },
        veterinarian::{
            CreateVeterinarianRequest, DeleteVeterinarianRequest, PetVeterinarian,
            UpdateVeterinarianRequest,
        },
        waitlist::JoinWaitlistRequest,
    },
    services::{qr::QrCodeView, subscription::SubscriptionPlan},
};

/// Registers the bearer token scheme referenced by `security(("bearerAuth" = []))`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Access token issued by the hosted auth service"))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "PetsQRCode API",
        description = "Pet profiles, QR tags, maintenance reminders and subscriptions",
        version = "1.0.0"
    ),
    paths(
        crate::health_check,
        pets::list_pets,
        pets::create_pet,
        pets::get_pet,
        pets::update_pet,
        pets::delete_pet,
        pets::upload_avatar,
        pets::list_qr_codes,
        contacts::list_contacts,
        contacts::create_contact,
        contacts::update_contact,
        contacts::delete_contact,
        maintenance::list_maintenance,
        maintenance::create_maintenance,
        maintenance::update_maintenance,
        maintenance::delete_maintenance,
        veterinarian::list_veterinarian,
        veterinarian::create_veterinarian,
        veterinarian::update_veterinarian,
        veterinarian::delete_veterinarian,
        qr::list_user_qr_codes,
        qr::get_qr_code,
        qr::link_qr_code,
        qr::unlink_qr_code,
        subscriptions::list_subscriptions,
        subscriptions::create_subscription,
        subscriptions::update_subscription,
        subscriptions::cancel_subscription,
        subscriptions::list_plans,
        subscriptions::get_pet_subscription,
        subscriptions::subscribe_pet,
        subscriptions::upsert_pet_subscription,
        subscriptions::cancel_pet_subscription,
        profile::get_profile,
        profile::update_profile,
        profile::account_status,
        profile::analytics,
        profile::upload_avatar,
        dashboard::get_dashboard,
        waitlist::join_waitlist,
    ),
    components(schemas(
        Pet,
        PetWithRelations,
        CreatePetRequest,
        UpdatePetRequest,
        PetContact,
        CreateContactRequest,
        UpdateContactRequest,
        DeleteContactRequest,
        PetMaintenance,
        MaintenanceFrequency,
        UpcomingMaintenance,
        CreateMaintenanceRequest,
        UpdateMaintenanceRequest,
        DeleteMaintenanceRequest,
        PetVeterinarian,
        CreateVeterinarianRequest,
        UpdateVeterinarianRequest,
        DeleteVeterinarianRequest,
        QrCode,
        QrCodeView,
        LinkQrRequest,
        PlanType,
        PetSubscription,
        PetSubscriptionSummary,
        SubscriptionPlan,
        SubscriptionRequest,
        UpdateSubscriptionRequest,
        subscriptions::PlanRequest,
        Profile,
        UpdateProfileRequest,
        AccountStatus,
        UserAnalytics,
        dashboard::Dashboard,
        JoinWaitlistRequest,
    )),
    tags(
        (name = "Pets", description = "Pet profiles"),
        (name = "Contacts", description = "Emergency contacts of a pet"),
        (name = "Maintenance", description = "Recurring care items"),
        (name = "Veterinarian", description = "The pet's veterinarian"),
        (name = "QR Codes", description = "Printed tags linked to pets"),
        (name = "Subscriptions", description = "Per-pet plans"),
        (name = "Profile", description = "Owner profile"),
        (name = "Dashboard", description = "Signed-in overview"),
        (name = "Waitlist", description = "Pre-launch sign-ups"),
        (name = "Health", description = "Service health checks")
    )
)]
pub struct ApiDoc;

/// Generated document with the deployment's base URL as the server
pub fn build_openapi_spec(config: &AppConfig) -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    let mut server = Server::new(config.public_base_url.trim_end_matches('/'));
    server.description = Some(format!("Current server ({})", config.environment));
    spec.servers = Some(vec![server]);
    spec
}

/// Serve OpenAPI JSON at /api/docs/openapi.json
pub async fn serve_openapi_spec(State(app_state): State<AppState>) -> Response {
    let spec = build_openapi_spec(app_state.config.as_ref());

    match serde_json::to_string(&spec) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize OpenAPI document: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}
