// HTTP handlers and route builders

pub mod account;
pub mod contacts;
pub mod dashboard;
pub mod docs;
pub mod maintenance;
pub mod pets;
pub mod profile;
pub mod qr;
pub mod subscriptions;
pub mod veterinarian;
pub mod waitlist;

use axum::{
    extract::{FromRequest, Multipart},
    routing::{get, post},
    Router,
};
use tracing::warn;

use crate::{app::AppState, services::pet::AvatarUpload, utils::service_error::ServiceError};

/// JSON request body whose rejections render as `ServiceError` JSON instead of plain text
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
pub struct JsonBody<T>(pub T);

/// File field names accepted for image uploads
const FILE_FIELDS: [&str; 2] = ["avatar", "file"];

/// Multipart body split into text fields and the uploaded image
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub file: Option<AvatarUpload>,
}

impl MultipartForm {
    /// Trimmed value of a text field; blank counts as absent
    pub fn value(&self, name: &str) -> Option<String> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// Drain a multipart body. A file part with no bytes is treated as not uploaded.
pub async fn read_multipart(mut multipart: Multipart) -> Result<MultipartForm, ServiceError> {
    let invalid = |e: axum::extract::multipart::MultipartError| {
        warn!("Rejected multipart body: {}", e);
        ServiceError::validation("Invalid upload", &["avatar"])
    };

    let mut form = MultipartForm::default();
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let name = field.name().unwrap_or_default().to_string();

        if FILE_FIELDS.contains(&name.as_str()) && field.file_name().is_some() {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(invalid)?;
            if !bytes.is_empty() {
                form.file = Some(AvatarUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field.text().await.map_err(invalid)?;
            form.fields.push((name, value));
        }
    }

    Ok(form)
}

/// Session-protected REST routes, mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/pets", get(pets::list_pets).post(pets::create_pet))
        .route(
            "/pets/subscriptions",
            get(subscriptions::list_subscriptions)
                .post(subscriptions::create_subscription)
                .put(subscriptions::update_subscription)
                .delete(subscriptions::cancel_subscription),
        )
        .route(
            "/pets/subscriptions/{pet_id}",
            get(subscriptions::get_pet_subscription)
                .post(subscriptions::subscribe_pet)
                .put(subscriptions::upsert_pet_subscription)
                .delete(subscriptions::cancel_pet_subscription),
        )
        .route(
            "/pets/{id}",
            get(pets::get_pet)
                .put(pets::update_pet)
                .delete(pets::delete_pet),
        )
        .route("/pets/{id}/avatar", post(pets::upload_avatar))
        .route("/pets/{id}/qr-codes", get(pets::list_qr_codes))
        .route(
            "/pets/{id}/contacts",
            get(contacts::list_contacts)
                .post(contacts::create_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        .route(
            "/pets/{id}/maintenance",
            get(maintenance::list_maintenance)
                .post(maintenance::create_maintenance)
                .put(maintenance::update_maintenance)
                .delete(maintenance::delete_maintenance),
        )
        .route(
            "/pets/{id}/veterinarian",
            get(veterinarian::list_veterinarian)
                .post(veterinarian::create_veterinarian)
                .put(veterinarian::update_veterinarian)
                .delete(veterinarian::delete_veterinarian),
        )
        .route("/qr", get(qr::list_user_qr_codes))
        .route("/qr/{code}", get(qr::get_qr_code))
        .route("/qr/{code}/link", post(qr::link_qr_code))
        .route("/qr/{code}/unlink", post(qr::unlink_qr_code))
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/profile/status", get(profile::account_status))
        .route("/profile/analytics", get(profile::analytics))
        .route("/profile/avatar", post(profile::upload_avatar))
        .route("/dashboard", get(dashboard::get_dashboard))
}

/// Session-protected form actions, mounted under `/account`
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/toggle-email-subscription",
            post(account::toggle_email_subscription),
        )
        .route("/update-email", post(account::update_email))
        .route("/update-password", post(account::update_password))
        .route("/delete-account", post(account::delete_account))
        .route("/onboarding", post(account::onboarding))
        .route("/add-pet", post(account::add_pet))
        .route("/delete-pet", post(account::delete_pet))
        .route("/maintenance/complete", post(account::complete_maintenance))
        .route(
            "/pet-profile/{id}/details",
            post(account::update_pet_details),
        )
        .route(
            "/pet-profile/{id}/maintenance/visibility",
            post(account::set_maintenance_visibility),
        )
        .route(
            "/pet-profile/{id}/veterinarian",
            post(account::upsert_veterinarian),
        )
}

/// Routes reachable without a session, mounted under `/api`
pub fn public_api_routes() -> Router<AppState> {
    Router::new()
        .route("/waitlist", post(waitlist::join_waitlist))
        .route("/pets/subscriptions/plans", get(subscriptions::list_plans))
        .route("/docs/openapi.json", get(docs::serve_openapi_spec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_value_trims_and_skips_blanks() {
        let form = MultipartForm {
            fields: vec![
                ("name".into(), "  Rex ".into()),
                ("bio".into(), "   ".into()),
            ],
            file: None,
        };
        assert_eq!(form.value("name").as_deref(), Some("Rex"));
        assert_eq!(form.value("bio"), None);
        assert_eq!(form.value("breed"), None);
    }
}
