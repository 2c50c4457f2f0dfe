// QR code lookup and linking to pet profiles

use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{
        pet::{ensure_owned, Pet},
        qr_code::QrCode,
    },
    utils::service_error::ServiceError,
};

/// QR code as returned to clients, with the URL printed on the tag
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QrCodeView {
    #[serde(flatten)]
    pub qr_code: QrCode,
    pub redirect_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_url: Option<String>,
}

/// Public links derived from a base URL
#[derive(Debug, Clone)]
pub struct QrLinks {
    base_url: String,
}

impl QrLinks {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Public page of a pet
    pub fn pet_url(&self, pet_id: Uuid) -> String {
        format!("{}/p/{}", self.base_url, pet_id)
    }

    /// URL encoded into the printed QR code
    pub fn redirect_url(&self, code: &str) -> String {
        format!("{}/qr/{}", self.base_url, code)
    }

    pub fn view(&self, qr_code: QrCode) -> QrCodeView {
        QrCodeView {
            redirect_url: self.redirect_url(&qr_code.code),
            pet_url: qr_code.pet_id.map(|id| self.pet_url(id)),
            qr_code,
        }
    }
}

pub struct QrService {
    diesel_pool: DieselPool,
    links: QrLinks,
}

impl QrService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
            links: QrLinks::new(&state.config.public_base_url),
        }
    }

    pub fn links(&self) -> &QrLinks {
        &self.links
    }

    #[instrument(skip(self))]
    pub async fn get_by_code(&self, code: &str) -> Result<QrCodeView, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let qr_code = QrCode::find_by_code(&mut conn, code)
            .await?
            .ok_or_else(|| ServiceError::not_found("QR code"))?;
        Ok(self.links.view(qr_code))
    }

    #[instrument(skip(self))]
    pub async fn for_pet(&self, owner_id: Uuid, pet_id: Uuid) -> Result<Vec<QrCodeView>, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let codes = QrCode::list_for_pet(&mut conn, pet_id).await?;
        Ok(codes.into_iter().map(|c| self.links.view(c)).collect())
    }

    /// Codes linked to any pet of the user
    #[instrument(skip(self))]
    pub async fn for_user(&self, owner_id: Uuid) -> Result<Vec<QrCodeView>, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let pet_ids = Pet::ids_for_owner(&mut conn, owner_id).await?;
        if pet_ids.is_empty() {
            return Ok(Vec::new());
        }

        let codes = QrCode::list_for_pets(&mut conn, &pet_ids).await?;
        Ok(codes.into_iter().map(|c| self.links.view(c)).collect())
    }

    /// Link an active code to an owned pet. A code already on another user's pet is refused.
    #[instrument(skip(self))]
    pub async fn link(
        &self,
        owner_id: Uuid,
        code: &str,
        pet_id: Uuid,
    ) -> Result<QrCodeView, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let qr_code = QrCode::find_by_code(&mut conn, code)
            .await?
            .ok_or_else(|| ServiceError::not_found("QR code"))?;
        if !qr_code.is_active {
            return Err(ServiceError::validation("QR code is not active", &["code"]));
        }
        if let Some(current) = qr_code.pet_id.filter(|current| *current != pet_id) {
            let held_by_owner = Pet::find_by_id(&mut conn, current)
                .await?
                .is_some_and(|pet| pet.profile_id == owner_id);
            if !held_by_owner {
                return Err(ServiceError::Conflict(
                    "QR code is already linked to another pet".to_string(),
                ));
            }
        }

        let linked = QrCode::link(&mut conn, code, pet_id).await?;
        info!("Linked QR code {} to pet {}", code, pet_id);
        Ok(self.links.view(linked))
    }

    /// Detach a code from the user's pet; an unlinked code is returned unchanged
    #[instrument(skip(self))]
    pub async fn unlink(&self, owner_id: Uuid, code: &str) -> Result<QrCodeView, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let qr_code = QrCode::find_by_code(&mut conn, code)
            .await?
            .ok_or_else(|| ServiceError::not_found("QR code"))?;

        let Some(pet_id) = qr_code.pet_id else {
            return Ok(self.links.view(qr_code));
        };
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let unlinked = QrCode::unlink(&mut conn, code).await?;
        info!("Unlinked QR code {} from pet {}", code, pet_id);
        Ok(self.links.view(unlinked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_public_urls() {
        let links = QrLinks::new("https://petsqrcode.com/");
        let pet_id = Uuid::nil();

        assert_eq!(
            links.pet_url(pet_id),
            "https://petsqrcode.com/p/00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(links.redirect_url("AB12CD"), "https://petsqrcode.com/qr/AB12CD");
    }

    #[test]
    fn test_view_of_unlinked_code() {
        let links = QrLinks::new("http://localhost:5173");
        let view = links.view(QrCode {
            id: Uuid::new_v4(),
            code: "XY98".to_string(),
            pet_id: None,
            is_active: true,
            created_at: Utc::now(),
            linked_at: None,
        });

        assert_eq!(view.redirect_url, "http://localhost:5173/qr/XY98");
        assert!(view.pet_url.is_none());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["code"], "XY98");
        assert!(json.get("pet_url").is_none());
    }
}
