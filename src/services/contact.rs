// Pet contacts. Primary reassignment and last-contact checks run in one transaction.

use diesel_async::{scoped_futures::ScopedFutureExt, AsyncConnection, AsyncPgConnection};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{
        contact::{
            ensure_not_last_contact, ContactChanges, CreateContactRequest, PetContact,
            UpdateContactRequest,
        },
        pet::{ensure_owned, Pet},
    },
    utils::{service_error::ServiceError, validation::require_id},
};

pub const CONTACT_ID_REQUIRED: &str = "Contact ID is required";
pub const PRIMARY_CONTACT_CHANGED: &str =
    "The primary contact was changed by another request, please try again";

/// The partial unique index on primary contacts rejects a racing promotion
fn primary_conflict(error: ServiceError) -> ServiceError {
    match error {
        ServiceError::Conflict(_) => ServiceError::Conflict(PRIMARY_CONTACT_CHANGED.to_string()),
        other => other,
    }
}

pub struct ContactService {
    diesel_pool: DieselPool,
}

impl ContactService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
        }
    }

    /// Contacts of an owned pet, primary first
    #[instrument(skip(self))]
    pub async fn list(&self, owner_id: Uuid, pet_id: Uuid) -> Result<Vec<PetContact>, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;
        Ok(PetContact::list_for_pet(&mut conn, pet_id).await?)
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        request: CreateContactRequest,
    ) -> Result<PetContact, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let new_contact = request.into_new_contact(pet_id)?;
        let contact = conn
            .transaction::<_, ServiceError, _>(|conn| {
                async move {
                    if new_contact.is_primary {
                        PetContact::demote_others(conn, pet_id, None).await?;
                    }
                    Ok(PetContact::create(conn, &new_contact).await?)
                }
                .scope_boxed()
            })
            .await
            .map_err(primary_conflict)?;

        info!("Added contact {} to pet {}", contact.id, pet_id);
        Ok(contact)
    }

    #[instrument(skip(self, request), fields(contact_id = ?request.contact_id))]
    pub async fn update(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        request: UpdateContactRequest,
    ) -> Result<PetContact, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let contact_id = require_id(request.contact_id, CONTACT_ID_REQUIRED, "contactId")?;
        let changes = request.changes()?;
        Self::apply_changes(&mut conn, pet_id, contact_id, changes).await
    }

    /// Make one contact the pet's primary, demoting whichever was primary before
    #[instrument(skip(self))]
    pub async fn set_primary(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        contact_id: Uuid,
    ) -> Result<PetContact, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let changes = ContactChanges {
            is_primary: Some(true),
            updated_at: Some(chrono::Utc::now()),
            ..Default::default()
        };
        Self::apply_changes(&mut conn, pet_id, contact_id, changes).await
    }

    async fn apply_changes(
        conn: &mut AsyncPgConnection,
        pet_id: Uuid,
        contact_id: Uuid,
        changes: ContactChanges,
    ) -> Result<PetContact, ServiceError> {
        conn.transaction::<_, ServiceError, _>(|conn| {
            async move {
                PetContact::find_for_pet(conn, pet_id, contact_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Contact"))?;

                if changes.is_primary == Some(true) {
                    PetContact::demote_others(conn, pet_id, Some(contact_id)).await?;
                }
                Ok(PetContact::update(conn, contact_id, &changes).await?)
            }
            .scope_boxed()
        })
        .await
        .map_err(primary_conflict)
    }

    /// Removes a contact. The last contact of a pet cannot be removed, and removing
    /// the primary promotes the oldest remaining one.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        contact_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;
        let contact_id = require_id(contact_id, CONTACT_ID_REQUIRED, "contactId")?;

        conn.transaction::<_, ServiceError, _>(|conn| {
            async move {
                let contact = PetContact::find_for_pet(conn, pet_id, contact_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Contact"))?;

                ensure_not_last_contact(PetContact::count_for_pet(conn, pet_id).await?)?;
                PetContact::delete(conn, contact_id).await?;

                if contact.is_primary {
                    PetContact::promote_oldest(conn, pet_id).await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        info!("Removed contact {} from pet {}", contact_id, pet_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_conflict_reads_as_primary_race() {
        let raw = ServiceError::Conflict(
            "duplicate key value violates unique constraint \"uq_pet_contacts_primary\"".into(),
        );
        assert_eq!(
            primary_conflict(raw),
            ServiceError::Conflict(PRIMARY_CONTACT_CHANGED.to_string())
        );
        assert_eq!(
            primary_conflict(ServiceError::LastContact),
            ServiceError::LastContact
        );
    }
}
