use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    schema::pet_contacts,
    utils::{
        service_error::ServiceError,
        validation::{require_fields, trim_optional_field},
    },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable, ToSchema)]
#[diesel(table_name = pet_contacts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PetContact {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub full_name: String,
    pub address: String,
    pub email: String,
    pub phone_number: String,
    pub is_primary: bool,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pet_contacts)]
pub struct NewPetContact {
    pub pet_id: Uuid,
    pub full_name: String,
    pub address: String,
    pub email: String,
    pub phone_number: String,
    pub is_primary: bool,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = pet_contacts)]
pub struct ContactChanges {
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub is_primary: Option<bool>,
    pub is_public: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateContactRequest {
    #[validate(length(max = 255, message = "Full name must be less than 255 characters"))]
    pub full_name: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 255, message = "Email must be less than 255 characters"))]
    pub email: Option<String>,
    #[validate(length(max = 50, message = "Phone number must be less than 50 characters"))]
    pub phone_number: Option<String>,
    pub is_primary: Option<bool>,
    pub is_public: Option<bool>,
}

impl CreateContactRequest {
    pub fn into_new_contact(self, pet_id: Uuid) -> Result<NewPetContact, ServiceError> {
        require_fields(&[
            ("full_name", self.full_name.as_deref()),
            ("address", self.address.as_deref()),
            ("email", self.email.as_deref()),
            ("phone_number", self.phone_number.as_deref()),
        ])?;
        self.validate()?;

        Ok(NewPetContact {
            pet_id,
            full_name: self.full_name.unwrap_or_default().trim().to_string(),
            address: self.address.unwrap_or_default().trim().to_string(),
            email: self.email.unwrap_or_default().trim().to_string(),
            phone_number: self.phone_number.unwrap_or_default().trim().to_string(),
            is_primary: self.is_primary.unwrap_or(false),
            is_public: self.is_public.unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactRequest {
    pub contact_id: Option<Uuid>,
    #[serde(alias = "full_name")]
    #[validate(length(max = 255, message = "Full name must be less than 255 characters"))]
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "phone_number")]
    pub phone_number: Option<String>,
    #[serde(alias = "is_primary")]
    pub is_primary: Option<bool>,
    #[serde(alias = "is_public")]
    pub is_public: Option<bool>,
}

impl UpdateContactRequest {
    pub fn changes(&self) -> Result<ContactChanges, ServiceError> {
        self.validate()?;
        Ok(ContactChanges {
            full_name: trim_optional_field(self.full_name.as_ref()),
            address: trim_optional_field(self.address.as_ref()),
            email: trim_optional_field(self.email.as_ref()),
            phone_number: trim_optional_field(self.phone_number.as_ref()),
            is_primary: self.is_primary,
            is_public: self.is_public,
            updated_at: Some(Utc::now()),
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteContactRequest {
    pub contact_id: Option<Uuid>,
}

// =============================================================================
// QUERIES
// =============================================================================

impl PetContact {
    /// Contacts of a pet, primary first then oldest first
    pub async fn list_for_pet(conn: &mut AsyncPgConnection, pet_id: Uuid) -> QueryResult<Vec<PetContact>> {
        pet_contacts::table
            .filter(pet_contacts::pet_id.eq(pet_id))
            .order((pet_contacts::is_primary.desc(), pet_contacts::created_at.asc()))
            .select(PetContact::as_select())
            .load(conn)
            .await
    }

    pub async fn find_for_pet(
        conn: &mut AsyncPgConnection,
        pet_id: Uuid,
        contact_id: Uuid,
    ) -> QueryResult<Option<PetContact>> {
        pet_contacts::table
            .filter(pet_contacts::id.eq(contact_id))
            .filter(pet_contacts::pet_id.eq(pet_id))
            .select(PetContact::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn count_for_pet(conn: &mut AsyncPgConnection, pet_id: Uuid) -> QueryResult<i64> {
        pet_contacts::table
            .filter(pet_contacts::pet_id.eq(pet_id))
            .count()
            .get_result(conn)
            .await
    }

    /// Clears the primary flag on every contact of the pet except `keep`
    pub async fn demote_others(
        conn: &mut AsyncPgConnection,
        pet_id: Uuid,
        keep: Option<Uuid>,
    ) -> QueryResult<usize> {
        // Uuid::nil never matches a generated id
        let keep = keep.unwrap_or_else(Uuid::nil);

        diesel::update(
            pet_contacts::table
                .filter(pet_contacts::pet_id.eq(pet_id))
                .filter(pet_contacts::is_primary.eq(true))
                .filter(pet_contacts::id.ne(keep)),
        )
        .set((
            pet_contacts::is_primary.eq(false),
            pet_contacts::updated_at.eq(Some(Utc::now())),
        ))
        .execute(conn)
        .await
    }

    pub async fn create(conn: &mut AsyncPgConnection, contact: &NewPetContact) -> QueryResult<PetContact> {
        diesel::insert_into(pet_contacts::table)
            .values(contact)
            .returning(PetContact::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        contact_id: Uuid,
        changes: &ContactChanges,
    ) -> QueryResult<PetContact> {
        diesel::update(pet_contacts::table.filter(pet_contacts::id.eq(contact_id)))
            .set(changes)
            .returning(PetContact::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn delete(conn: &mut AsyncPgConnection, contact_id: Uuid) -> QueryResult<usize> {
        diesel::delete(pet_contacts::table.filter(pet_contacts::id.eq(contact_id)))
            .execute(conn)
            .await
    }

    /// Marks the oldest remaining contact of the pet as primary
    pub async fn promote_oldest(conn: &mut AsyncPgConnection, pet_id: Uuid) -> QueryResult<Option<PetContact>> {
        let oldest: Option<Uuid> = pet_contacts::table
            .filter(pet_contacts::pet_id.eq(pet_id))
            .order(pet_contacts::created_at.asc())
            .select(pet_contacts::id)
            .first(conn)
            .await
            .optional()?;

        match oldest {
            Some(id) => {
                let changes = ContactChanges {
                    is_primary: Some(true),
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                };
                PetContact::update(conn, id, &changes).await.map(Some)
            },
            None => Ok(None),
        }
    }
}

/// A pet must keep at least one contact
pub fn ensure_not_last_contact(remaining_including_target: i64) -> Result<(), ServiceError> {
    if remaining_including_target <= 1 {
        Err(ServiceError::LastContact)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_contact_cannot_be_deleted() {
        assert_eq!(ensure_not_last_contact(1), Err(ServiceError::LastContact));
        assert_eq!(ensure_not_last_contact(0), Err(ServiceError::LastContact));
        assert!(ensure_not_last_contact(2).is_ok());
    }

    #[test]
    fn test_create_contact_defaults() {
        let pet_id = Uuid::new_v4();
        let request = CreateContactRequest {
            full_name: Some("Ada Owner".into()),
            address: Some("1 Main St".into()),
            email: Some("ada@example.com".into()),
            phone_number: Some("555-0100".into()),
            ..Default::default()
        };

        let contact = request.into_new_contact(pet_id).unwrap();
        assert_eq!(contact.pet_id, pet_id);
        assert!(!contact.is_primary);
        assert!(contact.is_public);
    }

    #[test]
    fn test_create_contact_requires_fields() {
        let request = CreateContactRequest {
            full_name: Some("Ada Owner".into()),
            ..Default::default()
        };

        assert_eq!(
            request.into_new_contact(Uuid::new_v4()).unwrap_err(),
            ServiceError::MissingFields(vec![
                "address".into(),
                "email".into(),
                "phone_number".into()
            ])
        );
    }

    #[test]
    fn test_update_request_accepts_both_casings() {
        let id = Uuid::new_v4();
        let camel: UpdateContactRequest = serde_json::from_value(serde_json::json!({
            "contactId": id,
            "isPrimary": true,
        }))
        .unwrap();
        let snake: UpdateContactRequest = serde_json::from_value(serde_json::json!({
            "contactId": id,
            "is_primary": true,
            "full_name": "Grace",
        }))
        .unwrap();

        assert_eq!(camel.is_primary, Some(true));
        assert_eq!(snake.is_primary, Some(true));
        assert_eq!(snake.full_name.as_deref(), Some("Grace"));
    }
}
