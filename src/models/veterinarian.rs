use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    schema::pet_veterinarian,
    utils::{
        service_error::ServiceError,
        validation::{require_fields, trim_optional_field},
    },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable, ToSchema)]
#[diesel(table_name = pet_veterinarian)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PetVeterinarian {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub country: String,
    pub address: String,
    pub email: String,
    pub phone_number: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pet_veterinarian)]
pub struct NewPetVeterinarian {
    pub pet_id: Uuid,
    pub country: String,
    pub address: String,
    pub email: String,
    pub phone_number: String,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = pet_veterinarian)]
pub struct VeterinarianChanges {
    pub country: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub is_public: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&NewPetVeterinarian> for VeterinarianChanges {
    fn from(vet: &NewPetVeterinarian) -> Self {
        VeterinarianChanges {
            country: Some(vet.country.clone()),
            address: Some(vet.address.clone()),
            email: Some(vet.email.clone()),
            phone_number: Some(vet.phone_number.clone()),
            is_public: Some(vet.is_public),
            updated_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateVeterinarianRequest {
    #[validate(length(max = 100, message = "Country must be less than 100 characters"))]
    pub country: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 255, message = "Email must be less than 255 characters"))]
    pub email: Option<String>,
    #[validate(length(max = 50, message = "Phone number must be less than 50 characters"))]
    pub phone_number: Option<String>,
    pub is_public: Option<bool>,
}

impl CreateVeterinarianRequest {
    pub fn into_new_veterinarian(self, pet_id: Uuid) -> Result<NewPetVeterinarian, ServiceError> {
        require_fields(&[
            ("country", self.country.as_deref()),
            ("address", self.address.as_deref()),
            ("email", self.email.as_deref()),
            ("phone_number", self.phone_number.as_deref()),
        ])?;
        self.validate()?;

        Ok(NewPetVeterinarian {
            pet_id,
            country: self.country.unwrap_or_default().trim().to_string(),
            address: self.address.unwrap_or_default().trim().to_string(),
            email: self.email.unwrap_or_default().trim().to_string(),
            phone_number: self.phone_number.unwrap_or_default().trim().to_string(),
            is_public: self.is_public.unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVeterinarianRequest {
    pub vet_id: Option<Uuid>,
    #[validate(length(max = 100, message = "Country must be less than 100 characters"))]
    pub country: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "phone_number")]
    pub phone_number: Option<String>,
    #[serde(alias = "is_public")]
    pub is_public: Option<bool>,
}

impl UpdateVeterinarianRequest {
    pub fn changes(&self) -> Result<VeterinarianChanges, ServiceError> {
        self.validate()?;
        Ok(VeterinarianChanges {
            country: trim_optional_field(self.country.as_ref()),
            address: trim_optional_field(self.address.as_ref()),
            email: trim_optional_field(self.email.as_ref()),
            phone_number: trim_optional_field(self.phone_number.as_ref()),
            is_public: self.is_public,
            updated_at: Some(Utc::now()),
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteVeterinarianRequest {
    pub vet_id: Option<Uuid>,
}

impl PetVeterinarian {
    pub async fn list_for_pet(conn: &mut AsyncPgConnection, pet_id: Uuid) -> QueryResult<Vec<PetVeterinarian>> {
        pet_veterinarian::table
            .filter(pet_veterinarian::pet_id.eq(pet_id))
            .select(PetVeterinarian::as_select())
            .load(conn)
            .await
    }

    pub async fn find_for_pet(conn: &mut AsyncPgConnection, pet_id: Uuid) -> QueryResult<Option<PetVeterinarian>> {
        pet_veterinarian::table
            .filter(pet_veterinarian::pet_id.eq(pet_id))
            .select(PetVeterinarian::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        vet: &NewPetVeterinarian,
    ) -> QueryResult<PetVeterinarian> {
        diesel::insert_into(pet_veterinarian::table)
            .values(vet)
            .returning(PetVeterinarian::as_returning())
            .get_result(conn)
            .await
    }

    /// Update a pet's veterinarian row, scoped so a vet id from another pet matches nothing
    pub async fn update_for_pet(
        conn: &mut AsyncPgConnection,
        pet_id: Uuid,
        vet_id: Uuid,
        changes: &VeterinarianChanges,
    ) -> QueryResult<Option<PetVeterinarian>> {
        diesel::update(
            pet_veterinarian::table
                .filter(pet_veterinarian::id.eq(vet_id))
                .filter(pet_veterinarian::pet_id.eq(pet_id)),
        )
        .set(changes)
        .returning(PetVeterinarian::as_returning())
        .get_result(conn)
        .await
        .optional()
    }

    /// Insert or replace the single veterinarian row of a pet
    pub async fn upsert(
        conn: &mut AsyncPgConnection,
        vet: &NewPetVeterinarian,
    ) -> QueryResult<PetVeterinarian> {
        diesel::insert_into(pet_veterinarian::table)
            .values(vet)
            .on_conflict(pet_veterinarian::pet_id)
            .do_update()
            .set(&VeterinarianChanges::from(vet))
            .returning(PetVeterinarian::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn delete_for_pet(
        conn: &mut AsyncPgConnection,
        pet_id: Uuid,
        vet_id: Uuid,
    ) -> QueryResult<usize> {
        diesel::delete(
            pet_veterinarian::table
                .filter(pet_veterinarian::id.eq(vet_id))
                .filter(pet_veterinarian::pet_id.eq(pet_id)),
        )
        .execute(conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields() {
        let request = CreateVeterinarianRequest {
            country: Some("NZ".into()),
            email: Some("clinic@example.com".into()),
            ..Default::default()
        };
        assert_eq!(
            request.into_new_veterinarian(Uuid::new_v4()).unwrap_err(),
            ServiceError::MissingFields(vec!["address".into(), "phone_number".into()])
        );
    }

    #[test]
    fn test_upsert_changes_cover_every_column() {
        let vet = NewPetVeterinarian {
            pet_id: Uuid::new_v4(),
            country: "NZ".into(),
            address: "12 Clinic Rd".into(),
            email: "clinic@example.com".into(),
            phone_number: "555-0199".into(),
            is_public: false,
        };
        let changes = VeterinarianChanges::from(&vet);
        assert_eq!(changes.country.as_deref(), Some("NZ"));
        assert_eq!(changes.is_public, Some(false));
        assert!(changes.updated_at.is_some());
    }
}
