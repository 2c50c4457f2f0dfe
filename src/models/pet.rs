// Pet records and their request payloads

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{contact::PetContact, maintenance::PetMaintenance, veterinarian::PetVeterinarian},
    schema::pets,
    utils::{
        service_error::ServiceError,
        validation::{parse_calendar_date, require_fields, trim_optional_field},
    },
};

/// Pet database model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable, ToSchema)]
#[diesel(table_name = pets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Pet {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub name: String,
    pub second_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub pet_type: String,
    pub breed: String,
    pub temperament: Option<String>,
    pub food: Option<String>,
    pub favourite_treats: Option<String>,
    pub allergies: Option<String>,
    pub bio: Option<String>,
    pub profile_url: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// New pet for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pets)]
pub struct NewPet {
    pub profile_id: Uuid,
    pub name: String,
    pub second_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub pet_type: String,
    pub breed: String,
    pub temperament: Option<String>,
    pub food: Option<String>,
    pub favourite_treats: Option<String>,
    pub allergies: Option<String>,
    pub bio: Option<String>,
    pub profile_url: Option<String>,
    pub avatar_url: Option<String>,
}

/// Partial pet update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = pets)]
pub struct PetChanges {
    pub name: Option<String>,
    pub second_name: Option<Option<String>>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub pet_type: Option<String>,
    pub breed: Option<String>,
    pub temperament: Option<Option<String>>,
    pub food: Option<Option<String>>,
    pub favourite_treats: Option<Option<String>>,
    pub allergies: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub profile_url: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Pet together with its sub-resources
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PetWithRelations {
    #[serde(flatten)]
    pub pet: Pet,
    pub pet_contacts: Vec<PetContact>,
    pub pet_maintenance: Vec<PetMaintenance>,
    pub pet_veterinarian: Vec<PetVeterinarian>,
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Request to create a pet
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreatePetRequest {
    #[validate(length(max = 255, message = "Name must be less than 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 255, message = "Second name must be less than 255 characters"))]
    pub second_name: Option<String>,
    #[schema(example = "2021-04-12")]
    pub date_of_birth: Option<String>,
    #[validate(length(max = 50, message = "Gender must be less than 50 characters"))]
    pub gender: Option<String>,
    #[validate(length(max = 100, message = "Pet type must be less than 100 characters"))]
    pub pet_type: Option<String>,
    #[validate(length(max = 255, message = "Breed must be less than 255 characters"))]
    pub breed: Option<String>,
    pub temperament: Option<String>,
    pub food: Option<String>,
    pub favourite_treats: Option<String>,
    pub allergies: Option<String>,
    #[validate(length(max = 2000, message = "Bio must be less than 2000 characters"))]
    pub bio: Option<String>,
    pub profile_url: Option<String>,
    pub avatar_url: Option<String>,
}

impl CreatePetRequest {
    pub const REQUIRED_FIELDS: [&'static str; 5] =
        ["name", "date_of_birth", "gender", "pet_type", "breed"];

    /// Check required fields and build the insertable row
    pub fn into_new_pet(self, owner_id: Uuid) -> Result<NewPet, ServiceError> {
        require_fields(&[
            ("name", self.name.as_deref()),
            ("date_of_birth", self.date_of_birth.as_deref()),
            ("gender", self.gender.as_deref()),
            ("pet_type", self.pet_type.as_deref()),
            ("breed", self.breed.as_deref()),
        ])?;
        self.validate()?;

        let date_of_birth =
            parse_calendar_date(self.date_of_birth.as_deref().unwrap_or_default(), "date_of_birth")?;

        Ok(NewPet {
            profile_id: owner_id,
            name: self.name.unwrap_or_default().trim().to_string(),
            second_name: trim_optional_field(self.second_name.as_ref()),
            date_of_birth,
            gender: self.gender.unwrap_or_default().trim().to_string(),
            pet_type: self.pet_type.unwrap_or_default().trim().to_string(),
            breed: self.breed.unwrap_or_default().trim().to_string(),
            temperament: trim_optional_field(self.temperament.as_ref()),
            food: trim_optional_field(self.food.as_ref()),
            favourite_treats: trim_optional_field(self.favourite_treats.as_ref()),
            allergies: trim_optional_field(self.allergies.as_ref()),
            bio: trim_optional_field(self.bio.as_ref()),
            profile_url: trim_optional_field(self.profile_url.as_ref()),
            avatar_url: trim_optional_field(self.avatar_url.as_ref()),
        })
    }
}

/// Request to update a pet. Blank values are ignored rather than clearing a column.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePetRequest {
    #[validate(length(max = 255, message = "Name must be less than 255 characters"))]
    pub name: Option<String>,
    pub second_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub pet_type: Option<String>,
    pub breed: Option<String>,
    pub temperament: Option<String>,
    pub food: Option<String>,
    pub favourite_treats: Option<String>,
    pub allergies: Option<String>,
    #[validate(length(max = 2000, message = "Bio must be less than 2000 characters"))]
    pub bio: Option<String>,
    pub profile_url: Option<String>,
    pub avatar_url: Option<String>,
}

impl UpdatePetRequest {
    pub fn into_changes(self) -> Result<PetChanges, ServiceError> {
        self.validate()?;

        let date_of_birth = match trim_optional_field(self.date_of_birth.as_ref()) {
            Some(raw) => Some(parse_calendar_date(&raw, "date_of_birth")?),
            None => None,
        };
        let optional = |value: Option<String>| trim_optional_field(value.as_ref()).map(Some);

        Ok(PetChanges {
            name: trim_optional_field(self.name.as_ref()),
            second_name: optional(self.second_name),
            date_of_birth,
            gender: trim_optional_field(self.gender.as_ref()),
            pet_type: trim_optional_field(self.pet_type.as_ref()),
            breed: trim_optional_field(self.breed.as_ref()),
            temperament: optional(self.temperament),
            food: optional(self.food),
            favourite_treats: optional(self.favourite_treats),
            allergies: optional(self.allergies),
            bio: optional(self.bio),
            profile_url: optional(self.profile_url),
            avatar_url: optional(self.avatar_url),
            updated_at: Some(Utc::now()),
        })
    }
}

// =============================================================================
// QUERIES
// =============================================================================

impl Pet {
    pub async fn find_by_id(conn: &mut AsyncPgConnection, pet_id: Uuid) -> QueryResult<Option<Pet>> {
        pets::table
            .filter(pets::id.eq(pet_id))
            .select(Pet::as_select())
            .first(conn)
            .await
            .optional()
    }

    /// All pets of one profile, ordered by name
    pub async fn list_for_owner(conn: &mut AsyncPgConnection, owner_id: Uuid) -> QueryResult<Vec<Pet>> {
        pets::table
            .filter(pets::profile_id.eq(owner_id))
            .order(pets::name.asc())
            .select(Pet::as_select())
            .load(conn)
            .await
    }

    pub async fn ids_for_owner(conn: &mut AsyncPgConnection, owner_id: Uuid) -> QueryResult<Vec<Uuid>> {
        pets::table
            .filter(pets::profile_id.eq(owner_id))
            .select(pets::id)
            .load(conn)
            .await
    }

    pub async fn count_for_owner(conn: &mut AsyncPgConnection, owner_id: Uuid) -> QueryResult<i64> {
        pets::table
            .filter(pets::profile_id.eq(owner_id))
            .count()
            .get_result(conn)
            .await
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_pet: &NewPet) -> QueryResult<Pet> {
        diesel::insert_into(pets::table)
            .values(new_pet)
            .returning(Pet::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        pet_id: Uuid,
        changes: &PetChanges,
    ) -> QueryResult<Pet> {
        diesel::update(pets::table.filter(pets::id.eq(pet_id)))
            .set(changes)
            .returning(Pet::as_returning())
            .get_result(conn)
            .await
    }

    /// Deletes the pet; contacts, maintenance, veterinarian and subscriptions cascade
    pub async fn delete(conn: &mut AsyncPgConnection, pet_id: Uuid) -> QueryResult<usize> {
        diesel::delete(pets::table.filter(pets::id.eq(pet_id)))
            .execute(conn)
            .await
    }
}

/// Ownership check: the pet must exist and belong to `owner_id`.
/// Foreign pets are indistinguishable from missing ones.
pub fn ensure_owned(pet: Option<Pet>, owner_id: Uuid) -> Result<Pet, ServiceError> {
    match pet {
        Some(pet) if pet.profile_id == owner_id => Ok(pet),
        _ => Err(ServiceError::pet_access_denied()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_pet(owner: Uuid) -> Pet {
        Pet {
            id: Uuid::new_v4(),
            profile_id: owner,
            name: "Biscuit".to_string(),
            second_name: None,
            date_of_birth: NaiveDate::from_ymd_opt(2020, 5, 17).unwrap(),
            gender: "female".to_string(),
            pet_type: "dog".to_string(),
            breed: "Beagle".to_string(),
            temperament: Some("Friendly".to_string()),
            food: None,
            favourite_treats: None,
            allergies: None,
            bio: None,
            profile_url: None,
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_owner_passes_ownership_check() {
        let owner = Uuid::new_v4();
        let pet = sample_pet(owner);
        assert_eq!(ensure_owned(Some(pet.clone()), owner), Ok(pet));
    }

    #[test]
    fn test_foreign_pet_looks_missing() {
        let pet = sample_pet(Uuid::new_v4());
        let stranger = Uuid::new_v4();

        let foreign = ensure_owned(Some(pet), stranger).unwrap_err();
        let missing = ensure_owned(None, stranger).unwrap_err();

        assert_eq!(foreign, missing);
        assert_eq!(foreign.to_string(), "Pet not found or access denied");
    }

    #[test]
    fn test_create_request_reports_missing_fields() {
        let request = CreatePetRequest {
            name: Some("Biscuit".into()),
            gender: Some("  ".into()),
            ..Default::default()
        };

        let err = request.into_new_pet(Uuid::new_v4()).unwrap_err();
        assert_eq!(
            err,
            ServiceError::MissingFields(vec![
                "date_of_birth".into(),
                "gender".into(),
                "pet_type".into(),
                "breed".into()
            ])
        );
    }

    #[test]
    fn test_create_request_builds_row() {
        let owner = Uuid::new_v4();
        let request = CreatePetRequest {
            name: Some(" Biscuit ".into()),
            date_of_birth: Some("2020-05-17".into()),
            gender: Some("female".into()),
            pet_type: Some("dog".into()),
            breed: Some("Beagle".into()),
            allergies: Some("".into()),
            ..Default::default()
        };

        let new_pet = request.into_new_pet(owner).unwrap();
        assert_eq!(new_pet.profile_id, owner);
        assert_eq!(new_pet.name, "Biscuit");
        assert_eq!(new_pet.date_of_birth, NaiveDate::from_ymd_opt(2020, 5, 17).unwrap());
        assert_eq!(new_pet.allergies, None);
    }

    #[test]
    fn test_create_request_rejects_bad_date() {
        let request = CreatePetRequest {
            name: Some("Biscuit".into()),
            date_of_birth: Some("17/05/2020".into()),
            gender: Some("female".into()),
            pet_type: Some("dog".into()),
            breed: Some("Beagle".into()),
            ..Default::default()
        };

        assert!(matches!(
            request.into_new_pet(Uuid::new_v4()),
            Err(ServiceError::Validation { .. })
        ));
    }

    #[test]
    fn test_update_request_ignores_blank_values() {
        let request = UpdatePetRequest {
            name: Some("".into()),
            bio: Some("Loves the beach".into()),
            ..Default::default()
        };

        let changes = request.into_changes().unwrap();
        assert_eq!(changes.name, None);
        assert_eq!(changes.bio, Some(Some("Loves the beach".into())));
        assert!(changes.updated_at.is_some());
    }

    #[test]
    fn test_relations_serialize_flat() {
        let pet = sample_pet(Uuid::new_v4());
        let with_relations = PetWithRelations {
            pet: pet.clone(),
            pet_contacts: vec![],
            pet_maintenance: vec![],
            pet_veterinarian: vec![],
        };

        let value = serde_json::to_value(&with_relations).unwrap();
        assert_eq!(value["name"], "Biscuit");
        assert!(value["pet_contacts"].as_array().unwrap().is_empty());
    }
}
