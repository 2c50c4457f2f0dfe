// Form payloads posted by the onboarding and add-pet actions

use chrono::Utc;
use uuid::Uuid;

use crate::{
    models::{pet::NewPet, profile::NewProfile},
    utils::{
        service_error::ServiceError,
        validation::{parse_calendar_date, trim_optional_field},
    },
};

/// Field names reported when a pet in the form is incomplete
pub const PET_ERROR_FIELDS: [&str; 5] = ["petName", "dateOfBirth", "gender", "petType", "breed"];

/// Looks up a single urlencoded field; later duplicates are ignored
fn field(pairs: &[(String, String)], key: &str) -> String {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

fn has_field(pairs: &[(String, String)], key: &str) -> bool {
    pairs.iter().any(|(k, _)| k == key)
}

/// One pet as entered in a form, keys in camelCase (`petName`, `dateOfBirth`, ...)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PetForm {
    pub pet_name: String,
    pub pet_second_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub pet_type: String,
    pub temperament: String,
    pub food: String,
    pub favourite_treats: String,
    pub allergies: String,
    pub breed: String,
    pub bio: String,
    pub avatar_url: String,
}

impl PetForm {
    /// Reads the pet fields under `prefix` (`""` or `"pets[0]."`)
    pub fn from_pairs(pairs: &[(String, String)], prefix: &str) -> Self {
        let get = |name: &str| field(pairs, &format!("{}{}", prefix, name));
        Self {
            pet_name: get("petName"),
            pet_second_name: get("petSecondName"),
            date_of_birth: get("dateOfBirth"),
            gender: get("gender"),
            pet_type: get("petType"),
            temperament: get("temperament"),
            food: get("food"),
            favourite_treats: get("favouriteTreats"),
            allergies: get("allergies"),
            breed: get("breed"),
            bio: get("bio"),
            avatar_url: get("avatarUrl"),
        }
    }

    pub fn is_complete(&self) -> bool {
        [
            &self.pet_name,
            &self.date_of_birth,
            &self.gender,
            &self.pet_type,
            &self.breed,
        ]
        .iter()
        .all(|value| !value.trim().is_empty())
    }

    pub fn into_new_pet(self, owner_id: Uuid) -> Result<NewPet, ServiceError> {
        if !self.is_complete() {
            return Err(ServiceError::validation(
                "Please fill in all required pet fields",
                &PET_ERROR_FIELDS,
            ));
        }
        let date_of_birth = parse_calendar_date(&self.date_of_birth, "dateOfBirth")?;

        Ok(NewPet {
            profile_id: owner_id,
            name: self.pet_name.trim().to_string(),
            second_name: trim_optional_field(Some(&self.pet_second_name)),
            date_of_birth,
            gender: self.gender.trim().to_string(),
            pet_type: self.pet_type.trim().to_string(),
            breed: self.breed.trim().to_string(),
            temperament: trim_optional_field(Some(&self.temperament)),
            food: trim_optional_field(Some(&self.food)),
            favourite_treats: trim_optional_field(Some(&self.favourite_treats)),
            allergies: trim_optional_field(Some(&self.allergies)),
            bio: trim_optional_field(Some(&self.bio)),
            profile_url: None,
            avatar_url: trim_optional_field(Some(&self.avatar_url)),
        })
    }
}

/// Onboarding form: owner profile plus `pets[i].*` entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnboardingForm {
    pub first_name: String,
    pub last_name: String,
    pub home_phone: String,
    pub mobile_phone: String,
    pub email: String,
    pub country: String,
    pub address: String,
    pub pets: Vec<PetForm>,
}

impl OnboardingForm {
    /// Pets are read from consecutive indices starting at 0 and stop at the first gap
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut pets = Vec::new();
        while has_field(pairs, &format!("pets[{}].petName", pets.len())) {
            let prefix = format!("pets[{}].", pets.len());
            pets.push(PetForm::from_pairs(pairs, &prefix));
        }

        Self {
            first_name: field(pairs, "firstName"),
            last_name: field(pairs, "lastName"),
            home_phone: field(pairs, "homePhone"),
            mobile_phone: field(pairs, "mobilePhone"),
            email: field(pairs, "email"),
            country: field(pairs, "country"),
            address: field(pairs, "address"),
            pets,
        }
    }

    /// Pets are checked before the profile. For profile fields the last failing
    /// field provides the message and all of them are reported.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.pets.is_empty() {
            return Err(ServiceError::validation(
                "At least one pet is required",
                &["petName"],
            ));
        }
        if self.pets.iter().any(|pet| !pet.is_complete()) {
            return Err(ServiceError::validation(
                "Please fill in all required pet fields",
                &PET_ERROR_FIELDS,
            ));
        }

        let checks = [
            (&self.first_name, "First name is required", "firstName"),
            (&self.last_name, "Last name is required", "lastName"),
            (&self.mobile_phone, "Mobile phone is required", "mobilePhone"),
            (&self.email, "Email is required", "email"),
            (&self.country, "Country is required", "country"),
            (&self.address, "Address is required", "address"),
        ];
        let failing: Vec<_> = checks
            .iter()
            .filter(|(value, _, _)| value.trim().is_empty())
            .collect();

        match failing.last() {
            None => Ok(()),
            Some((_, message, _)) => Err(ServiceError::Validation {
                message: message.to_string(),
                fields: failing.iter().map(|(_, _, f)| f.to_string()).collect(),
            }),
        }
    }

    /// Profile values echoed back to the form on failure
    pub fn echo_values(&self) -> [(&'static str, &str); 7] {
        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("homePhone", &self.home_phone),
            ("mobilePhone", &self.mobile_phone),
            ("email", &self.email),
            ("country", &self.country),
            ("address", &self.address),
        ]
    }

    pub fn new_profile(&self, user_id: Uuid) -> NewProfile {
        NewProfile {
            id: user_id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            home_phone: trim_optional_field(Some(&self.home_phone)),
            mobile_phone: self.mobile_phone.trim().to_string(),
            email: self.email.trim().to_string(),
            country: self.country.trim().to_string(),
            address: self.address.trim().to_string(),
            updated_at: Some(Utc::now()),
        }
    }
}
