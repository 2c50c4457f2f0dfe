use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{schema::profiles, utils::validation::trim_optional_field};

/// Profile database model, keyed by the auth user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable, ToSchema)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Profile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub home_phone: Option<String>,
    pub mobile_phone: String,
    pub email: String,
    pub country: String,
    pub address: String,
    pub avatar_url: Option<String>,
    pub unsubscribed: bool,
    pub has_completed_onboarding: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub const REQUIRED_FIELDS: [&'static str; 6] = [
        "first_name",
        "last_name",
        "mobile_phone",
        "email",
        "country",
        "address",
    ];

    /// Required profile fields that are still blank
    pub fn missing_fields(&self) -> Vec<String> {
        let values = [
            &self.first_name,
            &self.last_name,
            &self.mobile_phone,
            &self.email,
            &self.country,
            &self.address,
        ];
        Self::REQUIRED_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

/// Full profile row written during onboarding (insert or overwrite)
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub home_phone: Option<String>,
    pub mobile_phone: String,
    pub email: String,
    pub country: String,
    pub address: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = profiles)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub home_phone: Option<Option<String>>,
    pub mobile_phone: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub avatar_url: Option<Option<String>>,
    pub unsubscribed: Option<bool>,
    pub has_completed_onboarding: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 255, message = "First name must be less than 255 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 255, message = "Last name must be less than 255 characters"))]
    pub last_name: Option<String>,
    pub home_phone: Option<String>,
    pub mobile_phone: Option<String>,
    #[validate(length(max = 255, message = "Email must be less than 255 characters"))]
    pub email: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
    pub unsubscribed: Option<bool>,
}

impl UpdateProfileRequest {
    pub fn changes(&self) -> ProfileChanges {
        ProfileChanges {
            first_name: trim_optional_field(self.first_name.as_ref()),
            last_name: trim_optional_field(self.last_name.as_ref()),
            // An explicit blank clears the optional home phone
            home_phone: self.home_phone.as_ref().map(|p| trim_optional_field(Some(p))),
            mobile_phone: trim_optional_field(self.mobile_phone.as_ref()),
            email: trim_optional_field(self.email.as_ref()),
            country: trim_optional_field(self.country.as_ref()),
            address: trim_optional_field(self.address.as_ref()),
            avatar_url: trim_optional_field(self.avatar_url.as_ref()).map(Some),
            unsubscribed: self.unsubscribed,
            has_completed_onboarding: None,
            updated_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    pub is_complete: bool,
    pub missing_fields: Vec<String>,
}

impl AccountStatus {
    pub fn for_profile(profile: Option<&Profile>) -> Self {
        match profile {
            None => AccountStatus {
                is_complete: false,
                missing_fields: vec!["profile".to_string()],
            },
            Some(profile) => {
                let missing_fields = profile.missing_fields();
                AccountStatus {
                    is_complete: profile.has_completed_onboarding || missing_fields.is_empty(),
                    missing_fields,
                }
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalytics {
    pub pet_count: i64,
    pub linked_qr_codes_count: i64,
}

impl Profile {
    pub async fn find_by_id(conn: &mut AsyncPgConnection, user_id: Uuid) -> QueryResult<Option<Profile>> {
        profiles::table
            .filter(profiles::id.eq(user_id))
            .select(Profile::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        changes: &ProfileChanges,
    ) -> QueryResult<Profile> {
        diesel::update(profiles::table.filter(profiles::id.eq(user_id)))
            .set(changes)
            .returning(Profile::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn upsert(conn: &mut AsyncPgConnection, profile: &NewProfile) -> QueryResult<Profile> {
        diesel::insert_into(profiles::table)
            .values(profile)
            .on_conflict(profiles::id)
            .do_update()
            .set(profile)
            .returning(Profile::as_returning())
            .get_result(conn)
            .await
    }

    /// Deletes the profile row; owned pets cascade
    pub async fn delete(conn: &mut AsyncPgConnection, user_id: Uuid) -> QueryResult<usize> {
        diesel::delete(profiles::table.filter(profiles::id.eq(user_id)))
            .execute(conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            home_phone: None,
            mobile_phone: "555-0100".into(),
            email: "ada@example.com".into(),
            country: "UK".into(),
            address: "12 St James's Square".into(),
            avatar_url: None,
            unsubscribed: false,
            has_completed_onboarding: false,
            updated_at: None,
        }
    }

    #[test]
    fn test_status_without_profile() {
        let status = AccountStatus::for_profile(None);
        assert!(!status.is_complete);
        assert_eq!(status.missing_fields, vec!["profile"]);
    }

    #[test]
    fn test_status_lists_blank_fields() {
        let mut profile = sample_profile();
        profile.mobile_phone = " ".into();
        profile.address = String::new();

        let status = AccountStatus::for_profile(Some(&profile));
        assert!(!status.is_complete);
        assert_eq!(status.missing_fields, vec!["mobile_phone", "address"]);
    }

    #[test]
    fn test_onboarded_profile_is_complete() {
        let mut profile = sample_profile();
        profile.has_completed_onboarding = true;
        profile.country = String::new();

        let status = AccountStatus::for_profile(Some(&profile));
        assert!(status.is_complete);
        assert_eq!(status.missing_fields, vec!["country"]);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let value = serde_json::to_value(AccountStatus::for_profile(None)).unwrap();
        assert_eq!(value["isComplete"], false);
        assert_eq!(value["missingFields"], serde_json::json!(["profile"]));
    }

    #[test]
    fn test_update_request_changes() {
        let request = UpdateProfileRequest {
            first_name: Some(" Grace ".into()),
            home_phone: Some("".into()),
            ..Default::default()
        };
        let changes = request.changes();
        assert_eq!(changes.first_name.as_deref(), Some("Grace"));
        assert_eq!(changes.home_phone, Some(None));
        assert_eq!(changes.last_name, None);
    }
}
