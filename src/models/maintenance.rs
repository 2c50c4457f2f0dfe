use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    schema::pet_maintenance,
    utils::{
        due_date::next_due_date,
        service_error::ServiceError,
        validation::{parse_start_date, require_fields, trim_optional_field},
    },
};

// =============================================================================
// FREQUENCY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceFrequency {
    Monthly,
    Bimonthly,
    Quarterly,
    Biannually,
    Annually,
}

impl MaintenanceFrequency {
    pub const ALL: [MaintenanceFrequency; 5] = [
        MaintenanceFrequency::Monthly,
        MaintenanceFrequency::Bimonthly,
        MaintenanceFrequency::Quarterly,
        MaintenanceFrequency::Biannually,
        MaintenanceFrequency::Annually,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceFrequency::Monthly => "monthly",
            MaintenanceFrequency::Bimonthly => "bimonthly",
            MaintenanceFrequency::Quarterly => "quarterly",
            MaintenanceFrequency::Biannually => "biannually",
            MaintenanceFrequency::Annually => "annually",
        }
    }

    /// Calendar months between two occurrences
    pub fn months(&self) -> u32 {
        match self {
            MaintenanceFrequency::Monthly => 1,
            MaintenanceFrequency::Bimonthly => 2,
            MaintenanceFrequency::Quarterly => 3,
            MaintenanceFrequency::Biannually => 6,
            MaintenanceFrequency::Annually => 12,
        }
    }

    pub fn valid_values() -> Vec<String> {
        Self::ALL.iter().map(|f| f.as_str().to_string()).collect()
    }

    /// Parse API input, reporting the accepted labels on failure
    pub fn parse_input(input: &str) -> Result<Self, ServiceError> {
        input.trim().parse().map_err(|_| ServiceError::InvalidValue {
            message: "Invalid frequency value".to_string(),
            valid_values: Self::valid_values(),
        })
    }
}

impl FromStr for MaintenanceFrequency {
    type Err = String;

    /// Labels are matched exactly; stored rows always carry the lowercase form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(MaintenanceFrequency::Monthly),
            "bimonthly" => Ok(MaintenanceFrequency::Bimonthly),
            "quarterly" => Ok(MaintenanceFrequency::Quarterly),
            "biannually" => Ok(MaintenanceFrequency::Biannually),
            "annually" => Ok(MaintenanceFrequency::Annually),
            _ => Err(format!("Invalid maintenance frequency: {}", s)),
        }
    }
}

impl fmt::Display for MaintenanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// MODELS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable, ToSchema)]
#[diesel(table_name = pet_maintenance)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PetMaintenance {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub name: String,
    pub frequency: String,
    pub start_date: DateTime<Utc>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PetMaintenance {
    pub fn next_due(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        next_due_date(self.start_date, &self.frequency, now)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pet_maintenance)]
pub struct NewPetMaintenance {
    pub pet_id: Uuid,
    pub name: String,
    pub frequency: String,
    pub start_date: DateTime<Utc>,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = pet_maintenance)]
pub struct MaintenanceChanges {
    pub name: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Maintenance item annotated with its next due date
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UpcomingMaintenance {
    #[serde(flatten)]
    pub item: PetMaintenance,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_name: Option<String>,
}

/// Annotate and sort by due date, soonest first
pub fn upcoming(
    items: Vec<(PetMaintenance, Option<String>)>,
    now: DateTime<Utc>,
) -> Vec<UpcomingMaintenance> {
    let mut upcoming: Vec<UpcomingMaintenance> = items
        .into_iter()
        .map(|(item, pet_name)| UpcomingMaintenance {
            due_date: item.next_due(now),
            item,
            pet_name,
        })
        .collect();
    // Out-of-range dates sort last
    upcoming.sort_by_key(|m| (m.due_date.is_none(), m.due_date));
    upcoming
}

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateMaintenanceRequest {
    #[validate(length(max = 255, message = "Name must be less than 255 characters"))]
    pub name: Option<String>,
    pub frequency: Option<String>,
    #[schema(example = "2024-01-01")]
    pub start_date: Option<String>,
    pub is_public: Option<bool>,
}

impl CreateMaintenanceRequest {
    pub fn into_new_maintenance(self, pet_id: Uuid) -> Result<NewPetMaintenance, ServiceError> {
        require_fields(&[
            ("name", self.name.as_deref()),
            ("frequency", self.frequency.as_deref()),
            ("start_date", self.start_date.as_deref()),
        ])?;
        self.validate()?;

        let frequency = MaintenanceFrequency::parse_input(self.frequency.as_deref().unwrap_or_default())?;
        let start_date = parse_start_date(self.start_date.as_deref().unwrap_or_default())?;

        Ok(NewPetMaintenance {
            pet_id,
            name: self.name.unwrap_or_default().trim().to_string(),
            frequency: frequency.as_str().to_string(),
            start_date,
            is_public: self.is_public.unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaintenanceRequest {
    pub maintenance_id: Option<Uuid>,
    #[validate(length(max = 255, message = "Name must be less than 255 characters"))]
    pub name: Option<String>,
    pub frequency: Option<String>,
    #[serde(alias = "start_date")]
    pub start_date: Option<String>,
    #[serde(alias = "is_public")]
    pub is_public: Option<bool>,
}

impl UpdateMaintenanceRequest {
    pub fn changes(&self) -> Result<MaintenanceChanges, ServiceError> {
        self.validate()?;

        let frequency = match trim_optional_field(self.frequency.as_ref()) {
            Some(raw) => Some(MaintenanceFrequency::parse_input(&raw)?.as_str().to_string()),
            None => None,
        };
        let start_date = match trim_optional_field(self.start_date.as_ref()) {
            Some(raw) => Some(parse_start_date(&raw)?),
            None => None,
        };

        Ok(MaintenanceChanges {
            name: trim_optional_field(self.name.as_ref()),
            frequency,
            start_date,
            is_public: self.is_public,
            updated_at: Some(Utc::now()),
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMaintenanceRequest {
    pub maintenance_id: Option<Uuid>,
}

// =============================================================================
// QUERIES
// =============================================================================

impl PetMaintenance {
    /// Items of one pet, most recent start first
    pub async fn list_for_pet(conn: &mut AsyncPgConnection, pet_id: Uuid) -> QueryResult<Vec<PetMaintenance>> {
        pet_maintenance::table
            .filter(pet_maintenance::pet_id.eq(pet_id))
            .order(pet_maintenance::start_date.desc())
            .select(PetMaintenance::as_select())
            .load(conn)
            .await
    }

    pub async fn list_for_pets(
        conn: &mut AsyncPgConnection,
        pet_ids: &[Uuid],
    ) -> QueryResult<Vec<PetMaintenance>> {
        pet_maintenance::table
            .filter(pet_maintenance::pet_id.eq_any(pet_ids))
            .order(pet_maintenance::start_date.desc())
            .select(PetMaintenance::as_select())
            .load(conn)
            .await
    }

    pub async fn find_by_id(conn: &mut AsyncPgConnection, id: Uuid) -> QueryResult<Option<PetMaintenance>> {
        pet_maintenance::table
            .filter(pet_maintenance::id.eq(id))
            .select(PetMaintenance::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        item: &NewPetMaintenance,
    ) -> QueryResult<PetMaintenance> {
        diesel::insert_into(pet_maintenance::table)
            .values(item)
            .returning(PetMaintenance::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        id: Uuid,
        changes: &MaintenanceChanges,
    ) -> QueryResult<PetMaintenance> {
        diesel::update(pet_maintenance::table.filter(pet_maintenance::id.eq(id)))
            .set(changes)
            .returning(PetMaintenance::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn set_visibility_for_pet(
        conn: &mut AsyncPgConnection,
        pet_id: Uuid,
        is_public: bool,
    ) -> QueryResult<usize> {
        diesel::update(pet_maintenance::table.filter(pet_maintenance::pet_id.eq(pet_id)))
            .set((
                pet_maintenance::is_public.eq(is_public),
                pet_maintenance::updated_at.eq(Some(Utc::now())),
            ))
            .execute(conn)
            .await
    }

    pub async fn delete(conn: &mut AsyncPgConnection, id: Uuid) -> QueryResult<usize> {
        diesel::delete(pet_maintenance::table.filter(pet_maintenance::id.eq(id)))
            .execute(conn)
            .await
    }
}
