use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{schema::pet_subscriptions, utils::service_error::ServiceError};

/// Length of the period granted when a subscription is created without billing data
pub const DEFAULT_PERIOD_DAYS: i64 = 30;

// =============================================================================
// ENUMS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Free,
    Pro,
    Ultra,
}

impl PlanType {
    pub const ALL: [PlanType; 3] = [PlanType::Free, PlanType::Pro, PlanType::Ultra];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Free => "free",
            PlanType::Pro => "pro",
            PlanType::Ultra => "ultra",
        }
    }

    pub fn parse_input(input: &str) -> Result<Self, ServiceError> {
        input.trim().parse().map_err(|_| ServiceError::InvalidValue {
            message: "Invalid plan type".to_string(),
            valid_values: Self::ALL.iter().map(|p| p.as_str().to_string()).collect(),
        })
    }
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(PlanType::Free),
            "pro" => Ok(PlanType::Pro),
            "ultra" => Ok(PlanType::Ultra),
            _ => Err(format!("Invalid plan type: {}", s)),
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
    Trialing,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 4] = [
        SubscriptionStatus::Active,
        SubscriptionStatus::Canceled,
        SubscriptionStatus::PastDue,
        SubscriptionStatus::Trialing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Trialing => "trialing",
        }
    }

    pub fn parse_input(input: &str) -> Result<Self, ServiceError> {
        input.trim().parse().map_err(|_| ServiceError::InvalidValue {
            message: "Invalid subscription status".to_string(),
            valid_values: Self::ALL.iter().map(|s| s.as_str().to_string()).collect(),
        })
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            _ => Err(format!("Invalid subscription status: {}", s)),
        }
    }
}

// =============================================================================
// MODELS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable, ToSchema)]
#[diesel(table_name = pet_subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PetSubscription {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub plan_type: String,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pet_subscriptions)]
pub struct NewPetSubscription {
    pub pet_id: Uuid,
    pub plan_type: String,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
}

impl NewPetSubscription {
    /// Active subscription for `plan` with the default period starting now
    pub fn starting_now(pet_id: Uuid, plan: PlanType) -> Self {
        let now = Utc::now();
        NewPetSubscription {
            pet_id,
            plan_type: plan.as_str().to_string(),
            stripe_subscription_id: None,
            stripe_customer_id: None,
            status: SubscriptionStatus::Active.as_str().to_string(),
            current_period_start: now,
            current_period_end: now + Duration::days(DEFAULT_PERIOD_DAYS),
            cancel_at_period_end: false,
        }
    }

    /// Overlay the optional billing fields of a changeset
    pub fn with_changes(mut self, changes: &SubscriptionChanges) -> Self {
        if let Some(status) = &changes.status {
            self.status = status.clone();
        }
        if let Some(id) = &changes.stripe_subscription_id {
            self.stripe_subscription_id = id.clone();
        }
        if let Some(id) = &changes.stripe_customer_id {
            self.stripe_customer_id = id.clone();
        }
        if let Some(start) = changes.current_period_start {
            self.current_period_start = start;
        }
        if let Some(end) = changes.current_period_end {
            self.current_period_end = end;
        }
        if let Some(cancel) = changes.cancel_at_period_end {
            self.cancel_at_period_end = cancel;
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = pet_subscriptions)]
pub struct SubscriptionChanges {
    pub plan_type: Option<String>,
    pub stripe_subscription_id: Option<Option<String>>,
    pub stripe_customer_id: Option<Option<String>>,
    pub status: Option<String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Pet summary paired with its latest subscription
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PetSubscriptionSummary {
    pub id: Uuid,
    pub name: String,
    pub subscription: Option<PetSubscription>,
}

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    #[serde(alias = "pet_id")]
    pub pet_id: Option<Uuid>,
    #[serde(alias = "plan_type")]
    pub plan_type: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "stripe_subscription_id")]
    pub stripe_subscription_id: Option<String>,
    #[serde(alias = "stripe_customer_id")]
    pub stripe_customer_id: Option<String>,
    #[serde(alias = "current_period_start")]
    pub current_period_start: Option<DateTime<Utc>>,
    #[serde(alias = "current_period_end")]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(alias = "cancel_at_period_end")]
    pub cancel_at_period_end: Option<bool>,
}

impl SubscriptionRequest {
    /// Validated changeset; the plan is only included when present
    pub fn changes(&self) -> Result<SubscriptionChanges, ServiceError> {
        let plan_type = match &self.plan_type {
            Some(raw) => Some(PlanType::parse_input(raw)?.as_str().to_string()),
            None => None,
        };
        let status = match &self.status {
            Some(raw) => Some(SubscriptionStatus::parse_input(raw)?.as_str().to_string()),
            None => None,
        };

        Ok(SubscriptionChanges {
            plan_type,
            stripe_subscription_id: self.stripe_subscription_id.clone().map(Some),
            stripe_customer_id: self.stripe_customer_id.clone().map(Some),
            status,
            current_period_start: self.current_period_start,
            current_period_end: self.current_period_end,
            cancel_at_period_end: self.cancel_at_period_end,
            updated_at: Some(Utc::now()),
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    #[serde(alias = "subscription_id")]
    pub subscription_id: Option<Uuid>,
    #[serde(flatten)]
    pub fields: SubscriptionRequest,
}

// =============================================================================
// QUERIES
// =============================================================================

impl PetSubscription {
    /// Most recently created subscription of a pet
    pub async fn latest_for_pet(conn: &mut AsyncPgConnection, pet_id: Uuid) -> QueryResult<Option<PetSubscription>> {
        pet_subscriptions::table
            .filter(pet_subscriptions::pet_id.eq(pet_id))
            .order(pet_subscriptions::created_at.desc())
            .select(PetSubscription::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn list_for_pets(
        conn: &mut AsyncPgConnection,
        pet_ids: &[Uuid],
    ) -> QueryResult<Vec<PetSubscription>> {
        pet_subscriptions::table
            .filter(pet_subscriptions::pet_id.eq_any(pet_ids))
            .order(pet_subscriptions::created_at.desc())
            .select(PetSubscription::as_select())
            .load(conn)
            .await
    }

    pub async fn find_by_id(conn: &mut AsyncPgConnection, id: Uuid) -> QueryResult<Option<PetSubscription>> {
        pet_subscriptions::table
            .filter(pet_subscriptions::id.eq(id))
            .select(PetSubscription::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        subscription: &NewPetSubscription,
    ) -> QueryResult<PetSubscription> {
        diesel::insert_into(pet_subscriptions::table)
            .values(subscription)
            .returning(PetSubscription::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        id: Uuid,
        changes: &SubscriptionChanges,
    ) -> QueryResult<PetSubscription> {
        diesel::update(pet_subscriptions::table.filter(pet_subscriptions::id.eq(id)))
            .set(changes)
            .returning(PetSubscription::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn delete(conn: &mut AsyncPgConnection, id: Uuid) -> QueryResult<usize> {
        diesel::delete(pet_subscriptions::table.filter(pet_subscriptions::id.eq(id)))
            .execute(conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_parsing() {
        assert_eq!("ULTRA".parse::<PlanType>(), Ok(PlanType::Ultra));
        let err = PlanType::parse_input("gold").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidValue { ref valid_values, .. } if valid_values.len() == 3
        ));
    }

    #[test]
    fn test_status_labels() {
        for status in SubscriptionStatus::ALL {
            assert_eq!(status.as_str().parse::<SubscriptionStatus>(), Ok(status));
        }
        assert_eq!(
            serde_json::to_value(SubscriptionStatus::PastDue).unwrap(),
            "past_due"
        );
    }

    #[test]
    fn test_default_subscription_period() {
        let sub = NewPetSubscription::starting_now(Uuid::new_v4(), PlanType::Free);
        assert_eq!(sub.status, "active");
        assert_eq!(sub.plan_type, "free");
        assert_eq!(
            sub.current_period_end - sub.current_period_start,
            Duration::days(DEFAULT_PERIOD_DAYS)
        );
        assert!(!sub.cancel_at_period_end);
    }

    #[test]
    fn test_request_changes_validate_values() {
        let request = SubscriptionRequest {
            plan_type: Some("pro".into()),
            status: Some("paused".into()),
            ..Default::default()
        };
        assert!(matches!(
            request.changes(),
            Err(ServiceError::InvalidValue { .. })
        ));

        let request = SubscriptionRequest {
            cancel_at_period_end: Some(true),
            ..Default::default()
        };
        let changes = request.changes().unwrap();
        assert_eq!(changes.plan_type, None);
        assert_eq!(changes.cancel_at_period_end, Some(true));
    }

    #[test]
    fn test_new_subscription_takes_billing_overrides() {
        let changes = SubscriptionChanges {
            status: Some("trialing".into()),
            stripe_customer_id: Some(Some("cus_123".into())),
            ..Default::default()
        };
        let sub = NewPetSubscription::starting_now(Uuid::new_v4(), PlanType::Pro).with_changes(&changes);
        assert_eq!(sub.status, "trialing");
        assert_eq!(sub.stripe_customer_id.as_deref(), Some("cus_123"));
    }
}
