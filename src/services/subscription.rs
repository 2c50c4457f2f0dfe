// Pet subscription plans and per-pet subscription records

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{
        pet::{ensure_owned, Pet},
        subscription::{
            NewPetSubscription, PetSubscription, PetSubscriptionSummary, PlanType,
            SubscriptionChanges, SubscriptionStatus, DEFAULT_PERIOD_DAYS,
        },
    },
    utils::service_error::ServiceError,
};

const SUBSCRIPTION_ACCESS_DENIED: &str = "Subscription not found or access denied";

// =============================================================================
// PLAN DEFINITIONS
// =============================================================================

/// Plan as shown on the pricing page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct SubscriptionPlan {
    /// Plan identifier (free, pro, ultra)
    pub id: String,

    /// Display name for the plan
    pub name: String,

    /// Monthly price in USD
    pub price: f64,

    /// Feature bullet points
    pub features: Vec<String>,
}

impl SubscriptionPlan {
    pub fn free() -> Self {
        Self {
            id: PlanType::Free.as_str().to_string(),
            name: "Free".to_string(),
            price: 0.0,
            features: vec![
                "Basic pet profile".to_string(),
                "Single contact".to_string(),
                "Public pet page".to_string(),
            ],
        }
    }

    pub fn pro() -> Self {
        Self {
            id: PlanType::Pro.as_str().to_string(),
            name: "Pro".to_string(),
            price: 4.99,
            features: vec![
                "Advanced pet profile".to_string(),
                "Multiple contacts".to_string(),
                "Maintenance reminders".to_string(),
                "Veterinarian details".to_string(),
                "QR code integration".to_string(),
            ],
        }
    }

    pub fn ultra() -> Self {
        Self {
            id: PlanType::Ultra.as_str().to_string(),
            name: "Ultra".to_string(),
            price: 9.99,
            features: vec![
                "All Pro features".to_string(),
                "Premium pet page design".to_string(),
                "Lost pet alerts".to_string(),
                "Medical record storage".to_string(),
                "Multiple pet discount".to_string(),
                "Priority support".to_string(),
            ],
        }
    }

    pub fn for_plan(plan: PlanType) -> Self {
        match plan {
            PlanType::Free => Self::free(),
            PlanType::Pro => Self::pro(),
            PlanType::Ultra => Self::ultra(),
        }
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// Plan catalogue, cheapest first
pub fn plans() -> Vec<SubscriptionPlan> {
    PlanType::ALL.iter().copied().map(SubscriptionPlan::for_plan).collect()
}

/// Changes that (re)start a plan: active status, fresh period, no pending cancellation
pub fn plan_activation(plan: PlanType) -> SubscriptionChanges {
    let now = Utc::now();
    SubscriptionChanges {
        plan_type: Some(plan.as_str().to_string()),
        status: Some(SubscriptionStatus::Active.as_str().to_string()),
        current_period_start: Some(now),
        current_period_end: Some(now + Duration::days(DEFAULT_PERIOD_DAYS)),
        cancel_at_period_end: Some(false),
        updated_at: Some(now),
        ..Default::default()
    }
}

// =============================================================================
// SUBSCRIPTION SERVICE
// =============================================================================

pub struct SubscriptionService {
    diesel_pool: DieselPool,
}

impl SubscriptionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
        }
    }

    /// Latest subscription of an owned pet, `None` when it never had one
    #[instrument(skip(self))]
    pub async fn get_pet_subscription(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
    ) -> Result<Option<PetSubscription>, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;
        Ok(PetSubscription::latest_for_pet(&mut conn, pet_id).await?)
    }

    /// Every pet of the user with its latest subscription
    #[instrument(skip(self))]
    pub async fn user_pet_subscriptions(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<PetSubscriptionSummary>, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let pets = Pet::list_for_owner(&mut conn, owner_id).await?;
        if pets.is_empty() {
            return Ok(Vec::new());
        }

        let pet_ids: Vec<Uuid> = pets.iter().map(|p| p.id).collect();
        // Rows arrive newest first, so the first one seen per pet wins
        let mut latest: HashMap<Uuid, PetSubscription> = HashMap::new();
        for subscription in PetSubscription::list_for_pets(&mut conn, &pet_ids).await? {
            latest.entry(subscription.pet_id).or_insert(subscription);
        }

        Ok(pets
            .into_iter()
            .map(|pet| PetSubscriptionSummary {
                subscription: latest.remove(&pet.id),
                id: pet.id,
                name: pet.name,
            })
            .collect())
    }

    /// Update the pet's latest subscription, or start a new one (free and active by default)
    #[instrument(skip(self, changes))]
    pub async fn upsert_pet_subscription(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        changes: SubscriptionChanges,
    ) -> Result<PetSubscription, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        match PetSubscription::latest_for_pet(&mut conn, pet_id).await? {
            Some(existing) => Ok(PetSubscription::update(&mut conn, existing.id, &changes).await?),
            None => {
                let plan = match &changes.plan_type {
                    Some(raw) => PlanType::parse_input(raw)?,
                    None => PlanType::Free,
                };
                let new_subscription =
                    NewPetSubscription::starting_now(pet_id, plan).with_changes(&changes);
                let created = PetSubscription::create(&mut conn, &new_subscription).await?;
                info!("Started {} subscription {} for pet {}", plan, created.id, pet_id);
                Ok(created)
            },
        }
    }

    /// Switch an owned pet to `plan`, restarting the billing period
    pub async fn subscribe(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        plan: PlanType,
    ) -> Result<PetSubscription, ServiceError> {
        self.upsert_pet_subscription(owner_id, pet_id, plan_activation(plan))
            .await
    }

    /// Update a subscription by id; ownership is checked through its pet
    #[instrument(skip(self, changes))]
    pub async fn update_subscription(
        &self,
        owner_id: Uuid,
        subscription_id: Uuid,
        changes: SubscriptionChanges,
    ) -> Result<PetSubscription, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        self.owned_subscription(&mut conn, owner_id, subscription_id)
            .await?;
        Ok(PetSubscription::update(&mut conn, subscription_id, &changes).await?)
    }

    /// Cancel the pet's latest subscription at the end of its period
    #[instrument(skip(self))]
    pub async fn cancel(&self, owner_id: Uuid, pet_id: Uuid) -> Result<PetSubscription, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        ensure_owned(Pet::find_by_id(&mut conn, pet_id).await?, owner_id)?;

        let latest = PetSubscription::latest_for_pet(&mut conn, pet_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Subscription"))?;
        self.cancel_at_period_end(&mut conn, latest.id).await
    }

    /// Cancel by subscription id, as the DELETE endpoint addresses it
    #[instrument(skip(self))]
    pub async fn cancel_by_id(
        &self,
        owner_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<PetSubscription, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        self.owned_subscription(&mut conn, owner_id, subscription_id)
            .await?;
        self.cancel_at_period_end(&mut conn, subscription_id).await
    }

    async fn cancel_at_period_end(
        &self,
        conn: &mut diesel_async::AsyncPgConnection,
        subscription_id: Uuid,
    ) -> Result<PetSubscription, ServiceError> {
        let changes = SubscriptionChanges {
            cancel_at_period_end: Some(true),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        let canceled = PetSubscription::update(conn, subscription_id, &changes).await?;
        info!("Subscription {} cancels at period end", subscription_id);
        Ok(canceled)
    }

    async fn owned_subscription(
        &self,
        conn: &mut diesel_async::AsyncPgConnection,
        owner_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<PetSubscription, ServiceError> {
        let subscription = PetSubscription::find_by_id(conn, subscription_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Subscription"))?;

        match Pet::find_by_id(conn, subscription.pet_id).await? {
            Some(pet) if pet.profile_id == owner_id => Ok(subscription),
            _ => Err(ServiceError::NotFound(SUBSCRIPTION_ACCESS_DENIED.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_catalogue() {
        let plans = plans();
        let ids: Vec<&str> = plans.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["free", "pro", "ultra"]);

        assert_eq!(plans[0].price, 0.0);
        assert_eq!(plans[1].price, 4.99);
        assert_eq!(plans[2].price, 9.99);
        assert_eq!(plans[2].features.len(), 6);
    }

    #[test]
    fn test_plan_features() {
        assert!(SubscriptionPlan::free().has_feature("Single contact"));
        assert!(!SubscriptionPlan::free().has_feature("Maintenance reminders"));
        assert!(SubscriptionPlan::pro().has_feature("QR code integration"));
        assert!(SubscriptionPlan::ultra().has_feature("Priority support"));
    }

    #[test]
    fn test_plan_activation_resets_period() {
        let changes = plan_activation(PlanType::Pro);

        assert_eq!(changes.plan_type.as_deref(), Some("pro"));
        assert_eq!(changes.status.as_deref(), Some("active"));
        assert_eq!(changes.cancel_at_period_end, Some(false));

        let start = changes.current_period_start.unwrap();
        let end = changes.current_period_end.unwrap();
        assert_eq!((end - start).num_days(), DEFAULT_PERIOD_DAYS);
    }

    #[test]
    fn test_plans_serialize_for_pricing_page() {
        let json = serde_json::to_value(SubscriptionPlan::pro()).unwrap();
        assert_eq!(json["id"], "pro");
        assert_eq!(json["name"], "Pro");
        assert_eq!(json["price"], 4.99);
    }
}
