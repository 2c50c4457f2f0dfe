// Pre-launch waitlist sign-ups

use tracing::{info, instrument};

use crate::{
    app::AppState,
    db::DieselPool,
    models::waitlist::WaitlistEntry,
    utils::{service_error::ServiceError, validation::trim_optional_field},
};

pub const ALREADY_ON_WAITLIST: &str = "This email is already on the waitlist";

pub struct WaitlistService {
    diesel_pool: DieselPool,
}

impl WaitlistService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
        }
    }

    /// Adds an address; the unique index on email reports duplicates
    #[instrument(skip(self))]
    pub async fn join(&self, email: Option<String>) -> Result<WaitlistEntry, ServiceError> {
        let email = Self::normalize(email)?;

        let mut conn = self.diesel_pool.get().await?;
        match WaitlistEntry::insert(&mut conn, &email).await.map_err(ServiceError::from) {
            Ok(entry) => {
                info!("Added {} to the waitlist", entry.email);
                Ok(entry)
            },
            Err(ServiceError::Conflict(_)) => {
                Err(ServiceError::validation(ALREADY_ON_WAITLIST, &["email"]))
            },
            Err(e) => Err(e),
        }
    }

    fn normalize(email: Option<String>) -> Result<String, ServiceError> {
        trim_optional_field(email.as_ref())
            .ok_or_else(|| ServiceError::validation("Email is required", &["email"]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_required() {
        let err = WaitlistService::normalize(Some("   ".into())).unwrap_err();
        assert_eq!(err, ServiceError::validation("Email is required", &["email"]));
        assert!(WaitlistService::normalize(None).is_err());
    }

    #[test]
    fn test_email_is_trimmed() {
        assert_eq!(
            WaitlistService::normalize(Some(" fan@example.com ".into())).unwrap(),
            "fan@example.com"
        );
    }
}
