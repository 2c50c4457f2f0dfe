// Session identity extracted from a verified bearer token

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{models::auth::SessionClaims, services::user::SessionIdentity};

/// Authenticated user information extracted from the session JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub session_id: Option<String>,
    /// Set when the session came from a password-recovery link
    pub recovery_at: Option<i64>,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub exp: u64,
}

impl AuthenticatedUser {
    /// `None` when the subject is not a user id
    pub fn from_claims(claims: SessionClaims, access_token: &str) -> Option<Self> {
        let user_id = Uuid::parse_str(&claims.sub).ok()?;
        Some(Self {
            user_id,
            recovery_at: claims.recovery_at(),
            email: claims.email,
            session_id: claims.session_id,
            access_token: access_token.to_string(),
            exp: claims.exp,
        })
    }

    pub fn session_identity(&self) -> SessionIdentity {
        SessionIdentity {
            user_id: self.user_id,
            email: self.email.clone(),
            access_token: self.access_token.clone(),
            recovery_at: self.recovery_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::AmrEntry;

    fn claims(sub: &str) -> SessionClaims {
        SessionClaims {
            sub: sub.to_string(),
            email: "owner@example.com".into(),
            exp: 1_900_000_000,
            iat: 1_800_000_000,
            aud: "authenticated".into(),
            role: "authenticated".into(),
            session_id: Some("session-1".into()),
            amr: vec![AmrEntry { method: "recovery".into(), timestamp: 1_800_000_100 }],
        }
    }

    #[test]
    fn test_from_claims() {
        let user_id = Uuid::new_v4();
        let user = AuthenticatedUser::from_claims(claims(&user_id.to_string()), "token").unwrap();

        assert_eq!(user.user_id, user_id);
        assert_eq!(user.recovery_at, Some(1_800_000_100));

        let identity = user.session_identity();
        assert_eq!(identity.access_token, "token");
        assert_eq!(identity.email, "owner@example.com");
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        assert!(AuthenticatedUser::from_claims(claims("service-account"), "token").is_none());
    }
}
