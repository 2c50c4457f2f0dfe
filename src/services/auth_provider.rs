// Client for the hosted auth service (GoTrue REST API)

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::app_config::AuthConfig;
use crate::utils::service_error::ServiceError;

#[derive(Debug, Error)]
pub enum AuthProviderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Auth service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<AuthProviderError> for ServiceError {
    fn from(error: AuthProviderError) -> Self {
        ServiceError::AuthProvider(error.to_string())
    }
}

/// Account operations delegated to the auth service
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// `Ok(false)` when the credentials are wrong
    async fn verify_password(&self, email: &str, password: &str) -> Result<bool, AuthProviderError>;

    /// Starts the email change flow for the session's user
    async fn update_email(&self, access_token: &str, new_email: &str) -> Result<(), AuthProviderError>;

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), AuthProviderError>;

    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthProviderError>;
}

pub struct GoTrueClient {
    http_client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl GoTrueClient {
    pub fn new(config: &AuthConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("petsqr-backend/1.0")
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            base_url: format!("{}/auth/v1", config.supabase_url),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into `Rejected` with the most specific message the body offers
    async fn rejection(response: Response) -> AuthProviderError {
        let status = response.status().as_u16();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = ["error_description", "msg", "message", "error"]
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .unwrap_or("Unknown error")
            .to_string();

        AuthProviderError::Rejected { status, message }
    }
}

#[async_trait]
impl AuthProvider for GoTrueClient {
    #[instrument(skip(self, password))]
    async fn verify_password(&self, email: &str, password: &str) -> Result<bool, AuthProviderError> {
        let response = self
            .http_client
            .post(self.url("/token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                debug!("Password check failed for {}", email);
                Ok(false)
            },
            _ => Err(Self::rejection(response).await),
        }
    }

    #[instrument(skip(self, access_token))]
    async fn update_email(&self, access_token: &str, new_email: &str) -> Result<(), AuthProviderError> {
        let response = self
            .http_client
            .put(self.url("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .json(&json!({ "email": new_email }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejection(response).await)
        }
    }

    #[instrument(skip(self, access_token, new_password))]
    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), AuthProviderError> {
        let response = self
            .http_client
            .put(self.url("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .json(&json!({ "password": new_password }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejection(response).await)
        }
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthProviderError> {
        let response = self
            .http_client
            .delete(self.url(&format!("/admin/users/{}", user_id)))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&json!({ "should_soft_delete": true }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let error = Self::rejection(response).await;
            warn!("Failed to delete auth user {}: {}", user_id, error);
            Err(error)
        }
    }
}
