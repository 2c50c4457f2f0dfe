// Object storage for avatars (hosted storage REST API)

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

use crate::app_config::StorageConfig;
use crate::utils::service_error::ServiceError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Storage rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<StorageError> for ServiceError {
    fn from(error: StorageError) -> Self {
        ServiceError::Storage(error.to_string())
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `bucket/path`, replacing any existing object, and return its public URL
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Object path of a public URL produced by this storage, if it belongs to `bucket`
    fn object_path(&self, bucket: &str, public_url: &str) -> Option<String> {
        let prefix = self.public_url(bucket, "");
        public_url
            .strip_prefix(&prefix)
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }
}

pub struct SupabaseStorage {
    http_client: Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseStorage {
    pub fn new(config: &StorageConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("petsqr-backend/1.0")
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            base_url: format!("{}/storage/v1/object", config.base_url),
            service_role_key: config.service_role_key.clone(),
        }
    }

    async fn check(response: reqwest::Response) -> Result<(), StorageError> {
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(StorageError::Rejected { status, message })
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .http_client
            .post(format!("{}/{}/{}", self.base_url, bucket, path))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;
        Self::check(response).await?;

        info!("Uploaded {}/{}", bucket, path);
        Ok(self.public_url(bucket, path))
    }

    #[instrument(skip(self))]
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError> {
        if paths.is_empty() {
            return Ok(());
        }

        let response = self
            .http_client
            .delete(format!("{}/{}", self.base_url, bucket))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        Self::check(response).await
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/public/{}/{}", self.base_url, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> SupabaseStorage {
        SupabaseStorage::new(&StorageConfig {
            base_url: "https://project.supabase.co".to_string(),
            service_role_key: "service".to_string(),
            pet_avatar_bucket: "pet-avatars".to_string(),
            profile_avatar_bucket: "avatars".to_string(),
        })
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            storage().public_url("pet-avatars", "abc-1700000000000.png"),
            "https://project.supabase.co/storage/v1/object/public/pet-avatars/abc-1700000000000.png"
        );
    }

    #[test]
    fn test_object_path_round_trip() {
        let storage = storage();
        let url = storage.public_url("avatars", "user-1.jpg");

        assert_eq!(storage.object_path("avatars", &url).as_deref(), Some("user-1.jpg"));
        assert_eq!(storage.object_path("pet-avatars", &url), None);
        assert_eq!(storage.object_path("avatars", "https://elsewhere.example/x.png"), None);
    }

    #[tokio::test]
    async fn test_remove_nothing_is_a_no_op() {
        assert!(storage().remove("avatars", &[]).await.is_ok());
    }
}
