//! Image hosting for profile pictures and cover backgrounds.
//!
//! Uploads go to a Cloudinary-compatible API using signed requests: the
//! parameters are sorted by name, joined as `k=v&k=v`, suffixed with the API
//! secret and hashed with SHA-256.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::APP_USER_AGENT;

/// Where an uploaded image is displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageSlot {
    Profile,
    Cover,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("File type is incorrect")]
pub struct InvalidImageSlot;

impl ImageSlot {
    /// # Errors
    /// Returns [`InvalidImageSlot`] for anything other than `profile` or `cover`.
    pub fn parse(value: &str) -> Result<Self, InvalidImageSlot> {
        match value.trim() {
            "profile" => Ok(Self::Profile),
            "cover" => Ok(Self::Cover),
            _ => Err(InvalidImageSlot),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Cover => "cover",
        }
    }

    /// Folder the image is stored under at the host.
    #[must_use]
    pub const fn folder(self) -> &'static str {
        self.as_str()
    }
}

#[derive(Clone, Debug)]
pub struct ImageFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

/// Metadata returned by the host for a stored image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadResult {
    pub public_id: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub secure_url: String,
    pub created_at: String,
    #[serde(default)]
    pub original_filename: Option<String>,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, folder: &str, file: ImageFile) -> Result<UploadResult>;

    async fn destroy(&self, public_id: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub api_url: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
}

pub struct CloudinaryClient {
    client: Client,
    config: CloudinaryConfig,
}

impl std::fmt::Debug for CloudinaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryClient")
            .field("api_url", &self.config.api_url)
            .field("cloud_name", &self.config.cloud_name)
            .field("api_key", &self.config.api_key)
            .field("api_secret", &"***")
            .finish()
    }
}

/// Sign request parameters the way the image host expects.
#[must_use]
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build image host HTTP client")?;

        Ok(Self {
            client,
            config: CloudinaryConfig {
                api_url: config.api_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{action}",
            self.config.api_url, self.config.cloud_name
        )
    }
}

async fn error_from(url: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    anyhow!(
        "{} - {}, {}",
        url,
        status,
        body["error"]["message"].as_str().unwrap_or("")
    )
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    #[instrument(skip(self, file), fields(file_name = %file.file_name, size = file.bytes.len()))]
    async fn upload(&self, folder: &str, file: ImageFile) -> Result<UploadResult> {
        let url = self.endpoint("upload");
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", folder), ("timestamp", &timestamp)],
            self.config.api_secret.expose_secret(),
        );

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .context("Invalid image content type")?;

        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
            .part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to reach {url}"))?;

        if !response.status().is_success() {
            return Err(error_from(&url, response).await);
        }

        let result: UploadResult = response
            .json()
            .await
            .context("Error parsing JSON response from image upload")?;

        debug!(public_id = %result.public_id, "image uploaded");

        Ok(result)
    }

    #[instrument(skip(self))]
    async fn destroy(&self, public_id: &str) -> Result<()> {
        let url = self.endpoint("destroy");
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            self.config.api_secret.expose_secret(),
        );

        let response = self
            .client
            .post(&url)
            .form(&[
                ("public_id", public_id),
                ("api_key", self.config.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to reach {url}"))?;

        if !response.status().is_success() {
            return Err(error_from(&url, response).await);
        }

        let body: Value = response.json().await?;
        match body["result"].as_str() {
            Some("ok") => Ok(()),
            other => Err(anyhow!(
                "Failed to delete image {public_id}: {}",
                other.unwrap_or("unknown result")
            )),
        }
    }
}
