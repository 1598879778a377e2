//! Transactional email delivery.
//!
//! Handlers build an [`EmailMessage`] and hand it to an [`EmailSender`]. In
//! production that is [`ResendEmailSender`], which posts to a Resend-compatible
//! `/emails` endpoint. Without an API key the server falls back to
//! [`LogEmailSender`], which only logs the message.

use anyhow::{anyhow, Context, Result};
use askama::Template;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, instrument};

use crate::APP_USER_AGENT;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Email delivery abstraction used by the auth handlers.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error describing why it was not accepted.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the message instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            html = %message.html,
            "email send stub"
        );
        Ok(())
    }
}

pub struct ResendEmailSender {
    client: Client,
    api_url: String,
    api_key: SecretString,
    from: String,
}

impl std::fmt::Debug for ResendEmailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendEmailSender")
            .field("api_url", &self.api_url)
            .field("api_key", &"***")
            .field("from", &self.from)
            .finish()
    }
}

impl ResendEmailSender {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: String, api_key: SecretString, from: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build email HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            from,
        })
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let url = format!("{}/emails", self.api_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({
                "from": self.from,
                "to": [message.to],
                "subject": message.subject,
                "html": message.html,
            }))
            .send()
            .await
            .with_context(|| format!("Failed to reach {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: Value = response.json().await.unwrap_or(Value::Null);
            return Err(anyhow!(
                "{} - {}, {}",
                url,
                status,
                body["message"].as_str().unwrap_or("")
            ));
        }

        let body: Value = response.json().await?;
        let id = body["id"]
            .as_str()
            .ok_or_else(|| anyhow!("Error parsing JSON response: no id found"))?;

        info!(email_id = id, "verification email accepted");

        Ok(())
    }
}

#[derive(Template)]
#[template(path = "verify_email.html")]
struct VerificationEmailTemplate<'a> {
    first_name: &'a str,
    verification_link: &'a str,
    expires_in_minutes: i64,
}

/// Render the account verification email.
///
/// # Errors
/// Returns an error if the template fails to render.
pub fn verification_email(
    to: &str,
    first_name: &str,
    verification_link: &str,
    ttl_seconds: i64,
) -> Result<EmailMessage> {
    let html = VerificationEmailTemplate {
        first_name,
        verification_link,
        expires_in_minutes: ttl_seconds / 60,
    }
    .render()
    .context("Failed to render verification email")?;

    Ok(EmailMessage {
        to: to.to_string(),
        subject: "Verify your email".to_string(),
        html,
    })
}
