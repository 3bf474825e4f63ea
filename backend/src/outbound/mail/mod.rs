//! Reqwest-backed mail delivery adapter.
//!
//! The provider accepts a JSON message over HTTPS with a bearer key. When no
//! credentials are configured, [`UnconfiguredMailer`] fails every send so the
//! caller decides whether the miss is fatal.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use crate::domain::ports::{MailError, Mailer, OutboundEmail};

const PREVIEW_CHAR_LIMIT: usize = 160;

#[derive(Debug, Serialize)]
struct MessageDto<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Connection details for the mail provider.
pub struct MailCredentials {
    pub endpoint: Url,
    pub api_key: String,
    pub sender: String,
}

/// Mailer that posts each message to the provider endpoint.
pub struct HttpMailer {
    client: Client,
    credentials: MailCredentials,
}

impl HttpMailer {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(credentials: MailCredentials, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &OutboundEmail) -> Result<(), MailError> {
        let payload = MessageDto {
            from: &self.credentials.sender,
            to: message.to.as_ref(),
            subject: &message.subject,
            text: &message.body,
        };
        let response = self
            .client
            .post(self.credentials.endpoint.clone())
            .bearer_auth(&self.credentials.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %message.to, subject = %message.subject, "email accepted");
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref()))
    }
}

/// Mailer used when no credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, _message: &OutboundEmail) -> Result<(), MailError> {
        Err(MailError::not_configured())
    }
}

fn map_transport_error(error: reqwest::Error) -> MailError {
    MailError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> MailError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned()
    } else {
        preview
    };
    MailError::rejected(status.as_u16(), message)
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
