//! HTTP client for the hosted email function.

use std::time::Duration;

use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretBox};
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::error::{FrontdeskError, Result};

use super::{EmailReceipt, Mailer, OutboundEmail};

/// Response envelope: `{success, data}` on success, `{error}` on failure.
/// The function returns HTTP 500 with the error envelope for any failure,
/// so both the status and the body are checked.
#[derive(Debug, Deserialize)]
struct EmailEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpMailer {
    client: Client,
    endpoint: Url,
    api_key: Option<SecretBox<String>>,
}

impl HttpMailer {
    /// Create a mailer posting to the given function endpoint.
    ///
    /// Configures the HTTP client with a 30s connect timeout and 60s total
    /// timeout.
    pub fn new(endpoint: &str, api_key: Option<&str>) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            FrontdeskError::Config(format!("invalid email endpoint '{endpoint}': {e}"))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.map(|k| SecretBox::new(Box::new(k.to_string()))),
        })
    }

    /// Create a mailer from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let endpoint = config.email_function_url().ok_or_else(|| {
            FrontdeskError::Config(
                "email endpoint not configured. Set FRONTDESK_EMAIL_URL or email.function_url"
                    .to_string(),
            )
        })?;
        let api_key = config.email_api_key();
        Self::new(&endpoint, api_key.as_deref())
    }
}

#[async_trait::async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<EmailReceipt> {
        let mut request = self.client.post(self.endpoint.clone()).json(email);
        if let Some(key) = &self.api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
                .map_err(|_| {
                    FrontdeskError::Auth("email API key contains invalid header characters".to_string())
                })?;
            request = request.header(header::AUTHORIZATION, value);
        }

        let response = request.send().await?;
        let status = response.status();
        let envelope: EmailEnvelope = response.json().await.unwrap_or(EmailEnvelope {
            success: None,
            data: None,
            error: Some(format!("unreadable email service response (HTTP {status})")),
        });

        if let Some(error) = envelope.error {
            return Err(FrontdeskError::Api(format!("email service error: {error}")));
        }
        if !status.is_success() {
            return Err(FrontdeskError::Api(format!(
                "email service error: HTTP {status}"
            )));
        }
        if envelope.success == Some(false) {
            return Err(FrontdeskError::Api(
                "email service reported failure without detail".to_string(),
            ));
        }

        Ok(EmailReceipt {
            data: envelope.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let envelope: EmailEnvelope =
            serde_json::from_str(r#"{"success": true, "data": {"id": "em_1"}}"#).unwrap();
        assert_eq!(envelope.success, Some(true));
        assert!(envelope.error.is_none());
        assert_eq!(envelope.data.unwrap()["id"], "em_1");
    }

    #[test]
    fn test_envelope_error() {
        let envelope: EmailEnvelope =
            serde_json::from_str(r#"{"error": "Failed to send email"}"#).unwrap();
        assert_eq!(envelope.error.as_deref(), Some("Failed to send email"));
        assert!(envelope.success.is_none());
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        assert!(HttpMailer::new("::not-a-url::", None).is_err());
    }
}
