use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const API_URL: &str = "https://api.sendgrid.com";

pub const CERTIFICATE_SUBJECT: &str = "Your certificate NFT is on its way!";

/// Outbound notification seam: one fire-and-forget HTML email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

/// Client for the SendGrid v3 mail API.
pub struct SendGridClient {
    http: Client,
    api_key: String,
    from: String,
    base_url: String,
}

impl SendGridClient {
    pub fn new(api_key: &str, from: &str) -> Self {
        Self::with_base_url(api_key, from, API_URL)
    }

    /// Point the client at a custom API root (useful for testing).
    pub fn with_base_url(api_key: &str, from: &str, base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            api_key: api_key.to_string(),
            from: from.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Mailer for SendGridClient {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let response = self
            .http
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "personalizations": [{ "to": [{ "email": to }] }],
                "from": { "email": self.from },
                "subject": subject,
                "content": [{ "type": "text/html", "value": html }],
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Crude first name: the local part of the recipient address.
pub fn first_name_from_email(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// HTML body for the transfer notification.
pub fn certificate_email_html(
    first_name: &str,
    programme: &str,
    wallet_address: &str,
    tx_link: &str,
) -> String {
    format!(
        "<div>\
        <p>Hey {first_name},</p>\
        <p>🎉 Your NFT certificate for <strong>{programme}</strong> is now in your wallet <code>{wallet_address}</code>.</p>\
        <p>🔗 <a href=\"{tx_link}\" target=\"_blank\">View the transfer transaction</a></p>\
        <p>📢 Now show it off — share it with your cohort!</p>\
        <p>Thanks for taking part! 🚀</p>\
        </div>"
    )
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("HTTP request to mail service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
}
