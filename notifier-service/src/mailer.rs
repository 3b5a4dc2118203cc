use async_trait::async_trait;
use common::errors::AppError;
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;

/// What the mail API accepts: sender, recipients, subject, HTML body.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

/// Boundary to the mail delivery collaborator. Transport-specific failures
/// are normalized to [`AppError::Dispatch`] before they leave this trait.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError>;
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: String,
    subject: &'a str,
    html_body: &'a str,
}

/// Mail transport backed by an HTTP mail API.
pub struct HttpMailer {
    client: reqwest::Client,
    base_url: String,
    server_token: String,
}

impl HttpMailer {
    pub fn new(base_url: String, server_token: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            server_token,
        }
    }
}

#[async_trait]
impl MailTransport for HttpMailer {
    #[instrument(skip(self, email), fields(subject = %email.subject))]
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        let url = format!("{}/email", self.base_url);
        let body = SendEmailRequest {
            from: &email.sender,
            to: email.recipients.join(","),
            subject: &email.subject,
            html_body: &email.html_body,
        };

        let response = self
            .client
            .post(&url)
            .header("X-Server-Token", &self.server_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::dispatch(format!("mail API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::dispatch(format!(
                "mail API returned HTTP {}",
                status
            )));
        }

        Ok(())
    }
}
