//! Expiry warning notification channel.
//!
//! Warnings go out through a template email service: one POST per warning
//! carrying the service account, template id, public key, and the named
//! template parameters. There is no retry; the caller decides what a
//! failed send means for the rest of the batch.

use crate::config::NotifyConfig;
use crate::error::{Result, WardenError};
use async_trait::async_trait;
use serde_json::json;

/// How urgent a warning is, derived from the remaining days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Expiry is approaching (30-day warning).
    Warning,
    /// Last day before expiry.
    Critical,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// One domain expiry warning, addressed to the record owner.
#[derive(Debug, Clone)]
pub struct ExpiryWarning {
    /// Recipient address.
    pub to_email: String,
    /// Recipient display name.
    pub to_name: String,
    /// The expiring domain.
    pub domain_name: String,
    /// Whole days until expiry.
    pub days_left: i64,
}

impl ExpiryWarning {
    /// Urgency level: critical on the last day, warning otherwise.
    #[must_use]
    pub fn urgency(&self) -> Urgency {
        if self.days_left == 1 {
            Urgency::Critical
        } else {
            Urgency::Warning
        }
    }

    /// Subject line for the warning email.
    #[must_use]
    pub fn subject(&self) -> String {
        let unit = if self.days_left == 1 { "day" } else { "days" };
        format!("{} expires in {} {unit}", self.domain_name, self.days_left)
    }

    /// Named template parameters for the send request.
    #[must_use]
    pub fn template_params(&self) -> serde_json::Value {
        json!({
            "to_email": self.to_email,
            "to_name": self.to_name,
            "domain_name": self.domain_name,
            "days_left": self.days_left.to_string(),
            "urgency_level": self.urgency().to_string(),
            "subject": self.subject(),
        })
    }
}

/// Notification channel contract.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one expiry warning. No retry on failure.
    async fn send_expiry_warning(&self, warning: &ExpiryWarning) -> Result<()>;
}

/// Template email service adapter.
pub struct EmailNotifier {
    base_url: String,
    service_id: String,
    template_id: String,
    public_key: String,
    client: reqwest::Client,
}

impl EmailNotifier {
    /// Build an adapter from notification configuration.
    #[must_use]
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            service_id: config.service_id.clone(),
            template_id: config.template_id.clone(),
            public_key: config.public_key.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send_expiry_warning(&self, warning: &ExpiryWarning) -> Result<()> {
        if self.service_id.trim().is_empty() {
            return Err(WardenError::Notify("notify service id is empty".to_owned()));
        }
        if self.public_key.trim().is_empty() {
            return Err(WardenError::Notify("notify public key is empty".to_owned()));
        }

        let url = format!("{}/api/v1.0/email/send", self.base_url);
        let body = json!({
            "service_id": self.service_id,
            "template_id": self.template_id,
            "user_id": self.public_key,
            "template_params": warning.template_params(),
        });
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| WardenError::Notify(format!("warning send failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WardenError::Notify(format!(
                "warning send failed ({status}): {body}"
            )));
        }

        Ok(())
    }
}
