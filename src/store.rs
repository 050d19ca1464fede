//! Record store client.
//!
//! The record store is the task manager's REST API: a flat JSON store with
//! per-collection endpoints. Warden only consumes the three operations the
//! check cycles need — fetch domains by owner, fetch support passwords,
//! delete a support password. The seam is a trait so cycle tests can run
//! against an in-memory store.

use crate::config::StoreConfig;
use crate::error::{Result, WardenError};
use crate::records::{DomainRecord, PasswordRecord};
use async_trait::async_trait;
use std::time::Duration;

/// Fetch/delete operations against the record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch all domain records owned by `user_id`.
    async fn fetch_domains(&self, user_id: &str) -> Result<Vec<DomainRecord>>;

    /// Fetch all support password records.
    async fn fetch_passwords(&self) -> Result<Vec<PasswordRecord>>;

    /// Delete a support password by record id.
    async fn delete_password(&self, id: &str) -> Result<()>;
}

/// HTTP implementation over the record store's REST API.
pub struct HttpRecordStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRecordStore {
    /// Build a client from store configuration.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WardenError::Store(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    async fn read_error_body(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("{status}: {body}")
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch_domains(&self, user_id: &str) -> Result<Vec<DomainRecord>> {
        let url = format!("{}/domains", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("userId", user_id)])
            .send()
            .await
            .map_err(|e| WardenError::Store(format!("domain fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WardenError::Store(format!(
                "domain fetch failed ({})",
                Self::read_error_body(response).await
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WardenError::Store(format!("cannot decode domain list: {e}")))
    }

    async fn fetch_passwords(&self) -> Result<Vec<PasswordRecord>> {
        let url = format!("{}/passwords", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WardenError::Store(format!("password fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WardenError::Store(format!(
                "password fetch failed ({})",
                Self::read_error_body(response).await
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WardenError::Store(format!("cannot decode password list: {e}")))
    }

    async fn delete_password(&self, id: &str) -> Result<()> {
        let url = format!("{}/passwords/{id}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| WardenError::Store(format!("password delete failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WardenError::Store(format!(
                "password delete failed ({})",
                Self::read_error_body(response).await
            )));
        }

        Ok(())
    }
}
