use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::{RecordStore, StoreError};
use crate::models::record::{fields, CertificateRecord, CertificateStatus};

const API_URL: &str = "https://api.airtable.com/v0";

/// One page per count query; Airtable caps pages at 100 records, so counts
/// above that under-report. Accepted: the count is a continuation predicate.
const COUNT_PAGE_SIZE: usize = 100;

/// Airtable REST client for the certificate table.
pub struct AirtableStore {
    http: Client,
    api_key: String,
    base_url: String,
    base_id: String,
    table: String,
}

#[derive(Deserialize)]
struct ListResponse {
    records: Vec<CertificateRecord>,
}

impl AirtableStore {
    pub fn new(api_key: &str, base_id: &str, table: &str) -> Self {
        Self::with_base_url(api_key, base_id, table, API_URL)
    }

    /// Point the client at a custom API root (useful for testing).
    pub fn with_base_url(api_key: &str, base_id: &str, table: &str, base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            base_id: base_id.to_string(),
            table: table.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/{}/{}", self.base_url, self.base_id, self.table)
    }

    fn filter_formula(status: CertificateStatus) -> String {
        format!("{{{}}}='{}'", fields::STATUS, status.as_str())
    }

    async fn list(
        &self,
        status: CertificateStatus,
        query: &[(&str, String)],
    ) -> Result<Vec<CertificateRecord>, StoreError> {
        let mut params = vec![("filterByFormula", Self::filter_formula(status))];
        params.extend_from_slice(query);

        let response = self
            .http
            .get(self.table_url())
            .bearer_auth(&self.api_key)
            .query(&params)
            .send()
            .await?;

        let body: ListResponse = Self::check(response).await?.json().await?;
        Ok(body.records)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn count(&self, status: CertificateStatus) -> Result<usize, StoreError> {
        let records = self
            .list(status, &[("pageSize", COUNT_PAGE_SIZE.to_string())])
            .await?;
        Ok(records.len())
    }

    async fn fetch_batch(
        &self,
        status: CertificateStatus,
        limit: usize,
    ) -> Result<Vec<CertificateRecord>, StoreError> {
        self.list(status, &[("maxRecords", limit.to_string())]).await
    }

    async fn update(&self, id: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let url = format!("{}/{}", self.table_url(), id);
        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}
