pub mod airtable;

pub use airtable::AirtableStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::models::record::{CertificateRecord, CertificateStatus};

/// Narrow seam over the external record store. The pipeline coordinates
/// entirely through this interface: status counts drive the orchestrator,
/// batches feed the stage jobs, and updates are last-write-wins field merges
/// with no concurrency token.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Number of records currently at `status`. Reads a single page, so the
    /// result is capped at the page size; the orchestrator only uses it as a
    /// loop-continuation predicate, never for pagination.
    async fn count(&self, status: CertificateStatus) -> Result<usize, StoreError>;

    /// Up to `limit` records at `status`, store-native order.
    async fn fetch_batch(
        &self,
        status: CertificateStatus,
        limit: usize,
    ) -> Result<Vec<CertificateRecord>, StoreError>;

    async fn fetch_one(
        &self,
        status: CertificateStatus,
    ) -> Result<Option<CertificateRecord>, StoreError> {
        Ok(self.fetch_batch(status, 1).await?.into_iter().next())
    }

    /// Merge `fields` into the record. Fields not named keep their values.
    async fn update(&self, id: &str, fields: Map<String, Value>) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP request to record store failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("record store returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
}
