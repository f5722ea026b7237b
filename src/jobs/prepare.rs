use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::{JobError, StageJob, StageOutcome};
use crate::app_state::AppState;
use crate::models::record::{fields, CertificateRecord, CertificateStatus};
use crate::services::render::CertificateOverlay;

/// Stage 1: Prepare & Upload.
///
/// Drains up to `batch_size` `Ready Sol` records per invocation: renders the
/// certificate overlay onto each base image, pins image and metadata,
/// writes the IPFS references back, then provisions one candy machine sized
/// to the batch, bulk-registers the metadata URIs and advances every record
/// to `SPL Loaded`.
///
/// Any per-record failure aborts the whole invocation. Records already
/// updated keep their pinned references but do not advance, so a retry
/// re-uploads their artifacts (duplicate pins are accepted).
pub struct PrepareJob {
    state: AppState,
    http: Client,
    batch_size: usize,
}

impl PrepareJob {
    pub fn new(state: AppState, batch_size: usize) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");

        Self {
            state,
            http,
            batch_size,
        }
    }

    async fn upload_record(&self, record: &CertificateRecord) -> Result<String, JobError> {
        let image_url = record
            .image_url()
            .ok_or_else(|| JobError::missing(&record.id, fields::CERTIFICATE_IMAGE))?
            .to_string();
        let programme = record
            .programme_name()
            .ok_or_else(|| JobError::missing(&record.id, fields::PROGRAMME_NAME))?
            .to_string();
        let level = record
            .achievement_level()
            .ok_or_else(|| JobError::missing(&record.id, fields::ACHIEVEMENT_LEVEL))?
            .to_string();
        let certificate_id = record
            .certificate_id()
            .ok_or_else(|| JobError::missing(&record.id, fields::CERTIFICATE_ID))?;

        let base_image = self
            .http
            .get(&image_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let overlay = CertificateOverlay {
            programme: programme.clone(),
            level: level.clone(),
            certificate_id: certificate_id.clone(),
        };
        let rendered = self.state.renderer.render(&base_image, &overlay)?;

        let ipfs_image = self
            .state
            .pins
            .pin_file(rendered, &format!("NFT_{certificate_id}.jpg"))
            .await?;

        let metadata = certificate_metadata(&certificate_id, &programme, &level, &ipfs_image);
        let ipfs_metadata = self
            .state
            .pins
            .pin_json(&metadata, &format!("MD_{certificate_id}.json"))
            .await?;

        let mut patch = Map::new();
        patch.insert(fields::IPFS_IMAGE.to_string(), json!(ipfs_image));
        patch.insert(fields::IPFS_METADATA.to_string(), json!(ipfs_metadata));
        self.state.store.update(&record.id, patch).await?;

        tracing::info!(record_id = %record.id, certificate_id = %certificate_id, "uploaded certificate artifacts");

        Ok(ipfs_metadata)
    }
}

/// NFT metadata document referencing the pinned certificate image.
pub fn certificate_metadata(
    certificate_id: &str,
    programme: &str,
    level: &str,
    image_url: &str,
) -> Value {
    json!({
        "name": format!("Certificate #{certificate_id}"),
        "description": "Programme completion NFT certificate",
        "image": image_url,
        "attributes": [
            { "trait_type": "Programme", "value": programme },
            { "trait_type": "Level", "value": level },
        ],
    })
}

#[async_trait]
impl StageJob for PrepareJob {
    fn name(&self) -> &'static str {
        "prepare-upload"
    }

    fn precondition(&self) -> CertificateStatus {
        CertificateStatus::Ready
    }

    async fn run(&self) -> Result<StageOutcome, JobError> {
        let records = self
            .state
            .store
            .fetch_batch(self.precondition(), self.batch_size)
            .await?;

        if records.is_empty() {
            tracing::info!("no Ready Sol records to process");
            return Ok(StageOutcome::Idle);
        }

        tracing::info!(count = records.len(), "processing Ready Sol batch");

        let mut metadata_uris = Vec::with_capacity(records.len());
        for record in &records {
            metadata_uris.push(self.upload_record(record).await?);
        }

        tracing::info!("creating candy machine");
        let machine_id = self
            .state
            .chain
            .create_collection_machine(records.len() as u32)
            .await?;
        tracing::info!(machine_id = %machine_id, "loading items");
        self.state
            .chain
            .insert_items(&machine_id, &metadata_uris)
            .await?;

        for record in &records {
            let mut patch = Map::new();
            patch.insert(fields::CANDY_MACHINE_ID.to_string(), json!(machine_id));
            patch.insert(
                fields::STATUS.to_string(),
                json!(CertificateStatus::Loaded.as_str()),
            );
            self.state.store.update(&record.id, patch).await?;
            tracing::info!(record_id = %record.id, "advanced to SPL Loaded");
        }

        Ok(StageOutcome::Processed(records.len()))
    }
}
