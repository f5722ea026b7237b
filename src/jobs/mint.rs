use async_trait::async_trait;
use serde_json::{json, Map};

use super::{JobError, StageJob, StageOutcome};
use crate::app_state::AppState;
use crate::models::record::{fields, CertificateStatus};
use crate::services::chain::explorer_address_url;

/// Stage 2: Mint.
///
/// Exactly one record per invocation; minting is rate-sensitive and the
/// chain serializes it anyway. Mints one item from the record's candy
/// machine, writes the explorer link and advances to `SPL Minted`. A record
/// missing its machine or certificate id is logged and left untouched at
/// `SPL Loaded`.
pub struct MintJob {
    state: AppState,
    cluster: String,
}

impl MintJob {
    pub fn new(state: AppState, cluster: &str) -> Self {
        Self {
            state,
            cluster: cluster.to_string(),
        }
    }
}

#[async_trait]
impl StageJob for MintJob {
    fn name(&self) -> &'static str {
        "mint"
    }

    fn precondition(&self) -> CertificateStatus {
        CertificateStatus::Loaded
    }

    async fn run(&self) -> Result<StageOutcome, JobError> {
        let record = match self.state.store.fetch_one(self.precondition()).await? {
            Some(record) => record,
            None => {
                tracing::info!("no SPL Loaded records, nothing to mint");
                return Ok(StageOutcome::Idle);
            }
        };

        let (machine_id, certificate_id) =
            match (record.candy_machine_id(), record.certificate_id()) {
                (Some(machine_id), Some(certificate_id)) => {
                    (machine_id.to_string(), certificate_id)
                }
                _ => {
                    tracing::error!(
                        record_id = %record.id,
                        "record missing Candy Machine ID or Certificate ID, leaving untouched"
                    );
                    return Ok(StageOutcome::Skipped);
                }
            };

        let mint_address = self.state.chain.mint(&machine_id).await?;
        let link = explorer_address_url(&mint_address, &self.cluster);

        let mut patch = Map::new();
        patch.insert(fields::NFT_LINK.to_string(), json!(link));
        patch.insert(
            fields::STATUS.to_string(),
            json!(CertificateStatus::Minted.as_str()),
        );
        self.state.store.update(&record.id, patch).await?;

        tracing::info!(
            record_id = %record.id,
            certificate_id = %certificate_id,
            mint = %mint_address,
            "minted and advanced to SPL Minted"
        );

        Ok(StageOutcome::Processed(1))
    }
}
