use async_trait::async_trait;
use serde_json::{json, Map};

use super::{JobError, StageJob, StageOutcome};
use crate::app_state::AppState;
use crate::models::record::{fields, CertificateStatus};
use crate::services::chain::{explorer_tx_url, mint_address_from_link};
use crate::services::email::{certificate_email_html, first_name_from_email, CERTIFICATE_SUBJECT};

/// Stage 3: Transfer & Notify.
///
/// Exactly one record per invocation. Re-derives the mint address from the
/// link stage 2 wrote, transfers the NFT to the recipient wallet, records
/// the transaction link together with the `Success` status, and then emails
/// the recipient.
pub struct TransferJob {
    state: AppState,
    cluster: String,
}

impl TransferJob {
    pub fn new(state: AppState, cluster: &str) -> Self {
        Self {
            state,
            cluster: cluster.to_string(),
        }
    }

    /// Writes the transaction link and advances the record to `Success`
    /// BEFORE the notification is attempted. An email failure after this
    /// point leaves the record marked `Success` with no retry path for the
    /// notification alone. Moving this call after the send is the one-line
    /// correction if that ordering is ever revisited.
    async fn mark_success_before_notify(
        &self,
        record_id: &str,
        tx_link: &str,
    ) -> Result<(), JobError> {
        let mut patch = Map::new();
        patch.insert(fields::TXN.to_string(), json!(tx_link));
        patch.insert(
            fields::STATUS.to_string(),
            json!(CertificateStatus::Success.as_str()),
        );
        self.state.store.update(record_id, patch).await?;
        Ok(())
    }
}

#[async_trait]
impl StageJob for TransferJob {
    fn name(&self) -> &'static str {
        "transfer-notify"
    }

    fn precondition(&self) -> CertificateStatus {
        CertificateStatus::Minted
    }

    async fn run(&self) -> Result<StageOutcome, JobError> {
        let record = match self.state.store.fetch_one(self.precondition()).await? {
            Some(record) => record,
            None => {
                tracing::info!("no SPL Minted records, nothing to transfer");
                return Ok(StageOutcome::Idle);
            }
        };

        let link = record
            .nft_link()
            .ok_or_else(|| JobError::missing(&record.id, fields::NFT_LINK))?
            .to_string();
        let wallet = record
            .wallet_address()
            .ok_or_else(|| JobError::missing(&record.id, fields::WALLET_ADDRESS))?
            .to_string();
        let email = record
            .email()
            .ok_or_else(|| JobError::missing(&record.id, fields::EMAIL))?
            .to_string();
        let programme = record
            .programme_name()
            .ok_or_else(|| JobError::missing(&record.id, fields::PROGRAMME_NAME))?
            .to_string();

        let mint_address = mint_address_from_link(&link)
            .ok_or_else(|| JobError::InvalidField {
                record_id: record.id.clone(),
                field: fields::NFT_LINK.to_string(),
            })?
            .to_string();

        tracing::info!(record_id = %record.id, mint = %mint_address, to = %wallet, "transferring NFT");
        let signature = self.state.chain.transfer(&mint_address, &wallet).await?;
        let tx_link = explorer_tx_url(&signature, &self.cluster);
        tracing::info!(record_id = %record.id, signature = %signature, "transfer confirmed");

        self.mark_success_before_notify(&record.id, &tx_link).await?;

        tracing::info!(record_id = %record.id, to = %email, "sending notification");
        let html =
            certificate_email_html(first_name_from_email(&email), &programme, &wallet, &tx_link);
        self.state
            .mailer
            .send(&email, CERTIFICATE_SUBJECT, &html)
            .await?;

        tracing::info!(record_id = %record.id, "transfer and notification complete");

        Ok(StageOutcome::Processed(1))
    }
}
