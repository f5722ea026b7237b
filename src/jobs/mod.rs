pub mod mint;
pub mod prepare;
pub mod transfer;

pub use mint::MintJob;
pub use prepare::PrepareJob;
pub use transfer::TransferJob;

use async_trait::async_trait;

use crate::models::record::CertificateStatus;
use crate::services::chain::ChainError;
use crate::services::email::MailError;
use crate::services::pinning::PinError;
use crate::services::render::RenderError;
use crate::store::StoreError;

/// Result of one stage-job invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Advanced `n` records to the next status.
    Processed(usize),
    /// An eligible record was found but left untouched (bad data, logged).
    Skipped,
    /// No record matched the precondition status.
    Idle,
}

/// One step of the pipeline, invoked in-process by the orchestrator. Jobs
/// run strictly one at a time; each invocation reads records at its
/// precondition status, performs its side effects, and advances statuses.
#[async_trait]
pub trait StageJob: Send + Sync {
    fn name(&self) -> &'static str;

    /// Status a record must hold for this job to pick it up.
    fn precondition(&self) -> CertificateStatus;

    async fn run(&self) -> Result<StageOutcome, JobError>;
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pin(#[from] PinError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("failed to download source image: {0}")]
    ImageDownload(#[from] reqwest::Error),

    #[error("record {record_id} missing field '{field}'")]
    MissingField { record_id: String, field: String },

    #[error("record {record_id} has malformed field '{field}'")]
    InvalidField { record_id: String, field: String },
}

impl JobError {
    pub(crate) fn missing(record_id: &str, field: &str) -> Self {
        Self::MissingField {
            record_id: record_id.to_string(),
            field: field.to_string(),
        }
    }
}
