use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::jobs::{JobError, StageJob, StageOutcome};
use crate::store::RecordStore;

/// Per-phase totals from one full cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub job: &'static str,
    pub invocations: usize,
    pub processed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub phases: Vec<PhaseReport>,
}

impl CycleReport {
    pub fn total_processed(&self) -> usize {
        self.phases.iter().map(|p| p.processed).sum()
    }

    pub fn total_invocations(&self) -> usize {
        self.phases.iter().map(|p| p.invocations).sum()
    }
}

/// Status-driven control loop over the stage jobs.
///
/// Each cycle drains the stages in pipeline order: while a job's
/// precondition status still has records, invoke it once and sleep the
/// stage delay; a zero count ends the phase. The record store is the sole
/// coordination medium — no state is shared with the jobs in memory.
pub struct Orchestrator {
    store: Arc<dyn RecordStore>,
    jobs: Vec<Arc<dyn StageJob>>,
    stage_delay: Duration,
    cycle_delay: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        jobs: Vec<Arc<dyn StageJob>>,
        stage_delay: Duration,
        cycle_delay: Duration,
    ) -> Self {
        Self {
            store,
            jobs,
            stage_delay,
            cycle_delay,
        }
    }

    /// One full pass over all phases. An error in any phase aborts the rest
    /// of the cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport, JobError> {
        let mut report = CycleReport::default();

        for job in &self.jobs {
            let mut phase = PhaseReport {
                job: job.name(),
                invocations: 0,
                processed: 0,
            };

            loop {
                let remaining = self.store.count(job.precondition()).await?;
                if remaining == 0 {
                    break;
                }

                tracing::info!(
                    job = job.name(),
                    status = job.precondition().as_str(),
                    remaining,
                    "draining stage"
                );

                let outcome = job.run().await?;
                phase.invocations += 1;
                match outcome {
                    StageOutcome::Processed(n) => phase.processed += n,
                    // A skipped record stays at its status; the phase keeps
                    // polling it, matching the at-least-once-forever contract.
                    StageOutcome::Skipped => {
                        tracing::warn!(job = job.name(), "record skipped, will retry next poll")
                    }
                    StageOutcome::Idle => {}
                }

                sleep(self.stage_delay).await;
            }

            tracing::info!(job = job.name(), processed = phase.processed, "stage drained");
            report.phases.push(phase);
        }

        Ok(report)
    }

    /// Poll forever: run a cycle, log its outcome (errors end the cycle
    /// early but never crash the loop), sleep the cycle delay, repeat.
    pub async fn run(&self) {
        loop {
            match self.run_cycle().await {
                Ok(report) => tracing::info!(
                    processed = report.total_processed(),
                    invocations = report.total_invocations(),
                    "cycle complete"
                ),
                Err(e) => tracing::error!(error = %e, "cycle aborted, will retry next cycle"),
            }

            sleep(self.cycle_delay).await;
        }
    }
}
