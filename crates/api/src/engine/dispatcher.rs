//! Background run dispatcher.
//!
//! A single long-lived task that claims due runs and announces their
//! jobs to the target stations. Claiming is an atomic conditional
//! transition in `RunRepo::claim_next_due`, so concurrent coordinator
//! instances can never dispatch the same run twice.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use trainhub_core::status::{JobEventType, JobStatus};
use trainhub_db::models::job::DispatchJob;
use trainhub_db::models::job_event::CreateJobEvent;
use trainhub_db::repositories::RunRepo;
use trainhub_db::DbPool;
use trainhub_dispatch::StationClient;

use crate::engine::ingest::EventIngest;
use crate::error::AppError;

pub struct RunDispatcher {
    pool: DbPool,
    ingest: EventIngest,
    client: Arc<StationClient>,
    tick_interval: Duration,
}

impl RunDispatcher {
    pub fn new(
        pool: DbPool,
        ingest: EventIngest,
        client: Arc<StationClient>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            pool,
            ingest,
            client,
            tick_interval,
        }
    }

    /// Run the dispatcher loop until the cancellation token is
    /// triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        tracing::info!(
            tick_interval_secs = self.tick_interval.as_secs(),
            "Run dispatcher started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Run dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(error = %e, "Dispatch cycle failed");
                    }
                }
            }
        }
    }

    /// One dispatch cycle: claim due runs until none are left.
    ///
    /// The claimed set is a cycle breaker: a run reappearing within one
    /// tick means the claim did not stick, and looping on it would spin
    /// forever.
    async fn tick(&self) -> Result<(), AppError> {
        let mut claimed = HashSet::new();

        loop {
            let Some(claim) = RunRepo::claim_next_due(&self.pool, Utc::now()).await? else {
                break;
            };
            if !claimed.insert(claim.run.uuid) {
                tracing::warn!(
                    run_id = %claim.run.uuid,
                    "Run claimed twice in one cycle, ending cycle",
                );
                break;
            }

            tracing::info!(
                run_id = %claim.run.uuid,
                jobs = claim.jobs.len(),
                "Run claimed for dispatch",
            );

            // The claim itself bumped the run version; wake pollers.
            self.ingest.publish_run(claim.run.uuid).await?;

            for job in &claim.jobs {
                self.dispatch_job(job).await;
            }
        }

        Ok(())
    }

    /// Announce and dispatch a single job. A failure here is recorded
    /// against the job and never stops its siblings.
    async fn dispatch_job(&self, job: &DispatchJob) {
        let announce = CreateJobEvent {
            secret: job.secret.clone(),
            remote_id: None,
            event_type: JobEventType::Info,
            message: "Dispatching job to station".into(),
            payload: None,
            result_status: Some(JobStatus::Running),
            occurred_at: Utc::now(),
        };
        if let Err(e) = self.ingest.create_event(job.run_uuid, job.uuid, &announce).await {
            tracing::error!(
                job_id = %job.uuid,
                error = %e,
                "Failed to record dispatch announcement",
            );
            return;
        }

        // The snapshot still carries the claim-time PREPARED status the
        // client's precondition expects.
        if let Err(e) = self.client.dispatch(job).await {
            tracing::error!(
                job_id = %job.uuid,
                station_uri = %job.station_uri,
                error = %e,
                "Dispatch failed",
            );

            let failure = CreateJobEvent {
                secret: job.secret.clone(),
                remote_id: None,
                event_type: JobEventType::Error,
                message: format!("Dispatch failed: {e}"),
                payload: None,
                result_status: Some(JobStatus::Errored),
                occurred_at: Utc::now(),
            };
            if let Err(e) = self.ingest.create_event(job.run_uuid, job.uuid, &failure).await {
                tracing::error!(
                    job_id = %job.uuid,
                    error = %e,
                    "Failed to record dispatch failure",
                );
            }
        }
    }
}
