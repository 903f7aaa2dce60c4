//! Callback ingestion: the single writer for job/run status.
//!
//! Every inbound station callback (and the dispatcher's own progress
//! events) flows through [`EventIngest::create_event`], one database
//! transaction per call. Lock order inside a transaction is always run
//! before job; the run row is locked only when the event carries a
//! `resultStatus` and can therefore change it.

use std::sync::Arc;

use trainhub_core::status::JobStatus;
use trainhub_core::transition::{authorize_callback, evaluate_result_status};
use trainhub_db::models::job_artifact::{CreateJobArtifact, JobArtifact};
use trainhub_db::models::job_event::{CreateJobEvent, JobEvent};
use trainhub_db::repositories::{JobArtifactRepo, JobEventRepo, JobRepo, RunRepo};
use trainhub_db::DbPool;
use trainhub_notify::{StatusUpdate, UpdateBus};
use uuid::Uuid;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use trainhub_core::error::DomainError;
use trainhub_core::hashing::verify_artifact;

use crate::error::{not_found, AppResult};

/// Ingestion engine. Clones share the pool and the update bus.
#[derive(Clone)]
pub struct EventIngest {
    pool: DbPool,
    bus: Arc<UpdateBus>,
}

impl EventIngest {
    pub fn new(pool: DbPool, bus: Arc<UpdateBus>) -> Self {
        Self { pool, bus }
    }

    /// Ingest one callback event for a job.
    ///
    /// Validates the secret and remote ID, appends the event, applies
    /// the result status to the job and re-derives the run status when
    /// one is present, and publishes the fresh representations on the
    /// bus after commit. The job version is bumped exactly once per
    /// accepted event.
    pub async fn create_event(
        &self,
        run_uuid: Uuid,
        job_uuid: Uuid,
        input: &CreateJobEvent,
    ) -> AppResult<JobEvent> {
        let mut tx = self.pool.begin().await?;

        // Run lock first, and only when the event can change the run.
        let run = match input.result_status {
            Some(_) => Some(
                RunRepo::find_for_update(&mut tx, run_uuid)
                    .await?
                    .ok_or_else(|| not_found("Run", run_uuid))?,
            ),
            None => None,
        };

        let job = JobRepo::find_for_update(&mut tx, job_uuid)
            .await?
            .ok_or_else(|| not_found("Job", job_uuid))?;
        if job.run_uuid != run_uuid {
            return Err(not_found("Job", job_uuid));
        }

        let bind = authorize_callback(
            &job.secret,
            job.remote_id.as_deref(),
            &input.secret,
            input.remote_id.as_deref(),
        )?;
        if let Some(remote_id) = &bind {
            JobRepo::bind_remote_id(&mut tx, job_uuid, remote_id).await?;
        }

        let mut run_changed = false;
        if let (Some(result_status), Some(run)) = (input.result_status, run.as_ref()) {
            let sibling_statuses: Vec<JobStatus> = JobRepo::statuses_for_run(&mut tx, run_uuid)
                .await?
                .into_iter()
                .map(|(uuid, status)| if uuid == job_uuid { result_status } else { status })
                .collect();

            let change = evaluate_result_status(
                result_status,
                input.occurred_at,
                job.finished_at,
                run.status,
                run.finished_at,
                &sibling_statuses,
            );

            JobRepo::apply_status(&mut tx, job_uuid, change.job_status, change.job_finished_at)
                .await?;
            RunRepo::apply_status(&mut tx, run_uuid, change.run_status, change.run_finished_at)
                .await?;
            run_changed = true;

            tracing::info!(
                run_id = %run_uuid,
                job_id = %job_uuid,
                job_status = ?change.job_status,
                run_status = ?change.run_status,
                "Result status applied",
            );
        } else {
            // Message-only event: no status change, but readers polling
            // the job must still see it.
            JobRepo::bump_version(&mut tx, job_uuid).await?;
        }

        let event = JobEventRepo::insert(&mut tx, job_uuid, input).await?;
        tx.commit().await?;

        self.publish_job(job_uuid, run_changed.then_some(run_uuid))
            .await?;
        Ok(event)
    }

    /// Ingest one artifact upload for a job.
    ///
    /// Same secret/remote-ID rules as events. The payload is decoded
    /// and verified against the declared size and hash before any row
    /// is written. Artifacts never change status, so nothing is
    /// published.
    pub async fn create_artifact(
        &self,
        run_uuid: Uuid,
        job_uuid: Uuid,
        input: &CreateJobArtifact,
    ) -> AppResult<JobArtifact> {
        let mut tx = self.pool.begin().await?;

        let job = JobRepo::find_for_update(&mut tx, job_uuid)
            .await?
            .ok_or_else(|| not_found("Job", job_uuid))?;
        if job.run_uuid != run_uuid {
            return Err(not_found("Job", job_uuid));
        }

        let bind = authorize_callback(
            &job.secret,
            job.remote_id.as_deref(),
            &input.secret,
            input.remote_id.as_deref(),
        )?;
        if let Some(remote_id) = &bind {
            JobRepo::bind_remote_id(&mut tx, job_uuid, remote_id).await?;
        }

        let data = BASE64
            .decode(&input.base64data)
            .map_err(|_| DomainError::Validation("Payload is not valid base64".into()))?;
        verify_artifact(&data, input.bytesize, &input.hash)?;

        let artifact = JobArtifactRepo::insert(&mut tx, job_uuid, input, &data).await?;
        tx.commit().await?;

        tracing::info!(
            job_id = %job_uuid,
            artifact_id = %artifact.uuid,
            bytesize = artifact.bytesize,
            "Artifact stored",
        );
        Ok(artifact)
    }

    /// Publish the current representation of a run to the bus.
    ///
    /// Used by flows that change a run outside `create_event` (creation,
    /// rename, dispatch claim).
    pub async fn publish_run(&self, run_uuid: Uuid) -> AppResult<()> {
        if let Some(detail) = RunRepo::detail(&self.pool, run_uuid).await? {
            self.bus.publish(StatusUpdate::for_run(detail));
        }
        Ok(())
    }

    async fn publish_job(&self, job_uuid: Uuid, changed_run: Option<Uuid>) -> AppResult<()> {
        let job = JobRepo::detail(&self.pool, job_uuid).await?;
        let run = match changed_run {
            Some(run_uuid) => RunRepo::detail(&self.pool, run_uuid).await?,
            None => None,
        };
        self.bus.publish(StatusUpdate { run, job });
        Ok(())
    }
}
