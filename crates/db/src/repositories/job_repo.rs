//! Repository for the `jobs` table.
//!
//! Status writes bump `version` by one in the same statement; the
//! per-job version is strictly increasing. The `secret` column never
//! appears in client-facing projections.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use trainhub_core::status::JobStatus;
use uuid::Uuid;

use crate::models::job::{DispatchJob, Job, JobDetail, JobSummary};
use crate::repositories::JobEventRepo;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    uuid, run_uuid, target_uuid, remote_id, secret, status, \
    started_at, finished_at, version, created_at, updated_at";

/// Projection joined with the job's target station, for summaries.
const SUMMARY_COLUMNS: &str = "\
    j.uuid, j.run_uuid, j.remote_id, j.status, \
    pt.station_name, pt.station_uri, \
    j.started_at, j.finished_at, j.version";

pub struct JobRepo;

impl JobRepo {
    pub async fn find_by_id(pool: &PgPool, uuid: Uuid) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE uuid = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// Lock and load a job inside a transaction. Always taken after the
    /// run lock when both are needed.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        uuid: Uuid,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE uuid = $1 FOR UPDATE");
        sqlx::query_as::<_, Job>(&query)
            .bind(uuid)
            .fetch_optional(conn)
            .await
    }

    /// Insert a PREPARED job for one plan target, at version 0.
    pub async fn create(
        conn: &mut PgConnection,
        run_uuid: Uuid,
        target_uuid: Uuid,
        secret: &str,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (uuid, run_uuid, target_uuid, secret, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(Uuid::new_v4())
            .bind(run_uuid)
            .bind(target_uuid)
            .bind(secret)
            .bind(JobStatus::Prepared)
            .fetch_one(conn)
            .await
    }

    pub async fn list_for_run(
        pool: &PgPool,
        run_uuid: Uuid,
    ) -> Result<Vec<JobSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM jobs j \
             JOIN plan_targets pt ON pt.uuid = j.target_uuid \
             WHERE j.run_uuid = $1 \
             ORDER BY pt.station_name ASC, j.uuid ASC"
        );
        sqlx::query_as::<_, JobSummary>(&query)
            .bind(run_uuid)
            .fetch_all(pool)
            .await
    }

    pub async fn summary(pool: &PgPool, uuid: Uuid) -> Result<Option<JobSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM jobs j \
             JOIN plan_targets pt ON pt.uuid = j.target_uuid \
             WHERE j.uuid = $1"
        );
        sqlx::query_as::<_, JobSummary>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// Full client-facing job representation: summary plus event
    /// history in occurrence order.
    pub async fn detail(pool: &PgPool, uuid: Uuid) -> Result<Option<JobDetail>, sqlx::Error> {
        let Some(summary) = Self::summary(pool, uuid).await? else {
            return Ok(None);
        };
        let events = JobEventRepo::list_for_job(pool, uuid).await?;
        Ok(Some(JobDetail { summary, events }))
    }

    /// Current status of every job of a run, for the run-status
    /// reduction. Read under the claiming/ingesting transaction.
    pub async fn statuses_for_run(
        conn: &mut PgConnection,
        run_uuid: Uuid,
    ) -> Result<Vec<(Uuid, JobStatus)>, sqlx::Error> {
        sqlx::query_as::<_, (Uuid, JobStatus)>(
            "SELECT uuid, status FROM jobs WHERE run_uuid = $1",
        )
        .bind(run_uuid)
        .fetch_all(conn)
        .await
    }

    /// Dispatch snapshots for all jobs of a run, joined with station
    /// and train URIs. Taken inside the claiming transaction so the
    /// snapshot status is the pre-dispatch one.
    pub async fn dispatch_snapshots(
        conn: &mut PgConnection,
        run_uuid: Uuid,
    ) -> Result<Vec<DispatchJob>, sqlx::Error> {
        sqlx::query_as::<_, DispatchJob>(
            "SELECT j.uuid, j.run_uuid, j.secret, j.status, pt.station_uri, p.train_uri \
             FROM jobs j \
             JOIN plan_targets pt ON pt.uuid = j.target_uuid \
             JOIN runs r ON r.uuid = j.run_uuid \
             JOIN plans p ON p.uuid = r.plan_uuid \
             WHERE j.run_uuid = $1 \
             ORDER BY pt.station_name ASC, j.uuid ASC",
        )
        .bind(run_uuid)
        .fetch_all(conn)
        .await
    }

    /// Bind the station-assigned remote ID. Written at most once per
    /// job; callers enforce first-caller-wins via the transaction lock.
    pub async fn bind_remote_id(
        conn: &mut PgConnection,
        uuid: Uuid,
        remote_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs SET remote_id = $2, updated_at = now() \
             WHERE uuid = $1 AND remote_id IS NULL",
        )
        .bind(uuid)
        .bind(remote_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Apply a reported result status, stamping `finished_at` at most
    /// once and bumping the version.
    pub async fn apply_status(
        conn: &mut PgConnection,
        uuid: Uuid,
        status: JobStatus,
        finished_at: Option<DateTime<Utc>>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs \
             SET status = $2, finished_at = COALESCE(finished_at, $3), \
                 version = version + 1, updated_at = now() \
             WHERE uuid = $1",
        )
        .bind(uuid)
        .bind(status)
        .bind(finished_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Version bump for events that carry no result status.
    pub async fn bump_version(conn: &mut PgConnection, uuid: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE jobs SET version = version + 1, updated_at = now() WHERE uuid = $1")
            .bind(uuid)
            .execute(conn)
            .await?;
        Ok(())
    }
}
