//! Repository for the `runs` table.
//!
//! All status writes bump `version` by one inside the same statement,
//! which keeps the per-run version strictly increasing without a
//! separate counter. Claiming a run for dispatch is one atomic
//! conditional transition guarded by `FOR UPDATE SKIP LOCKED` plus a
//! status check, so a run can never be claimed twice.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use trainhub_core::status::RunStatus;
use uuid::Uuid;

use crate::models::run::{ClaimedRun, CreateRun, Run, RunDetail, UpdateRun};
use crate::repositories::JobRepo;

/// Column list for `runs` queries.
const COLUMNS: &str = "\
    uuid, plan_uuid, display_name, note, status, should_start_at, \
    started_at, finished_at, version, created_at, updated_at";

/// Maximum page size for run listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for run listing.
const DEFAULT_LIMIT: i64 = 50;

pub struct RunRepo;

impl RunRepo {
    pub async fn find_by_id(pool: &PgPool, uuid: Uuid) -> Result<Option<Run>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM runs WHERE uuid = $1");
        sqlx::query_as::<_, Run>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// Lock and load a run inside a transaction. Lock order is always
    /// run before job; ingestion and the dispatcher both follow it.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        uuid: Uuid,
    ) -> Result<Option<Run>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM runs WHERE uuid = $1 FOR UPDATE");
        sqlx::query_as::<_, Run>(&query)
            .bind(uuid)
            .fetch_optional(conn)
            .await
    }

    /// Insert a new run at version 0.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateRun,
        status: RunStatus,
    ) -> Result<Run, sqlx::Error> {
        let query = format!(
            "INSERT INTO runs (uuid, plan_uuid, display_name, note, status, should_start_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(Uuid::new_v4())
            .bind(input.plan_uuid)
            .bind(&input.display_name)
            .bind(&input.note)
            .bind(status)
            .bind(input.should_start_at)
            .fetch_one(conn)
            .await
    }

    /// Update display metadata only. Not status-affecting, so the
    /// version is left untouched.
    pub async fn update_info(
        pool: &PgPool,
        uuid: Uuid,
        input: &UpdateRun,
    ) -> Result<Option<Run>, sqlx::Error> {
        let query = format!(
            "UPDATE runs SET display_name = $2, note = $3, updated_at = now() \
             WHERE uuid = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(uuid)
            .bind(&input.display_name)
            .bind(&input.note)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_plan(
        pool: &PgPool,
        plan_uuid: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Run>, sqlx::Error> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = offset.unwrap_or(0);
        let query = format!(
            "SELECT {COLUMNS} FROM runs WHERE plan_uuid = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(plan_uuid)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Full client-facing run representation: the run row plus a
    /// summary of each of its jobs.
    pub async fn detail(pool: &PgPool, uuid: Uuid) -> Result<Option<RunDetail>, sqlx::Error> {
        let Some(run) = Self::find_by_id(pool, uuid).await? else {
            return Ok(None);
        };
        let jobs = JobRepo::list_for_run(pool, uuid).await?;
        Ok(Some(RunDetail::from_parts(run, jobs)))
    }

    /// Apply a derived status to a run, stamping `finished_at` at most
    /// once and bumping the version.
    pub async fn apply_status(
        conn: &mut PgConnection,
        uuid: Uuid,
        status: RunStatus,
        finished_at: Option<DateTime<Utc>>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE runs \
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

    /// Atomically claim the next dispatch-eligible run.
    ///
    /// Eligible: SCHEDULED with a passed `should_start_at`, or PREPARED
    /// with neither start time nor `started_at`. The claim marks the
    /// run RUNNING, stamps `started_at` on the run and all of its jobs,
    /// and returns dispatch snapshots for the jobs, all in one
    /// transaction. Returns `None` when nothing is due.
    pub async fn claim_next_due(
        pool: &PgPool,
        now: DateTime<Utc>,
    ) -> Result<Option<ClaimedRun>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let candidate: Option<Uuid> = sqlx::query_scalar(
            "SELECT uuid FROM runs \
             WHERE (status = $1 AND should_start_at IS NOT NULL AND should_start_at < $3) \
                OR (status = $2 AND started_at IS NULL AND should_start_at IS NULL) \
             ORDER BY should_start_at ASC \
             LIMIT 1 \
             FOR UPDATE SKIP LOCKED",
        )
        .bind(RunStatus::Scheduled)
        .bind(RunStatus::Prepared)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(run_uuid) = candidate else {
            tx.rollback().await?;
            return Ok(None);
        };

        // Compare-and-swap on the expected pre-claim statuses. With the
        // row lock above this always matches; the guard makes a lost
        // race yield an empty claim instead of a double dispatch.
        let claim_query = format!(
            "UPDATE runs \
             SET status = $2, started_at = $3, version = version + 1, updated_at = $3 \
             WHERE uuid = $1 AND status IN ($4, $5) \
             RETURNING {COLUMNS}"
        );
        let Some(run) = sqlx::query_as::<_, Run>(&claim_query)
            .bind(run_uuid)
            .bind(RunStatus::Running)
            .bind(now)
            .bind(RunStatus::Scheduled)
            .bind(RunStatus::Prepared)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE jobs SET started_at = $2, updated_at = $2 WHERE run_uuid = $1")
            .bind(run_uuid)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let jobs = JobRepo::dispatch_snapshots(&mut *tx, run_uuid).await?;

        tx.commit().await?;
        Ok(Some(ClaimedRun { run, jobs }))
    }
}
