//! Repository for the append-only `job_events` table.
//!
//! Events are ordered by `(occurred_at, seq)`: `occurred_at` is the
//! station-reported time, `seq` the ingestion sequence that makes the
//! order total when stations report identical timestamps.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::job_event::{CreateJobEvent, JobEvent};

/// Column list for `job_events` queries.
const COLUMNS: &str = "\
    uuid, seq, job_uuid, event_type, result_status, message, payload, \
    occurred_at, created_at";

pub struct JobEventRepo;

impl JobEventRepo {
    /// Append one event. Rows are immutable from here on.
    pub async fn insert(
        conn: &mut PgConnection,
        job_uuid: Uuid,
        input: &CreateJobEvent,
    ) -> Result<JobEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO job_events \
                 (uuid, job_uuid, event_type, result_status, message, payload, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobEvent>(&query)
            .bind(Uuid::new_v4())
            .bind(job_uuid)
            .bind(input.event_type)
            .bind(input.result_status)
            .bind(&input.message)
            .bind(&input.payload)
            .bind(input.occurred_at)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, uuid: Uuid) -> Result<Option<JobEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM job_events WHERE uuid = $1");
        sqlx::query_as::<_, JobEvent>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// All events of a job in occurrence order.
    pub async fn list_for_job(
        pool: &PgPool,
        job_uuid: Uuid,
    ) -> Result<Vec<JobEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_events \
             WHERE job_uuid = $1 \
             ORDER BY occurred_at ASC, seq ASC"
        );
        sqlx::query_as::<_, JobEvent>(&query)
            .bind(job_uuid)
            .fetch_all(pool)
            .await
    }

    /// Events strictly after the referenced event in
    /// `(occurred_at, seq)` order.
    pub async fn list_after(
        pool: &PgPool,
        job_uuid: Uuid,
        reference: &JobEvent,
    ) -> Result<Vec<JobEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_events \
             WHERE job_uuid = $1 AND (occurred_at, seq) > ($2, $3) \
             ORDER BY occurred_at ASC, seq ASC"
        );
        sqlx::query_as::<_, JobEvent>(&query)
            .bind(job_uuid)
            .bind(reference.occurred_at)
            .bind(reference.seq)
            .fetch_all(pool)
            .await
    }
}
