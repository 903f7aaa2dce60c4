//! Repository for the `job_artifacts` table. Artifact rows are
//! immutable; the payload bytes are stored inline and fetched only for
//! downloads.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::job_artifact::{CreateJobArtifact, JobArtifact};

/// Column list without the payload bytes.
const COLUMNS: &str = "\
    uuid, job_uuid, display_name, filename, bytesize, hash, \
    content_type, storage, occurred_at, created_at";

pub struct JobArtifactRepo;

impl JobArtifactRepo {
    /// Insert a validated artifact. Callers verify size and hash
    /// against `data` before calling.
    pub async fn insert(
        conn: &mut PgConnection,
        job_uuid: Uuid,
        input: &CreateJobArtifact,
        data: &[u8],
    ) -> Result<JobArtifact, sqlx::Error> {
        let query = format!(
            "INSERT INTO job_artifacts \
                 (uuid, job_uuid, display_name, filename, bytesize, hash, \
                  content_type, occurred_at, data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobArtifact>(&query)
            .bind(Uuid::new_v4())
            .bind(job_uuid)
            .bind(&input.display_name)
            .bind(&input.filename)
            .bind(input.bytesize)
            .bind(&input.hash)
            .bind(&input.content_type)
            .bind(input.occurred_at)
            .bind(data)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        uuid: Uuid,
    ) -> Result<Option<JobArtifact>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM job_artifacts WHERE uuid = $1");
        sqlx::query_as::<_, JobArtifact>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_job(
        pool: &PgPool,
        job_uuid: Uuid,
    ) -> Result<Vec<JobArtifact>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_artifacts \
             WHERE job_uuid = $1 \
             ORDER BY occurred_at ASC, uuid ASC"
        );
        sqlx::query_as::<_, JobArtifact>(&query)
            .bind(job_uuid)
            .fetch_all(pool)
            .await
    }

    /// Payload bytes for a download.
    pub async fn data(pool: &PgPool, uuid: Uuid) -> Result<Option<Vec<u8>>, sqlx::Error> {
        sqlx::query_scalar::<_, Vec<u8>>("SELECT data FROM job_artifacts WHERE uuid = $1")
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }
}
