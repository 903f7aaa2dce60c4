//! Read-only access to plans and their target stations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::plan::{Plan, PlanTarget};

pub struct PlanRepo;

impl PlanRepo {
    pub async fn find_by_id(pool: &PgPool, uuid: Uuid) -> Result<Option<Plan>, sqlx::Error> {
        sqlx::query_as::<_, Plan>(
            "SELECT uuid, display_name, train_uri, created_at, updated_at \
             FROM plans WHERE uuid = $1",
        )
        .bind(uuid)
        .fetch_optional(pool)
        .await
    }

    /// Target stations of a plan; one job is created per target.
    pub async fn targets(pool: &PgPool, plan_uuid: Uuid) -> Result<Vec<PlanTarget>, sqlx::Error> {
        sqlx::query_as::<_, PlanTarget>(
            "SELECT uuid, plan_uuid, station_name, station_uri \
             FROM plan_targets WHERE plan_uuid = $1 ORDER BY station_name ASC, uuid ASC",
        )
        .bind(plan_uuid)
        .fetch_all(pool)
        .await
    }
}
