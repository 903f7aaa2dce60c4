//! Read-only collaborator records: a Plan is a train plus its target
//! stations. CRUD for these lives outside the coordinator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `plans` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub uuid: Uuid,
    pub display_name: String,
    pub train_uri: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `plan_targets` table: one station a plan's runs will
/// dispatch to.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTarget {
    pub uuid: Uuid,
    pub plan_uuid: Uuid,
    pub station_name: String,
    pub station_uri: String,
}
