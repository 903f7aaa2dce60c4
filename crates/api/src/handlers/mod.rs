//! HTTP handlers, grouped by resource.

pub mod artifacts;
pub mod events;
pub mod health;
pub mod jobs;
pub mod runs;

use serde::Deserialize;

/// Query parameters for the long-poll reads on runs and jobs.
///
/// Without `after` the read returns the current state immediately. With
/// it, the response is delayed until the entity's version exceeds the
/// given value or the poll timeout passes, whichever comes first.
#[derive(Debug, Deserialize)]
pub struct PollQuery {
    pub after: Option<i64>,
}
