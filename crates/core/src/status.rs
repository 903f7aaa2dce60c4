//! Job and Run status enums plus the run-status reduction.
//!
//! Statuses are stored as Postgres enum types (`job_status`,
//! `run_status`) and serialized as SCREAMING_CASE strings over the API,
//! matching the values stations send in event callbacks.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a single Job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "job_status", rename_all = "UPPERCASE")]
pub enum JobStatus {
    Prepared,
    Running,
    Aborting,
    Finished,
    Failed,
    Errored,
}

impl JobStatus {
    /// Terminal statuses never transition again and stamp `finished_at`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Errored)
    }
}

/// Lifecycle status of a Run. Fully derived from its Jobs; never set
/// independently once the run has been claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "run_status", rename_all = "UPPERCASE")]
pub enum RunStatus {
    Prepared,
    Scheduled,
    Running,
    Aborting,
    Finished,
    Failed,
    Errored,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Errored)
    }
}

/// Type of a job event reported by a station (or the dispatcher itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "job_event_type", rename_all = "UPPERCASE")]
pub enum JobEventType {
    Info,
    Warning,
    Error,
}

impl Default for JobEventType {
    fn default() -> Self {
        Self::Info
    }
}

/// Where artifact bytes live. Only inline Postgres storage is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "artifact_storage", rename_all = "UPPERCASE")]
pub enum ArtifactStorage {
    Postgres,
}

/// Reduce the statuses of all Jobs of a Run into the Run's status.
///
/// `job_statuses` must contain the status of every job of the run, with
/// the changed job's new status already substituted. Evaluated in fixed
/// precedence, first match wins:
///
/// 1. any RUNNING  -> RUNNING
/// 2. any ABORTING -> ABORTING
/// 3. all ERRORED  -> ERRORED
/// 4. all FINISHED -> FINISHED
/// 5. any FAILED   -> FAILED
/// 6. all terminal (mixed FINISHED/ERRORED) -> FAILED
/// 7. otherwise unchanged
///
/// Rule 6 closes the gap where a run with one FINISHED and one ERRORED
/// job would otherwise stay RUNNING forever: stations that disagree
/// terminally make the run FAILED as a whole.
///
/// The reduction recomputes from the full snapshot each time, so it is
/// idempotent and independent of the order in which individual job
/// status changes arrive.
pub fn next_run_status(current: RunStatus, job_statuses: &[JobStatus]) -> RunStatus {
    if job_statuses.is_empty() {
        return current;
    }
    if job_statuses.iter().any(|s| *s == JobStatus::Running) {
        return RunStatus::Running;
    }
    if job_statuses.iter().any(|s| *s == JobStatus::Aborting) {
        return RunStatus::Aborting;
    }
    if job_statuses.iter().all(|s| *s == JobStatus::Errored) {
        return RunStatus::Errored;
    }
    if job_statuses.iter().all(|s| *s == JobStatus::Finished) {
        return RunStatus::Finished;
    }
    if job_statuses.iter().any(|s| *s == JobStatus::Failed) {
        return RunStatus::Failed;
    }
    if job_statuses.iter().all(|s| s.is_terminal()) {
        return RunStatus::Failed;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use JobStatus::*;

    #[test]
    fn running_takes_precedence_over_everything() {
        let statuses = [Running, Errored, Finished, Failed, Aborting];
        assert_eq!(
            next_run_status(RunStatus::Prepared, &statuses),
            RunStatus::Running
        );
    }

    #[test]
    fn aborting_beats_terminal_statuses() {
        let statuses = [Aborting, Finished, Errored];
        assert_eq!(
            next_run_status(RunStatus::Running, &statuses),
            RunStatus::Aborting
        );
    }

    #[test]
    fn all_errored_reduces_to_errored() {
        assert_eq!(
            next_run_status(RunStatus::Running, &[Errored, Errored]),
            RunStatus::Errored
        );
    }

    #[test]
    fn all_finished_reduces_to_finished() {
        assert_eq!(
            next_run_status(RunStatus::Running, &[Finished, Finished]),
            RunStatus::Finished
        );
    }

    #[test]
    fn any_failed_reduces_to_failed() {
        assert_eq!(
            next_run_status(RunStatus::Running, &[Failed, Finished]),
            RunStatus::Failed
        );
        assert_eq!(
            next_run_status(RunStatus::Running, &[Failed, Prepared]),
            RunStatus::Failed
        );
    }

    #[test]
    fn mixed_terminal_without_failed_reduces_to_failed() {
        // One station finished, the other errored. Without the
        // mixed-terminal rule the run would stay RUNNING forever.
        assert_eq!(
            next_run_status(RunStatus::Running, &[Finished, Errored]),
            RunStatus::Failed
        );
    }

    #[test]
    fn pending_jobs_leave_status_unchanged() {
        assert_eq!(
            next_run_status(RunStatus::Running, &[Finished, Prepared]),
            RunStatus::Running
        );
    }

    #[test]
    fn empty_job_list_is_a_no_op() {
        assert_eq!(
            next_run_status(RunStatus::Prepared, &[]),
            RunStatus::Prepared
        );
    }

    #[test]
    fn reduction_is_idempotent() {
        let cases: [&[JobStatus]; 4] = [
            &[Running, Finished],
            &[Finished, Errored],
            &[Errored, Errored],
            &[Finished, Prepared],
        ];
        for statuses in cases {
            let once = next_run_status(RunStatus::Running, statuses);
            let twice = next_run_status(once, statuses);
            assert_eq!(once, twice, "reduction not idempotent for {statuses:?}");
        }
    }

    #[test]
    fn reduction_is_confluent_across_delivery_orders() {
        // Two jobs end in {Finished, Errored} regardless of which event
        // arrives first; both orders must converge on the same status.
        let via_first = {
            let mid = next_run_status(RunStatus::Running, &[Finished, Running]);
            next_run_status(mid, &[Finished, Errored])
        };
        let via_second = {
            let mid = next_run_status(RunStatus::Running, &[Running, Errored]);
            next_run_status(mid, &[Finished, Errored])
        };
        assert_eq!(via_first, via_second);
        assert_eq!(via_first, RunStatus::Failed);
    }
}
