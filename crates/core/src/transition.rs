//! Pure decision logic for station callbacks.
//!
//! Event ingestion in `trainhub-api` is a thin transactional shell
//! around these functions: authorize the caller, then work out which
//! status and timestamp fields change. Keeping the decisions here makes
//! the secret/remote-ID rules and the finished-at stamping testable
//! without a database.

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::status::{next_run_status, JobStatus, RunStatus};

/// Validate the callback credentials against the stored job.
///
/// The secret must always match. The remote ID is bound
/// first-caller-wins: while the job has none, the callback's remote ID
/// (if any) becomes the job's; once bound, every later callback must
/// present exactly the same value.
///
/// Returns the remote ID to persist on the job, or `None` when nothing
/// needs to be written.
pub fn authorize_callback(
    job_secret: &str,
    job_remote_id: Option<&str>,
    secret: &str,
    remote_id: Option<&str>,
) -> Result<Option<String>, DomainError> {
    if job_secret != secret {
        return Err(DomainError::SecurityViolation(
            "Incorrect secret for job callback".into(),
        ));
    }
    match job_remote_id {
        None => Ok(remote_id.map(str::to_owned)),
        Some(bound) if Some(bound) == remote_id => Ok(None),
        Some(_) => Err(DomainError::SecurityViolation(
            "Incorrect remote ID for job callback".into(),
        )),
    }
}

/// The field changes produced by an event carrying a `resultStatus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub job_status: JobStatus,
    /// New `finished_at` for the job, if it is being stamped now.
    pub job_finished_at: Option<DateTime<Utc>>,
    pub run_status: RunStatus,
    /// New `finished_at` for the run, if it is being stamped now.
    pub run_finished_at: Option<DateTime<Utc>>,
}

/// Evaluate the effect of a result status reported for one job.
///
/// `sibling_statuses` must hold the statuses of all jobs of the run with
/// `result_status` already substituted for the reported job.
///
/// `finished_at` is stamped at most once per entity, with the event's
/// `occurred_at` rather than ingestion time, so the finish time stays
/// plausible when a station delivers its terminal event late.
pub fn evaluate_result_status(
    result_status: JobStatus,
    occurred_at: DateTime<Utc>,
    job_finished_at: Option<DateTime<Utc>>,
    run_status: RunStatus,
    run_finished_at: Option<DateTime<Utc>>,
    sibling_statuses: &[JobStatus],
) -> StatusChange {
    let job_stamp = match job_finished_at {
        None if result_status.is_terminal() => Some(occurred_at),
        _ => None,
    };
    let next_run = next_run_status(run_status, sibling_statuses);
    let run_stamp = match run_finished_at {
        None if next_run.is_terminal() => Some(occurred_at),
        _ => None,
    };
    StatusChange {
        job_status: result_status,
        job_finished_at: job_stamp,
        run_status: next_run,
        run_finished_at: run_stamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn wrong_secret_is_rejected_regardless_of_remote_id() {
        let err = authorize_callback("s3cret", Some("station-1"), "wrong", Some("station-1"));
        assert_matches!(err, Err(DomainError::SecurityViolation(_)));

        let err = authorize_callback("s3cret", None, "wrong", None);
        assert_matches!(err, Err(DomainError::SecurityViolation(_)));
    }

    #[test]
    fn first_callback_binds_remote_id() {
        let bind = authorize_callback("s3cret", None, "s3cret", Some("station-1")).unwrap();
        assert_eq!(bind.as_deref(), Some("station-1"));
    }

    #[test]
    fn callback_without_remote_id_leaves_binding_open() {
        let bind = authorize_callback("s3cret", None, "s3cret", None).unwrap();
        assert_eq!(bind, None);
    }

    #[test]
    fn bound_remote_id_must_match_exactly() {
        let ok = authorize_callback("s3cret", Some("station-1"), "s3cret", Some("station-1"));
        assert_matches!(ok, Ok(None));

        let err = authorize_callback("s3cret", Some("station-1"), "s3cret", Some("station-2"));
        assert_matches!(err, Err(DomainError::SecurityViolation(_)));

        // Omitting the remote ID after it has been bound is a mismatch too.
        let err = authorize_callback("s3cret", Some("station-1"), "s3cret", None);
        assert_matches!(err, Err(DomainError::SecurityViolation(_)));
    }

    #[test]
    fn terminal_result_stamps_job_finished_at_from_occurred_at() {
        let change = evaluate_result_status(
            JobStatus::Finished,
            ts(100),
            None,
            RunStatus::Running,
            None,
            &[JobStatus::Finished, JobStatus::Running],
        );
        assert_eq!(change.job_status, JobStatus::Finished);
        assert_eq!(change.job_finished_at, Some(ts(100)));
        // Sibling still running, so the run stays open.
        assert_eq!(change.run_status, RunStatus::Running);
        assert_eq!(change.run_finished_at, None);
    }

    #[test]
    fn finished_at_is_stamped_only_once() {
        let change = evaluate_result_status(
            JobStatus::Errored,
            ts(200),
            Some(ts(100)),
            RunStatus::Failed,
            Some(ts(100)),
            &[JobStatus::Errored],
        );
        // Already stamped at t=100; the later event must not restamp.
        assert_eq!(change.job_finished_at, None);
        assert_eq!(change.run_finished_at, None);
    }

    #[test]
    fn run_finished_at_uses_the_closing_events_occurred_at() {
        let change = evaluate_result_status(
            JobStatus::Errored,
            ts(300),
            None,
            RunStatus::Running,
            None,
            &[JobStatus::Finished, JobStatus::Errored],
        );
        assert_eq!(change.run_status, RunStatus::Failed);
        assert_eq!(change.run_finished_at, Some(ts(300)));
    }

    #[test]
    fn non_terminal_result_stamps_nothing() {
        let change = evaluate_result_status(
            JobStatus::Running,
            ts(50),
            None,
            RunStatus::Prepared,
            None,
            &[JobStatus::Running, JobStatus::Prepared],
        );
        assert_eq!(change.job_finished_at, None);
        assert_eq!(change.run_status, RunStatus::Running);
        assert_eq!(change.run_finished_at, None);
    }
}
