//! HTTP client that hands claimed jobs to their stations.

use std::time::Duration;

use reqwest::StatusCode;
use trainhub_core::status::JobStatus;
use trainhub_db::models::job::DispatchJob;

use crate::payload::DispatchPayload;

/// Error type for a failed dispatch attempt.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The job snapshot was not in the dispatchable state. Checked
    /// before any I/O happens.
    #[error("Job is {0:?}, only PREPARED jobs can be dispatched")]
    NotPrepared(JobStatus),

    /// The underlying HTTP request failed (connect, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The station answered, but not with 202 ACCEPTED.
    #[error("Station returned HTTP {0}, expected 202")]
    Rejected(u16),
}

/// Client for the outbound side of the station protocol.
///
/// One instance is shared by the dispatcher; stations are identified
/// per call by the `station_uri` on the job snapshot.
pub struct StationClient {
    client: reqwest::Client,
    callback_root: String,
}

impl StationClient {
    /// Create a client. `callback_root` is the public base URL stations
    /// use to reach this coordinator; `timeout` bounds each outbound
    /// request.
    pub fn new(callback_root: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            callback_root,
        }
    }

    /// POST one job to its station.
    ///
    /// The snapshot must still be PREPARED; anything else means the job
    /// moved (or already failed) since the claim and must not be
    /// re-announced. Acceptance is exactly HTTP 202.
    pub async fn dispatch(&self, job: &DispatchJob) -> Result<(), DispatchError> {
        if job.status != JobStatus::Prepared {
            return Err(DispatchError::NotPrepared(job.status));
        }

        let payload = DispatchPayload::new(job, &self.callback_root);
        let response = self
            .client
            .post(&job.station_uri)
            .json(&payload)
            .send()
            .await?;

        if response.status() != StatusCode::ACCEPTED {
            return Err(DispatchError::Rejected(response.status().as_u16()));
        }

        tracing::debug!(
            job_uuid = %job.uuid,
            station_uri = %job.station_uri,
            "Station accepted job",
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use uuid::Uuid;

    fn job(status: JobStatus) -> DispatchJob {
        DispatchJob {
            uuid: Uuid::new_v4(),
            run_uuid: Uuid::new_v4(),
            secret: "s3cret".into(),
            status,
            station_uri: "http://127.0.0.1:1/api/runs".into(),
            train_uri: "https://trains.example/train/42".into(),
        }
    }

    #[tokio::test]
    async fn dispatch_refuses_non_prepared_snapshot() {
        let client = StationClient::new("https://hub.example".into(), Duration::from_secs(1));
        let result = client.dispatch(&job(JobStatus::Running)).await;
        assert_matches!(result, Err(DispatchError::NotPrepared(JobStatus::Running)));
    }

    #[tokio::test]
    async fn dispatch_surfaces_connection_failures() {
        // Port 1 on loopback refuses connections.
        let client = StationClient::new("https://hub.example".into(), Duration::from_secs(1));
        let result = client.dispatch(&job(JobStatus::Prepared)).await;
        assert_matches!(result, Err(DispatchError::Request(_)));
    }

    #[test]
    fn rejected_error_names_the_status() {
        let err = DispatchError::Rejected(503);
        assert_eq!(err.to_string(), "Station returned HTTP 503, expected 202");
    }
}
