//! The JSON body POSTed to a station when a job is dispatched.

use serde::Serialize;
use trainhub_db::models::job::DispatchJob;
use uuid::Uuid;

/// Path template for the event callback, relative to the callback root.
const EVENT_CALLBACK_PATH: &str = "/runs/{runUuid}/jobs/{jobUuid}/events";

/// Path template for the artifact callback, relative to the callback
/// root.
const ARTIFACT_CALLBACK_PATH: &str = "/runs/{runUuid}/jobs/{jobUuid}/artifacts";

/// Everything a station needs to execute a job and report back: the
/// train to fetch, the shared secret to authenticate callbacks with,
/// and the absolute callback URLs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPayload {
    pub job_uuid: Uuid,
    pub secret: String,
    pub train_uri: String,
    pub callback_event_location: String,
    pub callback_artifact_location: String,
}

impl DispatchPayload {
    /// Build the payload for one job. `callback_root` is the public
    /// base URL of this coordinator, with or without a trailing slash.
    pub fn new(job: &DispatchJob, callback_root: &str) -> Self {
        Self {
            job_uuid: job.uuid,
            secret: job.secret.clone(),
            train_uri: job.train_uri.clone(),
            callback_event_location: callback_location(EVENT_CALLBACK_PATH, job, callback_root),
            callback_artifact_location: callback_location(
                ARTIFACT_CALLBACK_PATH,
                job,
                callback_root,
            ),
        }
    }
}

fn callback_location(template: &str, job: &DispatchJob, callback_root: &str) -> String {
    let path = template
        .replace("{runUuid}", &job.run_uuid.to_string())
        .replace("{jobUuid}", &job.uuid.to_string());
    format!("{}{}", callback_root.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trainhub_core::status::JobStatus;

    fn job() -> DispatchJob {
        DispatchJob {
            uuid: Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap(),
            run_uuid: Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap(),
            secret: "s3cret".into(),
            status: JobStatus::Prepared,
            station_uri: "https://station.example/api/runs".into(),
            train_uri: "https://trains.example/train/42".into(),
        }
    }

    #[test]
    fn callback_locations_substitute_both_uuids() {
        let payload = DispatchPayload::new(&job(), "https://hub.example");
        assert_eq!(
            payload.callback_event_location,
            "https://hub.example/runs/22222222-2222-2222-2222-222222222222\
             /jobs/11111111-1111-1111-1111-111111111111/events"
        );
        assert_eq!(
            payload.callback_artifact_location,
            "https://hub.example/runs/22222222-2222-2222-2222-222222222222\
             /jobs/11111111-1111-1111-1111-111111111111/artifacts"
        );
    }

    #[test]
    fn trailing_slash_on_root_is_collapsed() {
        let payload = DispatchPayload::new(&job(), "https://hub.example/");
        assert!(payload
            .callback_event_location
            .starts_with("https://hub.example/runs/"));
    }

    #[test]
    fn payload_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(DispatchPayload::new(&job(), "https://hub.example"))
            .expect("payload should serialize");
        assert_eq!(value["jobUuid"], "11111111-1111-1111-1111-111111111111");
        assert_eq!(value["secret"], "s3cret");
        assert_eq!(value["trainUri"], "https://trains.example/train/42");
        assert!(value["callbackEventLocation"].is_string());
        assert!(value["callbackArtifactLocation"].is_string());
    }
}
