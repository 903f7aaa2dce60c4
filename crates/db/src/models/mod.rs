pub mod job;
pub mod job_artifact;
pub mod job_event;
pub mod plan;
pub mod run;
