mod job_artifact_repo;
mod job_event_repo;
mod job_repo;
mod plan_repo;
mod run_repo;

pub use job_artifact_repo::JobArtifactRepo;
pub use job_event_repo::JobEventRepo;
pub use job_repo::JobRepo;
pub use plan_repo::PlanRepo;
pub use run_repo::RunRepo;
