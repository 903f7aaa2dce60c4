//! Bridge between the status update bus and the long-poll registries.
//!
//! A single task consumes every [`StatusUpdate`] published after a
//! write commits and resolves the waiters registered for the touched
//! entities.

use std::sync::Arc;

use tokio::sync::broadcast;
use trainhub_db::models::job::JobDetail;
use trainhub_db::models::run::RunDetail;
use trainhub_notify::{PollRegistry, StatusUpdate};

pub struct NotificationBridge {
    run_registry: Arc<PollRegistry<RunDetail>>,
    job_registry: Arc<PollRegistry<JobDetail>>,
}

impl NotificationBridge {
    pub fn new(
        run_registry: Arc<PollRegistry<RunDetail>>,
        job_registry: Arc<PollRegistry<JobDetail>>,
    ) -> Self {
        Self {
            run_registry,
            job_registry,
        }
    }

    /// Run the bridge loop. Exits when the bus sender is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<StatusUpdate>) {
        loop {
            match receiver.recv().await {
                Ok(update) => {
                    if let Some(job) = update.job {
                        self.job_registry
                            .publish(job.summary.uuid, job.summary.version, &job)
                            .await;
                    }
                    if let Some(run) = update.run {
                        self.run_registry.publish(run.uuid, run.version, &run).await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Skipped updates only delay pollers until their
                    // timeout re-read; nothing is lost.
                    tracing::warn!(skipped = n, "Notification bridge lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Update bus closed, notification bridge shutting down");
                    break;
                }
            }
        }
    }
}
