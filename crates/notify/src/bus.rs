//! In-process status update bus backed by a `tokio::sync::broadcast`
//! channel.
//!
//! [`UpdateBus`] is the hand-off point between write paths (event
//! ingestion, run creation, dispatch) and the long-poll side. It is
//! shared via `Arc<UpdateBus>` across the application.

use tokio::sync::broadcast;
use trainhub_db::models::job::JobDetail;
use trainhub_db::models::run::RunDetail;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// A fresh representation of the entities touched by one write.
///
/// `job` is set whenever a job event was ingested; `run` only when the
/// write also changed the run (a result status arrived, or the run
/// itself was created or renamed).
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub run: Option<RunDetail>,
    pub job: Option<JobDetail>,
}

impl StatusUpdate {
    pub fn for_run(run: RunDetail) -> Self {
        Self {
            run: Some(run),
            job: None,
        }
    }

    pub fn for_job(job: JobDetail) -> Self {
        Self {
            run: None,
            job: Some(job),
        }
    }
}

/// In-process fan-out bus for [`StatusUpdate`]s.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published update.
pub struct UpdateBus {
    sender: broadcast::Sender<StatusUpdate>,
}

impl UpdateBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are
    /// dropped and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an update to all current subscribers.
    ///
    /// If there are no active subscribers the update is silently
    /// dropped; long-poll readers then see the new state on their next
    /// database read.
    pub fn publish(&self, update: StatusUpdate) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(update);
    }

    /// Subscribe to all updates published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.sender.subscribe()
    }
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = UpdateBus::default();
        let mut rx = bus.subscribe();

        bus.publish(StatusUpdate {
            run: None,
            job: None,
        });

        let received = rx.recv().await.expect("should receive the update");
        assert!(received.run.is_none());
        assert!(received.job.is_none());
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_update() {
        let bus = UpdateBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(StatusUpdate {
            run: None,
            job: None,
        });

        rx1.recv().await.expect("subscriber 1 should receive");
        rx2.recv().await.expect("subscriber 2 should receive");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = UpdateBus::default();
        bus.publish(StatusUpdate {
            run: None,
            job: None,
        });
    }
}
