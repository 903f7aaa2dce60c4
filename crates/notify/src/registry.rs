//! Long-poll waiter registry.
//!
//! A [`PollRegistry`] tracks, per entity UUID, the set of readers that
//! asked to be woken once the entity moves past a version they already
//! know. Publishing a new version resolves exactly the waiters whose
//! known version is older; everyone else keeps waiting until their
//! deadline passes.
//!
//! Handlers use the register-then-recheck pattern: subscribe first,
//! re-read the entity, and only await the receiver when the re-read is
//! still not newer than the client's version. That closes the window in
//! which an update lands between the initial read and the subscription.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Number of lock shards; keeps publishes on unrelated entities from
/// contending on one mutex.
const SHARD_COUNT: usize = 16;

/// How often the background sweeper drops expired waiters.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

struct Waiter<T> {
    /// Version the reader already has; resolved only by newer ones.
    after: i64,
    deadline: Instant,
    slot: oneshot::Sender<T>,
}

/// Registry of pending long-poll waiters for one entity kind.
///
/// `T` is the representation delivered to resolved waiters, e.g. a run
/// or job detail.
pub struct PollRegistry<T> {
    shards: Vec<Mutex<HashMap<Uuid, Vec<Waiter<T>>>>>,
}

impl<T: Clone + Send + 'static> PollRegistry<T> {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, id: Uuid) -> &Mutex<HashMap<Uuid, Vec<Waiter<T>>>> {
        &self.shards[(id.as_u128() % SHARD_COUNT as u128) as usize]
    }

    /// Register a waiter for `id` holding version `after`. The returned
    /// receiver resolves when a strictly newer version is published, or
    /// never if `ttl` elapses first; the caller bounds the await with
    /// its own timeout.
    pub async fn subscribe(&self, id: Uuid, after: i64, ttl: Duration) -> oneshot::Receiver<T> {
        let (tx, rx) = oneshot::channel();
        let mut shard = self.shard(id).lock().await;
        let waiters = shard.entry(id).or_default();
        waiters.retain(|w| w.deadline > Instant::now() && !w.slot.is_closed());
        waiters.push(Waiter {
            after,
            deadline: Instant::now() + ttl,
            slot: tx,
        });
        rx
    }

    /// Deliver `value` at `version` to every waiter on `id` that knows
    /// an older version. Waiters at or past `version` stay registered.
    pub async fn publish(&self, id: Uuid, version: i64, value: &T) {
        let mut shard = self.shard(id).lock().await;
        let Some(waiters) = shard.get_mut(&id) else {
            return;
        };

        let mut kept = Vec::new();
        let mut resolved = 0usize;
        for waiter in waiters.drain(..) {
            if waiter.deadline <= Instant::now() || waiter.slot.is_closed() {
                continue;
            }
            if waiter.after < version {
                // A dropped receiver here is fine; the reader gave up.
                let _ = waiter.slot.send(value.clone());
                resolved += 1;
            } else {
                kept.push(waiter);
            }
        }

        let drained = kept.is_empty();
        *waiters = kept;
        if drained {
            shard.remove(&id);
        }

        if resolved > 0 {
            tracing::debug!(entity = %id, version, resolved, "Resolved long-poll waiters");
        }
    }

    /// Drop waiters whose deadline has passed or whose reader has gone
    /// away. Publish and subscribe prune opportunistically; this picks
    /// up entities that see no further traffic.
    pub async fn sweep(&self) {
        for shard in &self.shards {
            let mut shard = shard.lock().await;
            shard.retain(|_, waiters| {
                waiters.retain(|w| w.deadline > Instant::now() && !w.slot.is_closed());
                !waiters.is_empty()
            });
        }
    }

    /// Total number of registered waiters across all shards.
    pub async fn waiter_count(&self) -> usize {
        let mut count = 0;
        for shard in &self.shards {
            let shard = shard.lock().await;
            count += shard.values().map(Vec::len).sum::<usize>();
        }
        count
    }

    /// Run the periodic sweeper until the cancellation token fires.
    pub async fn run_sweeper(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Long-poll sweeper shutting down");
                    break;
                }
                _ = ticker.tick() => self.sweep().await,
            }
        }
    }
}

impl<T: Clone + Send + 'static> Default for PollRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
