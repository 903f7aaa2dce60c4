//! Tests for the long-poll waiter registry.

use std::time::Duration;

use tokio::time::timeout;
use trainhub_notify::PollRegistry;
use uuid::Uuid;

const TTL: Duration = Duration::from_secs(5);

#[tokio::test]
async fn publish_resolves_waiter_with_older_version() {
    let registry = PollRegistry::<String>::new();
    let id = Uuid::new_v4();

    let rx = registry.subscribe(id, 3, TTL).await;
    registry.publish(id, 4, &"v4".to_string()).await;

    let value = timeout(Duration::from_secs(1), rx)
        .await
        .expect("waiter should resolve")
        .expect("sender should deliver");
    assert_eq!(value, "v4");
    assert_eq!(registry.waiter_count().await, 0);
}

#[tokio::test]
async fn publish_keeps_waiter_at_same_version() {
    let registry = PollRegistry::<String>::new();
    let id = Uuid::new_v4();

    // The reader already holds version 4; a re-publish of version 4
    // must not wake it with stale state.
    let rx = registry.subscribe(id, 4, TTL).await;
    registry.publish(id, 4, &"v4".to_string()).await;

    assert!(timeout(Duration::from_millis(50), rx).await.is_err());
    assert_eq!(registry.waiter_count().await, 1);
}

#[tokio::test]
async fn retained_waiter_resolves_on_later_publish() {
    let registry = PollRegistry::<String>::new();
    let id = Uuid::new_v4();

    let rx = registry.subscribe(id, 4, TTL).await;
    registry.publish(id, 4, &"v4".to_string()).await;
    registry.publish(id, 5, &"v5".to_string()).await;

    let value = timeout(Duration::from_secs(1), rx)
        .await
        .expect("waiter should resolve")
        .expect("sender should deliver");
    assert_eq!(value, "v5");
}

#[tokio::test]
async fn one_publish_resolves_all_older_waiters() {
    let registry = PollRegistry::<String>::new();
    let id = Uuid::new_v4();

    let rx1 = registry.subscribe(id, 0, TTL).await;
    let rx2 = registry.subscribe(id, 2, TTL).await;
    registry.publish(id, 3, &"v3".to_string()).await;

    assert_eq!(rx1.await.expect("first waiter"), "v3");
    assert_eq!(rx2.await.expect("second waiter"), "v3");
}

#[tokio::test]
async fn waiters_on_other_entities_are_untouched() {
    let registry = PollRegistry::<String>::new();
    let watched = Uuid::new_v4();
    let other = Uuid::new_v4();

    let rx = registry.subscribe(other, 0, TTL).await;
    registry.publish(watched, 10, &"v10".to_string()).await;

    assert!(timeout(Duration::from_millis(50), rx).await.is_err());
    assert_eq!(registry.waiter_count().await, 1);
}

#[tokio::test]
async fn sweep_drops_expired_waiters() {
    let registry = PollRegistry::<String>::new();
    let id = Uuid::new_v4();

    let _rx = registry.subscribe(id, 0, Duration::ZERO).await;
    assert_eq!(registry.waiter_count().await, 1);

    registry.sweep().await;
    assert_eq!(registry.waiter_count().await, 0);
}

#[tokio::test]
async fn publish_prunes_dropped_receivers() {
    let registry = PollRegistry::<String>::new();
    let id = Uuid::new_v4();

    let rx = registry.subscribe(id, 4, TTL).await;
    drop(rx);

    // Version 4 does not satisfy the waiter, but the reader is gone, so
    // the publish discards it instead of retaining it.
    registry.publish(id, 4, &"v4".to_string()).await;
    assert_eq!(registry.waiter_count().await, 0);
}
