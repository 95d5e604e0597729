use std::sync::Arc;
use std::time::{Duration, Instant};

use gimps_lite::broker::{Task, TaskBroker, TaskId};
use gimps_lite::sweeper::Sweeper;
use serde_json::json;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

fn task(id: u64) -> Task {
    Task::new(TaskId::new(id), json!({ "exponent": id }))
}

/// An expired lease is back on the ready queue after a sweep or two.
#[tokio::test]
async fn test_sweeper_reclaims_expired_lease() {
    let broker = Arc::new(RwLock::new(TaskBroker::new(Duration::from_millis(50))));
    {
        let mut b = broker.write().await;
        b.enqueue(task(1));
        b.dequeue(Instant::now());
    }

    let sweeper = Sweeper::new(Duration::from_millis(20));
    let token = CancellationToken::new();
    let handle = tokio::spawn({
        let broker = broker.clone();
        let token = token.clone();
        async move { sweeper.run(broker, token).await }
    });

    // Wait out the lease plus a few sweep ticks
    tokio::time::sleep(Duration::from_millis(150)).await;

    {
        let b = broker.read().await;
        assert_eq!(b.status().ready, 1, "Expired lease should be reclaimed");
        assert_eq!(b.status().leased, 0);
        assert!(b.ready().contains(TaskId::new(1)));
    }

    token.cancel();
    handle.await.unwrap();
}

/// Leases that have not expired are left alone.
#[tokio::test]
async fn test_sweeper_leaves_live_leases() {
    let broker = Arc::new(RwLock::new(TaskBroker::new(Duration::from_secs(60))));
    {
        let mut b = broker.write().await;
        b.enqueue(task(1));
        b.dequeue(Instant::now());
    }

    let sweeper = Sweeper::new(Duration::from_millis(10));
    let token = CancellationToken::new();
    let handle = tokio::spawn({
        let broker = broker.clone();
        let token = token.clone();
        async move { sweeper.run(broker, token).await }
    });

    // Plenty of sweep ticks, none of which should touch the lease
    tokio::time::sleep(Duration::from_millis(100)).await;

    {
        let b = broker.read().await;
        assert_eq!(b.status().leased, 1, "Live lease must not be reclaimed");
        assert_eq!(b.status().ready, 0);
    }

    token.cancel();
    handle.await.unwrap();
}

/// The sweep loop exits promptly once the token fires.
#[tokio::test]
async fn test_sweeper_stops_on_cancellation() {
    let broker = Arc::new(RwLock::new(TaskBroker::new(Duration::from_secs(60))));
    let sweeper = Sweeper::new(Duration::from_millis(10));
    let token = CancellationToken::new();
    let handle = tokio::spawn({
        let broker = broker.clone();
        let token = token.clone();
        async move { sweeper.run(broker, token).await }
    });

    token.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("Sweeper should stop after cancellation")
        .unwrap();
}

/// A task reclaimed by the sweeper can be leased again and completed.
#[tokio::test]
async fn test_sweeper_recovery_allows_redelivery() {
    let broker = Arc::new(RwLock::new(TaskBroker::new(Duration::from_millis(30))));
    let first_lease = {
        let mut b = broker.write().await;
        b.enqueue(task(7));
        b.dequeue(Instant::now()).unwrap()
    };

    let sweeper = Sweeper::new(Duration::from_millis(10));
    let token = CancellationToken::new();
    let handle = tokio::spawn({
        let broker = broker.clone();
        let token = token.clone();
        async move { sweeper.run(broker, token).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    {
        let mut b = broker.write().await;
        let again = b.dequeue(Instant::now()).expect("reclaimed task should be ready");
        assert_eq!(again.id, first_lease.id);
        assert!(b.acknowledge(again.id));
        assert!(b.is_drained());
    }

    token.cancel();
    handle.await.unwrap();
}
