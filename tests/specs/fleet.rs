//! Fleet health scenarios
//!
//! Verify the `WorkerStatus` view of workers and queues.

use crate::prelude::*;
use errand_core::QueueCounts;

#[tokio::test]
async fn responsive_workers_make_a_healthy_fleet() {
    let daemon = TestDaemon::start().await;

    let Response::WorkerStatus { healthy, workers, queue_status, .. } =
        daemon.send(Request::WorkerStatus).await
    else {
        panic!("expected WorkerStatus")
    };

    assert!(healthy);
    assert_eq!(workers.keys().collect::<Vec<_>>(), ["worker-1", "worker-2"]);
    assert!(workers.values().all(|reply| reply == "pong"));
    assert_eq!(queue_status, QueueCounts::default());
    daemon.stop().await;
}

#[tokio::test]
async fn no_workers_is_unhealthy_with_zero_counts() {
    let daemon = TestDaemon::start_with(|config| Config { workers: 0, ..config }).await;
    daemon.submit_primes(5).await;

    let response = daemon.send(Request::WorkerStatus).await;

    assert_eq!(
        response,
        Response::WorkerStatus {
            healthy: false,
            workers: Default::default(),
            queue_status: QueueCounts::default(),
            active_tasks: Default::default(),
        }
    );
    daemon.stop().await;
}
