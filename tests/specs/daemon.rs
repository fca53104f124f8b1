//! Daemon protocol scenarios
//!
//! Verify the handshake, status and shutdown requests.

use crate::prelude::*;

#[tokio::test]
async fn ping_and_hello() {
    let daemon = TestDaemon::start().await;

    assert_eq!(daemon.send(Request::Ping).await, Response::Pong);
    assert_eq!(
        daemon.send(Request::Hello { version: PROTOCOL_VERSION.to_string() }).await,
        Response::Hello { version: PROTOCOL_VERSION.to_string() }
    );
    daemon.stop().await;
}

#[tokio::test]
async fn status_counts_queued_jobs_and_records() {
    let daemon = TestDaemon::start_with(|config| Config { workers: 0, ..config }).await;
    daemon.submit_primes(5).await;
    daemon.submit_primes(6).await;

    let Response::Status { workers, queued, records, .. } = daemon.send(Request::Status).await
    else {
        panic!("expected Status")
    };

    assert_eq!((workers, queued, records), (0, 2, 2));
    daemon.stop().await;
}

#[tokio::test]
async fn shutdown_request_notifies_the_daemon() {
    let daemon = TestDaemon::start().await;
    let notified = daemon.shutdown_requested();

    assert_eq!(daemon.send(Request::Shutdown).await, Response::ShuttingDown);

    tokio::time::timeout(std::time::Duration::from_secs(1), notified.notified())
        .await
        .expect("shutdown notification");
    daemon.stop().await;
}
