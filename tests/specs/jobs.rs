//! Job submission and result scenarios
//!
//! Verify the submit → execute → poll flow for `first_n_primes`.

use crate::prelude::*;
use errand_core::{JobId, JobStatus};
use similar_asserts::assert_eq;

#[tokio::test]
async fn first_five_primes() {
    let daemon = TestDaemon::start().await;

    let job_id = daemon.submit_primes(5).await;
    let settled = daemon.wait_settled(&job_id).await;

    assert_eq!(
        settled,
        Response::JobResult {
            job_id,
            status: JobStatus::Success,
            result: Some(json!([2, 3, 5, 7, 11])),
            error: None,
        }
    );
    daemon.stop().await;
}

#[tokio::test]
async fn first_prime_only() {
    let daemon = TestDaemon::start().await;

    let job_id = daemon.submit_primes(1).await;
    let settled = daemon.wait_settled(&job_id).await;

    let Response::JobResult { status, result, .. } = settled else { unreachable!() };
    assert_eq!(status, JobStatus::Success);
    assert_eq!(result, Some(json!([2])));
    daemon.stop().await;
}

#[tokio::test]
async fn largest_allowed_input_ends_at_104729() {
    let daemon = TestDaemon::start().await;

    let job_id = daemon.submit_primes(10_000).await;
    let settled = daemon.wait_settled(&job_id).await;

    let Response::JobResult { result: Some(result), .. } = settled else {
        panic!("expected a result: {:?}", settled)
    };
    let primes = result.as_array().unwrap();
    assert_eq!(primes.len(), 10_000);
    assert_eq!(primes.last(), Some(&json!(104_729)));
    daemon.stop().await;
}

#[tokio::test]
async fn invalid_payloads_never_get_a_job_id() {
    let daemon = TestDaemon::start().await;

    let cases = [
        ("first_n_primes", json!(0)),
        ("first_n_primes", json!(10_001)),
        ("first_n_primes", json!(-3)),
        ("first_n_primes", json!("five")),
        ("no_such_handler", json!(5)),
    ];
    for (handler, payload) in cases {
        let response = daemon.submit(handler, payload.clone()).await;
        let Response::Error { kind, .. } = response else {
            panic!("{handler} {payload} should be rejected, got {:?}", response)
        };
        assert_eq!(kind, ErrorKind::Validation, "{handler} {payload}");
    }

    let Response::Status { queued, records, .. } = daemon.send(Request::Status).await else {
        panic!("expected Status")
    };
    assert_eq!((queued, records), (0, 0));
    daemon.stop().await;
}

#[tokio::test]
async fn unknown_id_reads_as_pending() {
    let daemon = TestDaemon::start().await;

    let response = daemon.get_result(&JobId::from_string("never-submitted")).await;

    assert_eq!(
        response,
        Response::JobResult {
            job_id: JobId::from_string("never-submitted"),
            status: JobStatus::Pending,
            result: None,
            error: None,
        }
    );
    daemon.stop().await;
}

#[tokio::test]
async fn settled_result_reads_the_same_every_time() {
    let daemon = TestDaemon::start().await;
    let job_id = daemon.submit_primes(3).await;

    let first = daemon.wait_settled(&job_id).await;
    for _ in 0..3 {
        assert_eq!(daemon.get_result(&job_id).await, first);
    }
    daemon.stop().await;
}

#[tokio::test]
async fn many_jobs_all_settle() {
    let daemon = TestDaemon::start_with(|config| Config { workers: 3, ..config }).await;

    let mut jobs = Vec::new();
    for n in 1..=20 {
        jobs.push((n, daemon.submit_primes(n).await));
    }
    for (n, job_id) in jobs {
        let settled = daemon.wait_settled(&job_id).await;
        let Response::JobResult { status, result: Some(result), .. } = settled else {
            panic!("job for n={n} has no result")
        };
        assert_eq!(status, JobStatus::Success);
        assert_eq!(result.as_array().map(Vec::len), Some(n as usize));
    }
    daemon.stop().await;
}

#[tokio::test]
async fn revoke_cancels_a_job_no_worker_has_started() {
    let daemon = TestDaemon::start_with(|config| Config { workers: 0, ..config }).await;
    let job_id = daemon.submit_primes(5).await;

    let response = daemon.send(Request::Revoke { job_id: job_id.clone() }).await;
    assert_eq!(
        response,
        Response::Revoked { job_id: job_id.clone(), revoked: true, status: JobStatus::Revoked }
    );
    assert_eq!(status_of(&daemon.get_result(&job_id).await), JobStatus::Revoked);

    let again = daemon.send(Request::Revoke { job_id: job_id.clone() }).await;
    assert_eq!(again, Response::Revoked { job_id, revoked: false, status: JobStatus::Revoked });
    daemon.stop().await;
}

#[tokio::test]
async fn settled_job_cannot_be_revoked() {
    let daemon = TestDaemon::start().await;
    let job_id = daemon.submit_primes(2).await;
    daemon.wait_settled(&job_id).await;

    let response = daemon.send(Request::Revoke { job_id: job_id.clone() }).await;

    assert_eq!(response, Response::Revoked { job_id, revoked: false, status: JobStatus::Success });
    daemon.stop().await;
}

#[tokio::test]
async fn queued_job_survives_restart() {
    let daemon = TestDaemon::start_with(|config| Config { workers: 0, ..config }).await;
    let job_id = daemon.submit_primes(4).await;
    assert_eq!(status_of(&daemon.get_result(&job_id).await), JobStatus::Pending);

    let daemon = daemon.restart_with(|config| config).await;
    let settled = daemon.wait_settled(&job_id).await;

    let Response::JobResult { status, result, .. } = settled else { unreachable!() };
    assert_eq!(status, JobStatus::Success);
    assert_eq!(result, Some(json!([2, 3, 5, 7])));
    daemon.stop().await;
}
