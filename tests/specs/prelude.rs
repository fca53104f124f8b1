//! Shared harness for daemon scenarios.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use errand_core::{JobId, JobStatus};
use errand_daemon::engine::WorkerConfig;
use errand_daemon::{startup, Daemon, StartupResult};
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

pub use errand_daemon::Config;
pub use errand_wire::{ErrorKind, Request, Response, PROTOCOL_VERSION};
pub use serde_json::json;

/// Upper bound for a job to settle in these tests.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);
const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// A daemon running inside the test process.
pub struct TestDaemon {
    dir: TempDir,
    addr: SocketAddr,
    daemon: Daemon,
    listener: JoinHandle<()>,
}

/// Harness defaults: two workers polling quickly, ephemeral port.
pub fn spec_config(dir: &Path) -> Config {
    Config {
        url: "tcp://127.0.0.1:0".to_string(),
        worker: WorkerConfig {
            poll_interval: Duration::from_millis(20),
            ..WorkerConfig::default()
        },
        ..Config::for_dir(dir)
    }
}

impl TestDaemon {
    pub async fn start() -> Self {
        Self::start_with(|config| config).await
    }

    pub async fn start_with(adjust: impl FnOnce(Config) -> Config) -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self::start_in(dir, adjust).await
    }

    async fn start_in(dir: TempDir, adjust: impl FnOnce(Config) -> Config) -> Self {
        let config = adjust(spec_config(dir.path()));
        let StartupResult { daemon, listener } = startup(&config).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let listener = tokio::spawn(listener.run());
        Self { dir, addr, daemon, listener }
    }

    /// Stop gracefully, keeping the state directory.
    async fn stop_keep_dir(self) -> TempDir {
        self.listener.abort();
        let _ = self.listener.await;
        self.daemon.shutdown().await.unwrap();
        self.dir
    }

    pub async fn stop(self) {
        self.stop_keep_dir().await;
    }

    /// Stop and start again on the same state directory.
    pub async fn restart_with(self, adjust: impl FnOnce(Config) -> Config) -> Self {
        let dir = self.stop_keep_dir().await;
        Self::start_in(dir, adjust).await
    }

    pub fn shutdown_requested(&self) -> std::sync::Arc<tokio::sync::Notify> {
        self.daemon.shutdown_requested()
    }

    pub async fn send(&self, request: Request) -> Response {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        let (mut reader, mut writer) = stream.split();
        errand_wire::write_request(&mut writer, &request, IO_TIMEOUT).await.unwrap();
        errand_wire::read_response(&mut reader, IO_TIMEOUT).await.unwrap()
    }

    pub async fn submit(&self, handler: &str, payload: serde_json::Value) -> Response {
        self.send(Request::Submit { handler: handler.to_string(), payload }).await
    }

    /// Submit `first_n_primes` and return the job id, failing on rejection.
    pub async fn submit_primes(&self, n: u64) -> JobId {
        match self.submit("first_n_primes", json!(n)).await {
            Response::Submitted { job_id } => job_id,
            other => panic!("expected Submitted, got {:?}", other),
        }
    }

    pub async fn get_result(&self, job_id: &JobId) -> Response {
        self.send(Request::GetResult { job_id: job_id.clone() }).await
    }

    /// Poll until the job reaches a final status.
    pub async fn wait_settled(&self, job_id: &JobId) -> Response {
        let deadline = tokio::time::Instant::now() + SETTLE_TIMEOUT;
        loop {
            let response = self.get_result(job_id).await;
            if let Response::JobResult { status, .. } = &response {
                if status.is_final() {
                    return response;
                }
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "job {} did not settle: {:?}",
                job_id,
                response
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

/// Status carried by a `JobResult` response.
pub fn status_of(response: &Response) -> JobStatus {
    match response {
        Response::JobResult { status, .. } => *status,
        other => panic!("expected JobResult, got {:?}", other),
    }
}
