//! Async client for communicating with the engine worker process.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, error, warn};

use super::error::{WorkerError, WorkerResult};
use super::protocol::{ErrorInfo, RequestEnvelope, ResponseEnvelope};

/// Default timeout for requests (30 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>>;

/// Async client for the engine worker.
///
/// The client spawns the worker as a child process and communicates via
/// NDJSON (newline-delimited JSON) over stdin/stdout. Each request has a
/// unique ID for correlation with responses.
///
/// # Example
///
/// ```ignore
/// use relbridge::worker::{WorkerClient, protocol::*};
///
/// let client = WorkerClient::spawn("./engine-worker", &[], Duration::from_secs(30)).await?;
///
/// let response: ListCatalogsResponse = client.request(
///     methods::LIST_CATALOGS,
///     ModelParams { ... }
/// ).await?;
/// ```
pub struct WorkerClient {
    /// Writer for sending requests to worker stdin.
    stdin: Arc<Mutex<BufWriter<ChildStdin>>>,

    /// Map of pending request IDs to response channels.
    pending: PendingMap,

    /// Handle to the worker child process.
    child: Mutex<Child>,

    /// Handle to the background reader task.
    reader_task: tokio::task::JoinHandle<()>,

    /// Request timeout duration.
    timeout: Duration,
}

impl WorkerClient {
    /// Spawn a worker process with arguments and a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker process cannot be spawned.
    pub async fn spawn<P: AsRef<Path>>(
        worker_path: P,
        args: &[String],
        timeout: Duration,
    ) -> WorkerResult<Self> {
        let mut child = Command::new(worker_path.as_ref())
            .args(args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(WorkerError::SpawnFailed)?;

        let stdin = child.stdin.take().ok_or_else(|| {
            WorkerError::SpawnFailed(std::io::Error::other("worker stdin not captured"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            WorkerError::SpawnFailed(std::io::Error::other("worker stdout not captured"))
        })?;

        let stdin = Arc::new(Mutex::new(BufWriter::new(stdin)));
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let reader_task = Self::spawn_reader_task(stdout, pending.clone());
        debug!(worker = %worker_path.as_ref().display(), "spawned worker");

        Ok(Self {
            stdin,
            pending,
            child: Mutex::new(child),
            reader_task,
            timeout,
        })
    }

    /// Spawn the background task that reads responses from the worker.
    fn spawn_reader_task(stdout: ChildStdout, pending: PendingMap) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => match serde_json::from_str::<ResponseEnvelope>(&line) {
                        Ok(resp) => {
                            let mut pending = pending.lock().await;
                            if let Some(tx) = pending.remove(&resp.id) {
                                let _ = tx.send(resp);
                            } else {
                                warn!(id = %resp.id, "response for unknown request");
                            }
                        }
                        Err(e) => warn!(error = %e, "failed to parse worker response"),
                    },
                    Err(e) => {
                        error!(error = %e, "worker read error");
                        break;
                    }
                }
            }

            // Worker exited: fail every request still waiting.
            let mut pending = pending.lock().await;
            for (id, tx) in pending.drain() {
                let _ = tx.send(ResponseEnvelope {
                    id,
                    success: false,
                    result: None,
                    error: Some(ErrorInfo {
                        code: "WORKER_EXITED".to_string(),
                        message: "Worker process exited unexpectedly".to_string(),
                    }),
                });
            }
        })
    }

    /// Send a request to the worker and wait for a response.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The worker has already exited
    /// - Serialization fails
    /// - Writing to the worker fails
    /// - The request times out
    /// - The worker returns an error response
    /// - Deserialization of the response fails
    pub async fn request<P, R>(&self, method: &str, params: P) -> WorkerResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        if !self.is_alive() {
            return Err(WorkerError::WorkerExited);
        }
        let id = uuid::Uuid::new_v4().to_string();

        let request = RequestEnvelope {
            id: id.clone(),
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(WorkerError::SerializeFailed)?,
        };

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id.clone(), tx);
        }

        if let Err(e) = self.send(&request).await {
            let mut pending = self.pending.lock().await;
            pending.remove(&id);
            return Err(e);
        }
        debug!(%method, %id, "sent worker request");

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                // Drop the pending entry so a late response is ignored.
                let mut pending = self.pending.lock().await;
                pending.remove(&id);
                return Err(WorkerError::Timeout(self.timeout.as_secs()));
            }
        };

        if response.success {
            let result = response.result.unwrap_or(serde_json::Value::Null);
            serde_json::from_value(result).map_err(WorkerError::DeserializeFailed)
        } else {
            let error = response.error.unwrap_or_else(|| ErrorInfo {
                code: "UNKNOWN".to_string(),
                message: "Unknown error".to_string(),
            });
            Err(Self::classify_error(&error.code, &error.message))
        }
    }

    /// Write one request line to the worker.
    async fn send(&self, request: &RequestEnvelope) -> WorkerResult<()> {
        let line = serde_json::to_string(request).map_err(WorkerError::SerializeFailed)? + "\n";
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(WorkerError::WriteFailed)?;
        stdin.flush().await.map_err(WorkerError::WriteFailed)
    }

    /// Classify a worker error into a more specific error type.
    fn classify_error(code: &str, message: &str) -> WorkerError {
        match code {
            "DRIVER_NOT_FOUND" => WorkerError::DriverNotFound(message.to_string()),
            "CONNECTION_FAILED" => WorkerError::ConnectionFailed(message.to_string()),
            "INVALID_REQUEST" => WorkerError::InvalidRequest(message.to_string()),
            "METHOD_NOT_FOUND" => WorkerError::MethodNotFound(message.to_string()),
            "NOT_SUPPORTED" => WorkerError::NotSupported(message.to_string()),
            "WORKER_EXITED" => WorkerError::WorkerExited,
            _ => WorkerError::remote(code, message),
        }
    }

    /// Returns `false` once the reader task has finished (worker exited).
    pub fn is_alive(&self) -> bool {
        !self.reader_task.is_finished()
    }

    /// Get the current request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Kill the worker process.
    pub async fn shutdown(&self) -> WorkerResult<()> {
        let mut child = self.child.lock().await;
        match child.kill().await {
            Ok(()) => Ok(()),
            // Already exited.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(WorkerError::WriteFailed(e)),
        }
    }
}

impl Drop for WorkerClient {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}
