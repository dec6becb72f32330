//! Client for the Node Playwright driver process
//!
//! Spawns `node` on the embedded driver script and exchanges
//! Content-Length framed JSON over its stdin/stdout.
//!
//! Writing and reading run in their own tasks. Each request registers a
//! oneshot channel under its `seq` and the reader routes responses back by
//! `seq`, so a caller that stops waiting (a timeout guard firing) leaves the
//! stream intact for the requests after it.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncWrite, BufReader, BufWriter};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::common::{Error, Result};
use crate::engine::SessionError;

use super::codec;
use super::protocol::{BridgeRequest, BridgeResponse, Operation};

/// Driver script run by `node`
const DRIVER_SOURCE: &str = include_str!("driver.js");

/// How long `shutdown` waits for the browser to close before killing
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

type Reply = std::result::Result<BridgeResponse, SessionError>;

/// Requests waiting for their response
#[derive(Default)]
struct Pending {
    waiting: HashMap<u64, oneshot::Sender<Reply>>,
    /// Set once the driver stream is gone; later requests fail with it
    closed: Option<SessionError>,
}

impl Pending {
    fn close(&mut self, error: SessionError) {
        for (_, tx) in self.waiting.drain() {
            let _ = tx.send(Err(error.clone()));
        }
        self.closed.get_or_insert(error);
    }
}

pub struct BridgeClient {
    /// Driver subprocess; absent when connected to plain streams
    driver: Option<Child>,
    outgoing: mpsc::UnboundedSender<String>,
    pending: Arc<Mutex<Pending>>,
    seq: u64,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
    /// Holds the driver script; removed on drop
    _script_dir: Option<TempDir>,
}

impl BridgeClient {
    /// Start a driver process
    ///
    /// `node_modules` is exported as `NODE_PATH` so the driver can
    /// `require('playwright')`.
    pub async fn spawn(node: &Path, node_modules: &Path) -> Result<Self> {
        let script_dir = tempfile::Builder::new()
            .prefix("stepwright-driver-")
            .tempdir()?;
        let script = script_dir.path().join("driver.js");
        std::fs::write(&script, DRIVER_SOURCE).map_err(|e| Error::file_write(&script, e))?;

        let mut cmd = Command::new(node);
        cmd.arg(&script)
            .env("NODE_PATH", node_modules)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut driver = cmd.spawn().map_err(|e| {
            Error::LaunchFailed(format!("Failed to start {}: {}", node.display(), e))
        })?;

        let stdin = driver
            .stdin
            .take()
            .ok_or_else(|| Error::LaunchFailed("Failed to get driver stdin".to_string()))?;
        let stdout = driver
            .stdout
            .take()
            .ok_or_else(|| Error::LaunchFailed("Failed to get driver stdout".to_string()))?;

        tracing::debug!(pid = ?driver.id(), "Driver started");

        let mut client = Self::connect(stdout, stdin);
        client.driver = Some(driver);
        client._script_dir = Some(script_dir);
        Ok(client)
    }

    /// Talk to a driver over an existing pair of streams
    pub(super) fn connect<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending = Arc::new(Mutex::new(Pending::default()));
        let (outgoing, rx) = mpsc::unbounded_channel();

        let reader_task = tokio::spawn(read_responses(BufReader::new(reader), pending.clone()));
        let writer_task = tokio::spawn(write_requests(BufWriter::new(writer), rx, pending.clone()));

        Self {
            driver: None,
            outgoing,
            pending,
            seq: 0,
            reader_task,
            writer_task,
            _script_dir: None,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Send one operation and wait for its response
    ///
    /// Cancel safe: dropping the future abandons only this request.
    pub async fn request(&mut self, op: Operation) -> std::result::Result<Value, SessionError> {
        let seq = self.next_seq();
        let request = BridgeRequest { seq, op };
        let json = serde_json::to_string(&request)
            .map_err(|e| SessionError::Protocol(format!("Failed to encode request: {}", e)))?;
        tracing::trace!("Driver request: {}", json);

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock();
            if let Some(error) = &pending.closed {
                return Err(error.clone());
            }
            pending.waiting.insert(seq, tx);
        }

        if self.outgoing.send(json).is_err() {
            self.pending.lock().waiting.remove(&seq);
            return Err(SessionError::Disconnected);
        }

        let response = rx.await.map_err(|_| SessionError::Disconnected)??;
        response.into_result(&request.op)
    }

    /// Ask the driver to close the browser, then make sure it exits
    pub async fn shutdown(&mut self) -> std::result::Result<(), SessionError> {
        let closed = match tokio::time::timeout(CLOSE_TIMEOUT, self.request(Operation::Close)).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(SessionError::timeout("close", CLOSE_TIMEOUT)),
        };

        // Force kill if still running
        if let Some(driver) = &mut self.driver {
            let _ = driver.kill().await;
        }
        closed
    }
}

impl Drop for BridgeClient {
    fn drop(&mut self) {
        self.reader_task.abort();
        self.writer_task.abort();
        if let Some(driver) = &mut self.driver {
            let _ = driver.start_kill();
        }
    }
}

/// Route every driver response to the request with the same `seq`
async fn read_responses<R>(mut reader: BufReader<R>, pending: Arc<Mutex<Pending>>)
where
    R: AsyncRead + Unpin,
{
    let error = loop {
        let json = match codec::read_message(&mut reader).await {
            Ok(json) => json,
            Err(e) => break e,
        };
        tracing::trace!("Driver message: {}", json);

        let response: BridgeResponse = match serde_json::from_str(&json) {
            Ok(response) => response,
            Err(e) => break SessionError::Protocol(format!("Invalid JSON: {}", e)),
        };

        let seq = response.seq;
        let waiter = pending.lock().waiting.remove(&seq);
        match waiter {
            Some(tx) => {
                if tx.send(Ok(response)).is_err() {
                    tracing::warn!(seq, "Ignoring stale driver response");
                }
            }
            None => tracing::warn!(seq, "Ignoring unexpected driver response"),
        }
    };

    tracing::debug!(error = %error, "Driver output closed");
    pending.lock().close(error);
}

/// Write queued requests in order; a request is written whole even if its
/// caller has stopped waiting
async fn write_requests<W>(
    mut writer: BufWriter<W>,
    mut rx: mpsc::UnboundedReceiver<String>,
    pending: Arc<Mutex<Pending>>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(json) = rx.recv().await {
        if let Err(e) = codec::write_message(&mut writer, &json).await {
            tracing::debug!(error = %e, "Driver input closed");
            pending.lock().close(e);
            return;
        }
    }
}
