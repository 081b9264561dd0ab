//! Background removal of project working directories.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::dispatch::WorkspaceCleanup;

/// Single-worker cleanup queue. Submissions never block: when the queue is
/// full the path is dropped with a warning.
pub struct CleanupQueue {
    tx: mpsc::Sender<PathBuf>,
}

impl CleanupQueue {
    #[must_use]
    pub fn start(capacity: usize, cancel: &CancellationToken) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(drain_queue(rx, cancel.clone()));
        (Self { tx }, handle)
    }
}

impl WorkspaceCleanup for CleanupQueue {
    fn submit(&self, path: PathBuf) {
        if let Err(e) = self.tx.try_send(path) {
            let (reason, path) = match e {
                mpsc::error::TrySendError::Full(p) => ("queue full", p),
                mpsc::error::TrySendError::Closed(p) => ("worker stopped", p),
            };
            tracing::warn!(path = %path.display(), reason, "workspace cleanup dropped");
        }
    }
}

async fn drain_queue(mut rx: mpsc::Receiver<PathBuf>, cancel: CancellationToken) {
    loop {
        let path = tokio::select! {
            () = cancel.cancelled() => break,
            path = rx.recv() => path,
        };
        let Some(path) = path else { break };
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "workspace removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "workspace cleanup failed");
            }
        }
    }
    tracing::debug!("cleanup worker stopped");
}
