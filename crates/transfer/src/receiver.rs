//! Receive loop (client side).
//!
//! Reads the connection in [`CHUNK_SIZE`] pieces and appends them to the
//! destination file until the peer closes, a read fails, or the connection
//! is closed locally.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tcpsink_connection::{Connection, ConnectionManager};
use tcpsink_protocol::{CHUNK_SIZE, READ_TIMEOUT, StatusEvent, StatusSink};

use crate::error::{ReceiveError, TransferError};
use crate::session::{TransferSession, TransferSummary};

/// Streams connections handed out by a [`ConnectionManager`] to disk.
pub struct Receiver {
    manager: Arc<ConnectionManager>,
    status: Arc<dyn StatusSink>,
    read_timeout: Duration,
}

impl Receiver {
    pub fn new(manager: Arc<ConnectionManager>, status: Arc<dyn StatusSink>) -> Self {
        Self {
            manager,
            status,
            read_timeout: READ_TIMEOUT,
        }
    }

    /// Overrides how long a read may wait for data.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Starts a transfer on a background task.
    ///
    /// The collision-free destination is picked from `desired` on that task,
    /// right before the file is created.
    pub fn spawn(
        self: &Arc<Self>,
        connection: Connection,
        desired: PathBuf,
    ) -> JoinHandle<Result<TransferSummary, ReceiveError>> {
        let receiver = Arc::clone(self);
        tokio::spawn(async move {
            let destination = tcpsink_file_ops::resolve(&desired);
            receiver.run(connection, destination).await
        })
    }

    /// Streams `connection` into `destination` until it ends.
    ///
    /// The connection is always released back to the manager, and the file
    /// closed, before the terminal status is published. Partial files are
    /// left on disk.
    pub async fn run(
        &self,
        mut connection: Connection,
        destination: PathBuf,
    ) -> Result<TransferSummary, ReceiveError> {
        let mut session = TransferSession::new(destination);
        info!(
            endpoint = %connection.endpoint(),
            peer = ?connection.peer_addr().ok(),
            path = %session.destination().display(),
            "receiving"
        );

        let mut file = match open_destination(&session).await {
            Ok(file) => file,
            Err(source) => {
                self.manager.release(connection).await;
                let path = session.destination().to_path_buf();
                warn!(path = %path.display(), error = %source, "cannot create destination");
                self.status.publish(StatusEvent::OpenFailed {
                    path: path.clone(),
                    reason: source.to_string(),
                });
                return Err(ReceiveError::Open { path, source });
            }
        };

        let pumped = self.pump(&mut connection, &mut file, &mut session).await;
        let flushed = file.flush().await;
        drop(file);
        self.manager.release(connection).await;

        match pumped.and_then(|()| flushed.map_err(TransferError::write)) {
            Ok(()) => {
                let summary = session.summary();
                info!(
                    path = %summary.path.display(),
                    chunks = summary.chunks,
                    bytes = summary.bytes,
                    elapsed_ms = summary.elapsed.as_millis() as u64,
                    bytes_per_sec = summary.bytes_per_second() as u64,
                    "transfer complete"
                );
                self.status.publish(StatusEvent::TransferComplete {
                    path: summary.path.clone(),
                    chunks: summary.chunks,
                    total: summary.bytes,
                });
                Ok(summary)
            }
            Err(e) => {
                if e.is_local_close() {
                    info!(
                        bytes = session.bytes_received(),
                        "transfer stopped: connection closed locally"
                    );
                } else {
                    warn!(
                        kind = ?e.kind(),
                        error = %e.io_error(),
                        bytes = session.bytes_received(),
                        "transfer failed"
                    );
                }
                self.status.publish(StatusEvent::TransferFailed {
                    kind: e.kind(),
                    reason: e.io_error().to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Copies chunks from the connection to the file until the peer closes.
    async fn pump(
        &self,
        connection: &mut Connection,
        file: &mut File,
        session: &mut TransferSession,
    ) -> Result<(), TransferError> {
        let mut buf = vec![0u8; CHUNK_SIZE];

        loop {
            let n = connection
                .read_chunk(&mut buf, self.read_timeout)
                .await
                .map_err(TransferError::from_read)?;
            if n == 0 {
                debug!(
                    chunks = session.chunk_count(),
                    bytes = session.bytes_received(),
                    "peer closed connection"
                );
                return Ok(());
            }

            file.write_all(&buf[..n])
                .await
                .map_err(TransferError::write)?;

            let (index, total) = session.record_chunk(n);
            debug!(index, size = n, total, "chunk received");
            self.status.publish(StatusEvent::ChunkReceived {
                index,
                size: n,
                total,
            });
        }
    }
}

async fn open_destination(session: &TransferSession) -> std::io::Result<File> {
    tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(session.destination())
        .await
}
