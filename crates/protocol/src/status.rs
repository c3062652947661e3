//! Status notifications published by the connection and transfer crates.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::Endpoint;

/// Classification of a failed read on an established connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferErrorKind {
    /// The peer reset or aborted the connection.
    Reset,
    /// No data arrived within the read timeout.
    Timeout,
    /// Any other transport or local I/O failure.
    Other,
}

impl fmt::Display for TransferErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reset => f.write_str("connection reset"),
            Self::Timeout => f.write_str("timed out"),
            Self::Other => f.write_str("transport error"),
        }
    }
}

/// A connection or transfer lifecycle event.
///
/// `Display` renders the operator-facing status line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum StatusEvent {
    /// A connect attempt started.
    Connecting { endpoint: Endpoint },
    /// The connection is established and waiting for data.
    Connected { endpoint: Endpoint },
    /// The connect attempt failed.
    ConnectFailed { endpoint: Endpoint, reason: String },
    /// One chunk was read and written to disk.
    ChunkReceived { index: u64, size: usize, total: u64 },
    /// The peer closed the connection; all data is on disk.
    TransferComplete { path: PathBuf, chunks: u64, total: u64 },
    /// The destination file could not be created.
    OpenFailed { path: PathBuf, reason: String },
    /// The transfer stopped on a read or write failure.
    TransferFailed { kind: TransferErrorKind, reason: String },
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting { endpoint } => write!(f, "connecting to {endpoint}"),
            Self::Connected { endpoint } => {
                write!(f, "connected to {endpoint}, waiting for data")
            }
            Self::ConnectFailed { endpoint, reason } => write!(
                f,
                "{reason}\nconnection to {endpoint} failed, check the host address and port"
            ),
            Self::ChunkReceived { index, size, total } => write!(
                f,
                "chunk {index}\nreceived {size} bytes\n{total} bytes received in total"
            ),
            Self::TransferComplete {
                path,
                chunks,
                total,
            } => write!(
                f,
                "transfer complete, connection closed: {total} bytes in {chunks} chunks saved to {}",
                path.display()
            ),
            Self::OpenFailed { path, reason } => {
                write!(f, "cannot create {}: {reason}", path.display())
            }
            Self::TransferFailed { kind, reason } => {
                let headline = match kind {
                    TransferErrorKind::Reset => "connection reset by peer",
                    TransferErrorKind::Timeout => "connection stalled",
                    TransferErrorKind::Other => "transport failure",
                };
                write!(f, "{headline}: {reason}\nconnection closed during transfer")
            }
        }
    }
}

/// Receiver of status notifications.
///
/// Implementations must not block: they are called from the connect path
/// and from inside the transfer loop.
pub trait StatusSink: Send + Sync {
    fn publish(&self, event: StatusEvent);
}

impl StatusSink for mpsc::UnboundedSender<StatusEvent> {
    fn publish(&self, event: StatusEvent) {
        // A dropped receiver means nobody is listening anymore.
        let _ = self.send(event);
    }
}

/// Last-write-wins status holder.
///
/// Every published event replaces the previous one; subscribers see the
/// most recent value and may miss intermediate ones.
#[derive(Debug)]
pub struct StatusBoard {
    tx: watch::Sender<Option<StatusEvent>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Returns the most recent event, if any was published.
    pub fn latest(&self) -> Option<StatusEvent> {
        self.tx.borrow().clone()
    }

    /// Returns the most recent status line, or an empty string.
    pub fn latest_text(&self) -> String {
        self.tx
            .borrow()
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Subscribes to status changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<StatusEvent>> {
        self.tx.subscribe()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for StatusBoard {
    fn publish(&self, event: StatusEvent) {
        self.tx.send_replace(Some(event));
    }
}
