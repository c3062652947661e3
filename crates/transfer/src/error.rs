//! Error types for the receive loop.

use std::io;
use std::path::PathBuf;

use tcpsink_connection::ReadError;
use tcpsink_protocol::TransferErrorKind;

/// A failure while streaming an established connection to disk.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {source}")]
pub struct TransferError {
    kind: TransferErrorKind,
    local_close: bool,
    #[source]
    source: io::Error,
}

impl TransferError {
    /// Classifies a failed read.
    pub fn from_read(err: ReadError) -> Self {
        match err {
            ReadError::Closed => Self {
                kind: TransferErrorKind::Other,
                local_close: true,
                source: io::Error::new(io::ErrorKind::NotConnected, "connection closed locally"),
            },
            ReadError::Idle(idle) => Self {
                kind: TransferErrorKind::Timeout,
                local_close: false,
                source: io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no data received for {}s", idle.as_secs_f32()),
                ),
            },
            ReadError::Io(source) => Self {
                kind: classify(&source),
                local_close: false,
                source,
            },
        }
    }

    /// Wraps a failure writing the destination file.
    pub fn write(source: io::Error) -> Self {
        Self {
            kind: TransferErrorKind::Other,
            local_close: false,
            source,
        }
    }

    pub fn kind(&self) -> TransferErrorKind {
        self.kind
    }

    /// Returns `true` when the transfer stopped because the connection was
    /// closed on this side (operator cancel), not because of a fault.
    pub fn is_local_close(&self) -> bool {
        self.local_close
    }

    /// The underlying I/O error.
    pub fn io_error(&self) -> &io::Error {
        &self.source
    }
}

/// Maps a socket error onto the three reported failure kinds.
fn classify(err: &io::Error) -> TransferErrorKind {
    match err.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => TransferErrorKind::Reset,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransferErrorKind::Timeout,
        _ => TransferErrorKind::Other,
    }
}

/// Errors returned by [`Receiver::run`](crate::Receiver::run).
#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    #[error("cannot create {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl ReceiveError {
    /// Returns the failure kind for errors raised after the file was opened.
    pub fn transfer_kind(&self) -> Option<TransferErrorKind> {
        match self {
            Self::Open { .. } => None,
            Self::Transfer(e) => Some(e.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn io_read(kind: io::ErrorKind) -> TransferError {
        TransferError::from_read(ReadError::Io(io::Error::from(kind)))
    }

    #[test]
    fn reset_family() {
        assert_eq!(io_read(io::ErrorKind::ConnectionReset).kind(), TransferErrorKind::Reset);
        assert_eq!(io_read(io::ErrorKind::ConnectionAborted).kind(), TransferErrorKind::Reset);
        assert_eq!(io_read(io::ErrorKind::BrokenPipe).kind(), TransferErrorKind::Reset);
    }

    #[test]
    fn timeout_family() {
        assert_eq!(io_read(io::ErrorKind::TimedOut).kind(), TransferErrorKind::Timeout);
        let idle = TransferError::from_read(ReadError::Idle(Duration::from_secs(30)));
        assert_eq!(idle.kind(), TransferErrorKind::Timeout);
        assert!(!idle.is_local_close());
        assert!(idle.to_string().contains("30s"));
    }

    #[test]
    fn everything_else_is_other() {
        assert_eq!(io_read(io::ErrorKind::PermissionDenied).kind(), TransferErrorKind::Other);
        assert_eq!(io_read(io::ErrorKind::Other).kind(), TransferErrorKind::Other);
    }

    #[test]
    fn local_close_is_other_and_flagged() {
        let err = TransferError::from_read(ReadError::Closed);
        assert_eq!(err.kind(), TransferErrorKind::Other);
        assert!(err.is_local_close());
        assert_eq!(err.io_error().kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn write_failure_is_other() {
        let err = TransferError::write(io::Error::from(io::ErrorKind::StorageFull));
        assert_eq!(err.kind(), TransferErrorKind::Other);
        assert!(!err.is_local_close());
    }

    #[test]
    fn receive_error_kind() {
        let open = ReceiveError::Open {
            path: PathBuf::from("/missing/out.bin"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(open.transfer_kind(), None);
        assert!(open.to_string().starts_with("cannot create /missing/out.bin"));

        let transfer = ReceiveError::from(io_read(io::ErrorKind::ConnectionReset));
        assert_eq!(transfer.transfer_kind(), Some(TransferErrorKind::Reset));
    }
}
