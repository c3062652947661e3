//! Error types for the connection manager.

use std::io;
use std::time::Duration;

/// Errors produced by a connect attempt.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("no addresses found for {0}")]
    NoAddresses(String),

    #[error("connection refused: {0}")]
    Refused(#[source] io::Error),

    #[error("host unreachable: {0}")]
    Unreachable(#[source] io::Error),

    #[error("connection timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl ConnectError {
    /// Classifies an error returned by the TCP handshake.
    pub(crate) fn from_connect(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::Refused(err),
            io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
                Self::Unreachable(err)
            }
            io::ErrorKind::TimedOut => Self::Timeout(tcpsink_protocol::CONNECT_TIMEOUT),
            _ => Self::Io(err),
        }
    }
}

/// Errors produced by [`Connection::read_chunk`](crate::Connection::read_chunk).
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("connection closed locally")]
    Closed,

    #[error("no data received for {}s", .0.as_secs_f32())]
    Idle(Duration),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_refused() {
        let err = ConnectError::from_connect(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert!(matches!(err, ConnectError::Refused(_)));
    }

    #[test]
    fn classify_unreachable() {
        let err = ConnectError::from_connect(io::Error::from(io::ErrorKind::HostUnreachable));
        assert!(matches!(err, ConnectError::Unreachable(_)));
        let err = ConnectError::from_connect(io::Error::from(io::ErrorKind::NetworkUnreachable));
        assert!(matches!(err, ConnectError::Unreachable(_)));
    }

    #[test]
    fn classify_os_timeout() {
        let err = ConnectError::from_connect(io::Error::from(io::ErrorKind::TimedOut));
        assert!(matches!(err, ConnectError::Timeout(_)));
    }

    #[test]
    fn classify_other() {
        let err = ConnectError::from_connect(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ConnectError::Io(_)));
    }

    #[test]
    fn timeout_message_in_seconds() {
        let err = ConnectError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "connection timed out after 30s");
    }
}
