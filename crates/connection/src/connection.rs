use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use tcpsink_protocol::Endpoint;

use crate::error::ReadError;

/// An established TCP connection.
///
/// Owns the stream exclusively. The close token is shared with the
/// [`ConnectionManager`](crate::ConnectionManager) that created it; firing
/// it wakes any pending [`read_chunk`](Self::read_chunk).
#[derive(Debug)]
pub struct Connection {
    id: u64,
    endpoint: Endpoint,
    stream: TcpStream,
    closed: CancellationToken,
}

impl Connection {
    pub(crate) fn new(
        id: u64,
        endpoint: Endpoint,
        stream: TcpStream,
        closed: CancellationToken,
    ) -> Self {
        Self {
            id,
            endpoint,
            stream,
            closed,
        }
    }

    /// Identifier assigned by the manager, unique per manager.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Returns `true` once the connection has been closed locally.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Reads the next chunk into `buf`.
    ///
    /// Returns `Ok(0)` when the peer closed the connection. Fails with
    /// [`ReadError::Closed`] if the connection is closed locally while
    /// waiting, and with [`ReadError::Idle`] if nothing arrives within `idle`.
    pub async fn read_chunk(&mut self, buf: &mut [u8], idle: Duration) -> Result<usize, ReadError> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(ReadError::Closed),
            result = tokio::time::timeout(idle, self.stream.read(buf)) => match result {
                Ok(Ok(n)) => Ok(n),
                Ok(Err(e)) => Err(ReadError::Io(e)),
                Err(_) => Err(ReadError::Idle(idle)),
            },
        }
    }

    /// Shuts down the write half. Errors are ignored: the peer may already
    /// be gone.
    pub(crate) async fn shutdown(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}
