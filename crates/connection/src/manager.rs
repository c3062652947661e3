//! Connection manager owning the single outbound connection.
//!
//! At most one connection is active at a time: connecting again replaces
//! the previous one. The manager keeps the close token of the active
//! connection and the lifecycle state; the stream itself travels with the
//! [`Connection`] value.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::net::{TcpStream, lookup_host};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tcpsink_protocol::{CONNECT_TIMEOUT, Endpoint, StatusEvent, StatusSink};

use crate::connection::Connection;
use crate::error::ConnectError;
use crate::types::ConnectionState;

/// Bookkeeping for the connection currently owned by the manager.
struct ActiveLink {
    id: u64,
    endpoint: Endpoint,
    closed: CancellationToken,
}

/// Manages the lifecycle of the single outbound connection.
pub struct ConnectionManager {
    status: Arc<dyn StatusSink>,
    active: Mutex<Option<ActiveLink>>,
    state_tx: watch::Sender<ConnectionState>,
    next_id: AtomicU64,
}

impl ConnectionManager {
    /// Creates a manager that publishes lifecycle events to `status`.
    pub fn new(status: Arc<dyn StatusSink>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            status,
            active: Mutex::new(None),
            state_tx,
            next_id: AtomicU64::new(0),
        }
    }

    /// Returns the current connection state.
    pub fn current_state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Returns the endpoint of the active connection or attempt, if any.
    pub fn active_endpoint(&self) -> Option<Endpoint> {
        self.lock_active().as_ref().map(|link| link.endpoint.clone())
    }

    /// Connects to `endpoint`, replacing any active connection.
    ///
    /// The attempt is bounded by [`CONNECT_TIMEOUT`] across all resolved
    /// addresses and is not retried. A [`disconnect`](Self::disconnect)
    /// issued meanwhile aborts it with [`ConnectError::Cancelled`].
    pub async fn connect(&self, endpoint: Endpoint) -> Result<Connection, ConnectError> {
        self.disconnect();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let closed = CancellationToken::new();
        {
            let mut active = self.lock_active();
            *active = Some(ActiveLink {
                id,
                endpoint: endpoint.clone(),
                closed: closed.clone(),
            });
            self.set_state(ConnectionState::Connecting);
        }

        info!(%endpoint, "connecting");
        self.status.publish(StatusEvent::Connecting {
            endpoint: endpoint.clone(),
        });

        let result = tokio::select! {
            biased;
            _ = closed.cancelled() => Err(ConnectError::Cancelled),
            result = tokio::time::timeout(CONNECT_TIMEOUT, open_stream(&endpoint)) => {
                match result {
                    Ok(r) => r,
                    Err(_) => Err(ConnectError::Timeout(CONNECT_TIMEOUT)),
                }
            }
        };

        let result = result.and_then(|stream| {
            let active = self.lock_active();
            match active.as_ref() {
                Some(link) if link.id == id && !link.closed.is_cancelled() => {
                    self.set_state(ConnectionState::Connected);
                    Ok(Connection::new(id, endpoint.clone(), stream, closed.clone()))
                }
                // Disconnected or replaced after the handshake finished.
                _ => Err(ConnectError::Cancelled),
            }
        });

        match result {
            Ok(connection) => {
                info!(%endpoint, id, "connected");
                self.status.publish(StatusEvent::Connected { endpoint });
                Ok(connection)
            }
            Err(e) => {
                self.clear_if_current(id);
                warn!(%endpoint, error = %e, "connection failed");
                self.status.publish(StatusEvent::ConnectFailed {
                    endpoint,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Closes the active connection, if any.
    ///
    /// Idempotent and infallible. A transfer reading from the connection
    /// wakes up with a local-close error and finalizes on its own task.
    pub fn disconnect(&self) {
        let mut active = self.lock_active();
        if let Some(link) = active.take() {
            link.closed.cancel();
            debug!(endpoint = %link.endpoint, id = link.id, "disconnected");
        }
        self.set_state(ConnectionState::Disconnected);
    }

    /// Takes a connection back at the end of a transfer and closes it.
    ///
    /// Only disconnects the manager when `connection` is still the active
    /// one, so a stale connection never tears down its replacement.
    pub async fn release(&self, mut connection: Connection) {
        connection.shutdown().await;
        let id = connection.id();
        drop(connection);

        let mut active = self.lock_active();
        if active.as_ref().is_some_and(|link| link.id == id) {
            if let Some(link) = active.take() {
                link.closed.cancel();
                debug!(endpoint = %link.endpoint, id, "connection released");
            }
            self.set_state(ConnectionState::Disconnected);
        }
    }

    fn clear_if_current(&self, id: u64) {
        let mut active = self.lock_active();
        if active.as_ref().is_some_and(|link| link.id == id) {
            active.take();
            self.set_state(ConnectionState::Disconnected);
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveLink>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Resolves `endpoint` and tries each address in order.
async fn open_stream(endpoint: &Endpoint) -> Result<TcpStream, ConnectError> {
    let addrs: Vec<SocketAddr> = lookup_host((endpoint.host.as_str(), endpoint.port))
        .await
        .map_err(|source| ConnectError::Resolve {
            host: endpoint.host.clone(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(ConnectError::NoAddresses(endpoint.host.clone()));
    }

    let mut last_err = io::Error::from(io::ErrorKind::AddrNotAvailable);
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                debug!(%addr, "tcp handshake complete");
                return Ok(stream);
            }
            Err(e) => {
                debug!(%addr, error = %e, "address failed");
                last_err = e;
            }
        }
    }

    Err(ConnectError::from_connect(last_err))
}
