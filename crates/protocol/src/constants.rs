use std::time::Duration;

/// Maximum number of bytes requested from the socket per read.
pub const CHUNK_SIZE: usize = 4096;

/// Timeout for the TCP connection attempt (all resolved addresses combined).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a read may wait for data before the transfer is declared stalled.
///
/// Matches the connect timeout: the client applies one deadline to every
/// socket operation.
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
