//! Types shared by every tcpsink crate.
//!
//! The receive core talks to its controller only through the
//! [`StatusSink`] trait defined here, so the crates that do the work
//! never depend on how status is presented.

pub mod constants;
pub mod endpoint;
pub mod status;

pub use constants::{CHUNK_SIZE, CONNECT_TIMEOUT, READ_TIMEOUT};
pub use endpoint::{Endpoint, EndpointError};
pub use status::{StatusBoard, StatusEvent, StatusSink, TransferErrorKind};
