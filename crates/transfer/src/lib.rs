//! Streams an established connection into a file.
//!
//! The [`Receiver`] reads fixed-size chunks until the peer closes the
//! connection, appending each one to the destination file and reporting
//! progress through a [`StatusSink`](tcpsink_protocol::StatusSink).

mod error;
mod receiver;
mod session;

pub use error::{ReceiveError, TransferError};
pub use receiver::Receiver;
pub use session::{TransferSession, TransferSummary};
pub use tcpsink_protocol::TransferErrorKind;
