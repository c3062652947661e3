//! Connection manager for the single outbound TCP connection.
//!
//! [`ConnectionManager::connect`] hands out an owned [`Connection`]; the
//! manager keeps only its close token, so [`ConnectionManager::disconnect`]
//! can stop a transfer running on another task.

mod connection;
mod error;
pub mod manager;
pub mod types;

pub use connection::Connection;
pub use error::{ConnectError, ReadError};
pub use manager::ConnectionManager;
pub use types::ConnectionState;
