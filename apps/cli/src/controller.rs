//! Connect/disconnect toggle and destination settings.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;

use tcpsink_connection::{ConnectError, ConnectionManager, ConnectionState};
use tcpsink_protocol::{Endpoint, StatusBoard, StatusEvent, StatusSink};
use tcpsink_transfer::{ReceiveError, Receiver, TransferSummary};

use crate::config::Config;

type Worker = JoinHandle<Result<TransferSummary, ReceiveError>>;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("disconnect first")]
    Busy,

    #[error("invalid destination: {0}")]
    Destination(#[source] io::Error),

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Drives one connection at a time and the transfer running on it.
pub struct Controller {
    config: Config,
    board: Arc<StatusBoard>,
    manager: Arc<ConnectionManager>,
    receiver: Arc<Receiver>,
    worker: Option<Worker>,
}

impl Controller {
    pub fn new(config: Config) -> Self {
        Self::with_receiver(config, |r| r)
    }

    /// Builds a controller whose [`Receiver`] is adjusted by `configure`.
    pub fn with_receiver(config: Config, configure: impl FnOnce(Receiver) -> Receiver) -> Self {
        let board = Arc::new(StatusBoard::new());
        let status: Arc<dyn StatusSink> = board.clone();
        let manager = Arc::new(ConnectionManager::new(status.clone()));
        let receiver = Arc::new(configure(Receiver::new(manager.clone(), status)));
        Self {
            config,
            board,
            manager,
            receiver,
            worker: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn board(&self) -> &Arc<StatusBoard> {
        &self.board
    }

    pub fn manager(&self) -> Arc<ConnectionManager> {
        Arc::clone(&self.manager)
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.current_state()
    }

    /// Endpoint of the connection or attempt in progress, if any.
    pub fn active_endpoint(&self) -> Option<Endpoint> {
        self.manager.active_endpoint()
    }

    /// Connects when idle, disconnects otherwise.
    pub async fn toggle(&mut self) -> Result<(), ControllerError> {
        if self.state().is_active() {
            self.disconnect().await;
            Ok(())
        } else {
            self.connect().await
        }
    }

    /// Connects to the configured endpoint and starts receiving.
    ///
    /// Any previous connection is closed and its transfer awaited first.
    pub async fn connect(&mut self) -> Result<(), ControllerError> {
        let folder = &self.config.dir_path;
        let desired = match tcpsink_file_ops::destination_path(folder, &self.config.file_name) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(dir = %folder, error = %e, "invalid destination");
                self.board.publish(StatusEvent::OpenFailed {
                    path: PathBuf::from(folder),
                    reason: e.to_string(),
                });
                return Err(ControllerError::Destination(e));
            }
        };
        self.disconnect().await;

        let endpoint = Endpoint::new(self.config.remote_host.clone(), self.config.remote_port);
        let connection = self.manager.connect(endpoint).await?;
        self.worker = Some(self.receiver.spawn(connection, desired));
        Ok(())
    }

    /// Closes the connection and waits for its transfer to finish.
    ///
    /// Returns the transfer outcome if one was running or had finished
    /// without being collected.
    pub async fn disconnect(&mut self) -> Option<Result<TransferSummary, ReceiveError>> {
        self.manager.disconnect();
        self.join_worker().await
    }

    /// Waits for the current transfer to end on its own.
    pub async fn wait_transfer(&mut self) -> Option<Result<TransferSummary, ReceiveError>> {
        self.join_worker().await
    }

    /// Changes the folder received files are saved into.
    pub fn set_destination_folder(
        &mut self,
        folder: impl Into<String>,
    ) -> Result<(), ControllerError> {
        if self.state().is_active() {
            return Err(ControllerError::Busy);
        }
        self.config.dir_path = folder.into();
        Ok(())
    }

    /// Changes the base file name used by the next transfer.
    pub fn set_file_name(&mut self, name: impl Into<String>) {
        self.config.file_name = name.into();
    }

    // Cancel-safe: the handle stays in place until the task has finished.
    async fn join_worker(&mut self) -> Option<Result<TransferSummary, ReceiveError>> {
        let joined = self.worker.as_mut()?.await;
        self.worker = None;
        match joined {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(error = %e, "transfer task failed");
                None
            }
        }
    }
}
