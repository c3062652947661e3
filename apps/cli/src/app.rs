//! Operator loop: reads commands from stdin and prints status changes.

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use tcpsink_connection::ConnectionManager;
use tcpsink_protocol::{Endpoint, StatusBoard, StatusEvent};

use crate::config::Config;
use crate::controller::{Controller, ControllerError};

const HELP: &str = "\
commands:
  <enter> | c       connect / disconnect
  folder <path>     set the destination folder
  name <file>       set the file name
  status            show connection state and last status
  quit              disconnect and exit";

#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub json: bool,
    pub once: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Toggle,
    Folder(String),
    FileName(String),
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word {
            "" | "c" | "connect" | "disconnect" | "toggle" => Self::Toggle,
            "folder" | "dir" if !rest.is_empty() => Self::Folder(rest.to_string()),
            "name" if !rest.is_empty() => Self::FileName(rest.to_string()),
            "status" | "s" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Runs the client until the operator quits.
///
/// Returns `false` when a single-shot transfer did not complete.
pub async fn run(config: Config, options: Options) -> anyhow::Result<bool> {
    let mut controller = Controller::new(config);
    let printer = spawn_printer(controller.board().subscribe(), options.json);

    let ok = if options.once {
        run_once(&mut controller).await
    } else {
        interactive(&mut controller).await?
    };

    controller.disconnect().await;
    drop(controller);
    // The printer drains the last status once the board is gone.
    let _ = printer.await;
    Ok(ok)
}

async fn run_once(controller: &mut Controller) -> bool {
    let manager = controller.manager();

    let connected = tokio::select! {
        result = controller.connect() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, cancelling connect");
            manager.disconnect();
            return false;
        }
    };
    if let Err(e) = connected {
        report_connect_error(&e);
        return false;
    }

    let outcome = tokio::select! {
        outcome = controller.wait_transfer() => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, cancelling transfer");
            controller.disconnect().await
        }
    };
    matches!(outcome, Some(Ok(_)))
}

async fn interactive(controller: &mut Controller) -> anyhow::Result<bool> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
        };
        let Some(line) = line else {
            tracing::debug!("stdin closed");
            break;
        };

        match Command::parse(&line) {
            Command::Toggle if controller.state().is_active() => {
                let manager = controller.manager();
                tokio::select! {
                    _ = controller.disconnect() => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("SIGINT received, shutting down");
                        manager.disconnect();
                        break;
                    }
                }
            }
            Command::Toggle => {
                let manager = controller.manager();
                let board = Arc::clone(controller.board());
                let attempt =
                    drive_connect(controller.connect(), &manager, &board, &mut lines).await?;
                if let Err(e) = attempt.result {
                    report_connect_error(&e);
                }
                if attempt.quit {
                    break;
                }
            }
            Command::Folder(folder) => match controller.set_destination_folder(folder) {
                Ok(()) => println!("destination folder: {}", controller.config().dir_path),
                Err(e) => println!("{e}"),
            },
            Command::FileName(name) => {
                controller.set_file_name(name);
                println!("file name: {}", controller.config().file_name);
            }
            Command::Status => {
                let config = controller.config();
                let remote = controller.active_endpoint().unwrap_or_else(|| {
                    Endpoint::new(config.remote_host.clone(), config.remote_port)
                });
                println!(
                    "{} | {remote} -> {}/{}",
                    controller.state(),
                    config.dir_path,
                    config.file_name
                );
                print_latest(controller.board());
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Unknown(input) => println!("unknown command: {input} (try `help`)"),
        }
    }

    Ok(true)
}

/// Outcome of a connect started from the command loop.
struct ConnectAttempt {
    result: Result<(), ControllerError>,
    quit: bool,
}

/// Awaits `connect` while still reading commands.
///
/// A toggle, `quit`, end of input or Ctrl-C closes the attempt through
/// `manager`, which makes `connect` resolve with a cancellation.
async fn drive_connect<F, R>(
    connect: F,
    manager: &ConnectionManager,
    board: &StatusBoard,
    lines: &mut Lines<R>,
) -> anyhow::Result<ConnectAttempt>
where
    F: Future<Output = Result<(), ControllerError>>,
    R: AsyncBufRead + Unpin,
{
    tokio::pin!(connect);
    let mut quit = false;
    let mut input_open = true;

    loop {
        tokio::select! {
            biased;
            result = &mut connect => return Ok(ConnectAttempt { result, quit }),
            line = lines.next_line(), if input_open => match line?.map(|l| Command::parse(&l)) {
                Some(Command::Toggle) => manager.disconnect(),
                Some(Command::Quit) | None => {
                    input_open = false;
                    quit = true;
                    manager.disconnect();
                }
                Some(Command::Status) => {
                    println!("{}", manager.current_state());
                    print_latest(board);
                }
                Some(_) => println!("connecting, disconnect first"),
            },
            _ = tokio::signal::ctrl_c(), if !quit => {
                tracing::info!("SIGINT received, cancelling connect");
                quit = true;
                manager.disconnect();
            }
        }
    }
}

fn report_connect_error(e: &ControllerError) {
    match e {
        // Already on the status board.
        ControllerError::Connect(_) | ControllerError::Destination(_) => {
            tracing::debug!(error = %e, "connect failed")
        }
        ControllerError::Busy => println!("{e}"),
    }
}

fn print_latest(board: &StatusBoard) {
    let latest = board.latest_text();
    if !latest.is_empty() {
        println!("{latest}");
    }
}

/// Prints every status change until the status board is dropped.
fn spawn_printer(mut rx: watch::Receiver<Option<StatusEvent>>, json: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let event = rx.borrow_and_update().clone();
            if let Some(event) = event {
                println!("{}", render(&event, json));
            }
        }
    })
}

fn render(event: &StatusEvent, json: bool) -> String {
    if !json {
        return event.to_string();
    }
    match serde_json::to_string(event) {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!(error = %e, "cannot serialize status event");
            event.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tcpsink_connection::{ConnectError, ConnectionState};
    use tcpsink_protocol::StatusSink;
    use tokio::net::TcpListener;

    /// A manager holding a live connection, standing in for an attempt in
    /// flight, and a connect future that resolves once it is closed.
    async fn pending_attempt() -> (
        Arc<ConnectionManager>,
        impl Future<Output = Result<(), ControllerError>>,
        TcpListener,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let board: Arc<dyn StatusSink> = Arc::new(StatusBoard::new());
        let manager = Arc::new(ConnectionManager::new(board));
        let conn = manager.connect(Endpoint::new("127.0.0.1", port)).await.unwrap();

        let mut states = manager.subscribe_state();
        let connect = async move {
            states
                .wait_for(|s| *s == ConnectionState::Disconnected)
                .await
                .unwrap();
            assert!(conn.is_closed());
            Err(ControllerError::Connect(ConnectError::Cancelled))
        };
        (manager, connect, listener)
    }

    #[tokio::test]
    async fn toggle_while_connecting_cancels_attempt() {
        let (manager, connect, _listener) = pending_attempt().await;
        let board = StatusBoard::new();
        let mut lines = BufReader::new(&b"c\n"[..]).lines();

        let attempt = tokio::time::timeout(
            Duration::from_secs(5),
            drive_connect(connect, &manager, &board, &mut lines),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(matches!(
            attempt.result,
            Err(ControllerError::Connect(ConnectError::Cancelled))
        ));
        assert!(!attempt.quit);
        assert_eq!(manager.current_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn quit_while_connecting_cancels_and_quits() {
        let (manager, connect, _listener) = pending_attempt().await;
        let board = StatusBoard::new();
        let mut lines = BufReader::new(&b"status\nfolder /tmp\nq\n"[..]).lines();

        let attempt = tokio::time::timeout(
            Duration::from_secs(5),
            drive_connect(connect, &manager, &board, &mut lines),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(attempt.result.is_err());
        assert!(attempt.quit);
    }

    #[tokio::test]
    async fn end_of_input_while_connecting_quits() {
        let (manager, connect, _listener) = pending_attempt().await;
        let board = StatusBoard::new();
        let mut lines = BufReader::new(&b""[..]).lines();

        let attempt = drive_connect(connect, &manager, &board, &mut lines)
            .await
            .unwrap();
        assert!(attempt.quit);
        assert_eq!(manager.current_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse(""), Command::Toggle);
        assert_eq!(Command::parse("  c "), Command::Toggle);
        assert_eq!(Command::parse("disconnect"), Command::Toggle);
        assert_eq!(
            Command::parse("folder /srv/in box"),
            Command::Folder("/srv/in box".into())
        );
        assert_eq!(Command::parse("name out.bin"), Command::FileName("out.bin".into()));
        assert_eq!(Command::parse("status"), Command::Status);
        assert_eq!(Command::parse("?"), Command::Help);
        assert_eq!(Command::parse("q"), Command::Quit);
    }

    #[test]
    fn parse_rejects_missing_arguments() {
        assert_eq!(Command::parse("folder"), Command::Unknown("folder".into()));
        assert_eq!(Command::parse("name   "), Command::Unknown("name".into()));
        assert_eq!(Command::parse("fetch"), Command::Unknown("fetch".into()));
    }

    #[test]
    fn render_text_and_json() {
        let event = StatusEvent::Connected {
            endpoint: Endpoint::new("127.0.0.1", 9000),
        };
        assert_eq!(
            render(&event, false),
            "connected to 127.0.0.1:9000, waiting for data"
        );

        let value: serde_json::Value = serde_json::from_str(&render(&event, true)).unwrap();
        assert_eq!(value["event"], "connected");
        assert_eq!(value["endpoint"]["port"], 9000);
    }

    #[tokio::test]
    async fn printer_stops_when_board_is_dropped() {
        let board = StatusBoard::new();
        let printer = spawn_printer(board.subscribe(), true);

        board.publish(StatusEvent::ChunkReceived {
            index: 1,
            size: 3,
            total: 3,
        });
        drop(board);

        tokio::time::timeout(Duration::from_secs(5), printer)
            .await
            .unwrap()
            .unwrap();
    }
}
