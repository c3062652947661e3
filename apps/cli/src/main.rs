//! tcpsink client entry point.

mod app;
mod config;
mod controller;

use std::path::PathBuf;

use clap::Parser;
use tcpsink_protocol::Endpoint;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "tcpsink")]
#[command(about = "Connect to a TCP endpoint and save everything it sends to a file")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Configuration file (default: platform config dir)")]
    config: Option<PathBuf>,

    #[arg(
        long,
        conflicts_with_all = ["host", "port"],
        help = "Remote endpoint as host:port ([addr]:port for IPv6)"
    )]
    remote: Option<Endpoint>,

    #[arg(long, help = "Remote host name or address")]
    host: Option<String>,

    #[arg(short, long, help = "Remote TCP port")]
    port: Option<u16>,

    #[arg(short, long, help = "Folder to save received files into")]
    dir: Option<String>,

    #[arg(short = 'o', long = "file-name", help = "Base name of the saved file")]
    file_name: Option<String>,

    #[arg(long, help = "Print status events as JSON lines")]
    json: bool,

    #[arg(long, help = "Connect immediately, receive one file, then exit")]
    once: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(remote) = &self.remote {
            config.remote_host = remote.host.clone();
            config.remote_port = remote.port;
        }
        if let Some(host) = &self.host {
            config.remote_host = host.clone();
        }
        if let Some(port) = self.port {
            config.remote_port = port;
        }
        if let Some(dir) = &self.dir {
            config.dir_path = dir.clone();
        }
        if let Some(name) = &self.file_name {
            config.file_name = name.clone();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only status output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting tcpsink");

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli.apply(&mut config);
    tracing::info!(
        remote = %format_args!("{}:{}", config.remote_host, config.remote_port),
        dir = %config.dir_path,
        file = %config.file_name,
        "configuration loaded"
    );

    let options = app::Options {
        json: cli.json,
        once: cli.once,
    };

    let rt = tokio::runtime::Runtime::new()?;
    let ok = rt.block_on(app::run(config, options))?;

    tracing::info!("client shut down cleanly");
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
