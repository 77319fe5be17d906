//! tessera-renderer: the native side of the Tessera bridge.
//!
//! stdout carries exactly one line, the handshake. All logging goes to
//! stderr.

mod cli;

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use tessera_common::TesseraError;
use tessera_config::{TesseraConfig, TransportKind};
use tessera_renderer::server::{self, Listener, ServerOptions};
use tessera_renderer::Dispatcher;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::cli::TransportArg;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    let config = tessera_config::toml_loader::load_or_default(args.config.as_deref().map(Path::new));
    if args.print_config {
        println!("{}", tessera_config::config_to_json(&config));
        return ExitCode::SUCCESS;
    }

    let directive = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.directive());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("tessera=info")))
        .init();

    tracing::info!("tessera-renderer v{} starting", env!("CARGO_PKG_VERSION"));

    match run(args, config).await {
        Ok(()) => {
            tracing::info!("shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "renderer failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: cli::Args, config: TesseraConfig) -> tessera_common::Result<()> {
    let token = tessera_common::new_token();
    let dispatcher = Dispatcher::headless(token.clone())
        .map(Arc::new)
        .map_err(|e| TesseraError::Renderer(format!("ui thread failed to start: {e}")))?;
    tracing::info!(toolkit = dispatcher.toolkit_name(), "dispatcher ready");

    let transport = match args.transport {
        Some(TransportArg::Tcp) => TransportKind::Tcp,
        Some(TransportArg::Uds) => TransportKind::Uds,
        None => config.bridge.transport,
    };
    let listener = bind(transport, args.socket_path.as_deref()).await?;
    let socket_path = listener.socket_path();

    let handshake = listener.handshake(&token)?;
    {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", handshake.to_line())?;
        stdout.flush()?;
    }
    tracing::info!(protocol = ?handshake.protocol, port = ?handshake.port, "handshake sent");

    let options = ServerOptions {
        max_message_bytes: config.bridge.max_message_bytes,
    };
    let server = tokio::spawn(server::serve(listener, Arc::clone(&dispatcher), options));

    let mut quit = dispatcher.quit_signal();
    tokio::select! {
        _ = quit.wait_for(|q| *q) => tracing::info!("quit request received"),
        reason = wait_for_stdin_shutdown() => tracing::info!(reason, "stdin shutdown"),
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
    }

    server.abort();
    if let Some(path) = socket_path {
        let _ = std::fs::remove_file(path);
    }
    Ok(())
}

async fn bind(transport: TransportKind, socket_path: Option<&str>) -> std::io::Result<Listener> {
    match transport {
        TransportKind::Tcp => Listener::bind_tcp().await,
        #[cfg(unix)]
        TransportKind::Uds => {
            let path = socket_path.map(Into::into).unwrap_or_else(|| {
                std::env::temp_dir().join(format!("tessera-{}.sock", std::process::id()))
            });
            Listener::bind_uds(path)
        }
        #[cfg(not(unix))]
        TransportKind::Uds => {
            let _ = socket_path;
            tracing::warn!("uds transport unavailable on this platform, using tcp");
            Listener::bind_tcp().await
        }
    }
}

/// Resolves when stdin yields `shutdown` or closes.
async fn wait_for_stdin_shutdown() -> &'static str {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim() == "shutdown" => return "shutdown command",
            Ok(Some(line)) => tracing::debug!(line = %line, "ignoring stdin line"),
            Ok(None) => return "stdin closed",
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                return "stdin error";
            }
        }
    }
}
