mod connection;
mod playlist;
mod session;
mod view;

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use crate::connection::ConnectionEvent;
use crate::session::Session;
use crate::view::{LogView, View};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = gmu_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("remote.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("gmu-remote log: {}", log_path.display());

    tracing::info!("gmu-remote starting…");

    let config = gmu_proto::config::Config::load().unwrap_or_default();

    // ── Connection task (server ↔ session) ──────────────────────────────────
    let (event_tx, mut event_rx) = mpsc::channel::<ConnectionEvent>(64);
    let (cmd_tx, cmd_rx) = mpsc::channel::<String>(64);
    let _connection = connection::start_client(
        config.connection.endpoint.clone(),
        Duration::from_millis(config.connection.reconnect_delay_ms),
        event_tx,
        cmd_rx,
    );

    let mut session = Session::new(
        config.connection.wire_format,
        &config.playlist,
        cmd_tx,
        LogView,
    );

    // ── Event loop: server events + console commands ────────────────────────
    let mut console = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(event) => session.handle_event(event).await,
                None => break,
            },
            line = console.next_line(), if console_open => match line {
                Ok(Some(line)) => {
                    if !handle_console_line(&mut session, line.trim()).await {
                        break;
                    }
                }
                Ok(None) => console_open = false,
                Err(e) => {
                    warn!("console read error: {}", e);
                    console_open = false;
                }
            },
        }
    }

    tracing::info!("gmu-remote shutting down");
    Ok(())
}

/// Console commands stand in for the original's buttons and scrollbar.
/// Returns false when the user asked to quit.
async fn handle_console_line<V: View>(session: &mut Session<V>, line: &str) -> bool {
    let (verb, arg) = match line.split_once(' ') {
        Some((verb, arg)) => (verb, Some(arg.trim())),
        None => (line, None),
    };
    match (verb, arg) {
        ("", None) => {}
        ("play", None) => session.play().await,
        ("play", Some(arg)) => match arg.parse() {
            Ok(position) => session.play_item(position).await,
            Err(_) => eprintln!("usage: play [position]"),
        },
        ("pause", None) => session.pause().await,
        ("stop", None) => session.stop().await,
        ("next", None) => session.next().await,
        ("prev", None) => session.prev().await,
        ("login", Some(password)) => session.login(password.to_string()).await,
        ("scroll", Some(arg)) => match arg.parse() {
            Ok(offset) => session.scroll_to(offset).await,
            Err(_) => eprintln!("usage: scroll <pixels>"),
        },
        ("quit", None) | ("exit", None) => return false,
        _ => eprintln!(
            "commands: play [n], pause, stop, next, prev, login <password>, scroll <px>, quit"
        ),
    }
    true
}
