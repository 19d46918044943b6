mod common;
mod config;
mod error;
mod network;
mod session;
mod ui;

use std::error::Error;

use clap::{Parser, Subcommand};
use common::{ChannelSink, ConnectionState};
use config::AppConfig;
use dotenvy::dotenv;
use network::SessionClient;
use session::render::DisplayRecord;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use ui::ChatApp;

#[derive(Parser)]
#[command(name = "ws_chat", version, about = "Minimal WebSocket chat client")]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// WebSocket endpoint, e.g. ws://localhost:8000/ws
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
    /// Name sent along with every message
    #[arg(long, value_name = "NAME")]
    user: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Run without a window: stdin lines are sent, messages are printed
    Terminal {
        /// Print each message as an HTML list item
        #[arg(long)]
        html: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env();
    app_config.apply_overrides(cli.endpoint, cli.user);

    match cli.mode {
        Some(Mode::Terminal { html }) => run_terminal(app_config, html).await,
        None => run_desktop(app_config),
    }
}

async fn run_terminal(app_config: AppConfig, html: bool) -> Result<(), Box<dyn Error>> {
    let endpoint = app_config.endpoint.clone();
    let mut session = SessionClient::connect(app_config, move |record: DisplayRecord| {
        if html {
            println!("{}", record.to_html());
        } else {
            println!(
                "[{}] {}: {}",
                record.posted_at_text, record.author_text, record.body_text
            );
        }
    })?;

    let status = session
        .wait_until(|status| status.state == ConnectionState::Open || status.state.is_terminal())
        .await;
    eprintln!("* {endpoint}: {}", status.state);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if let Err(err) = session.send(&line, None) {
                        eprintln!("! {err}");
                    }
                }
                None => break,
            },
            status = session.ended() => {
                let detail = status.detail.unwrap_or_default();
                eprintln!("! session {} {detail}", status.state);
                return Ok(());
            }
        }
    }

    session.close();
    let status = session.ended().await;
    if status.state == ConnectionState::Failed {
        log::warn!("Session ended in failure: {:?}", status.detail);
    }
    Ok(())
}

fn run_desktop(app_config: AppConfig) -> Result<(), Box<dyn Error>> {
    // 1. Tạo kênh giao tiếp (Channel)
    // Network -> UI
    let (record_tx, record_rx) = mpsc::unbounded_channel();

    let endpoint = app_config.endpoint.clone();
    let username = app_config.username.clone();

    // 2. Khởi chạy Network Task (Chạy ngầm)
    let session = SessionClient::connect(app_config, ChannelSink::new(record_tx))?;
    log::info!("Session {} started against {endpoint}", session.id());

    // 3. Khởi chạy UI (Chạy trên Main Thread)
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "WebSocket Chat",
        options,
        Box::new(move |cc| {
            Ok(Box::new(ChatApp::new(
                cc, endpoint, username, session, record_rx,
            )))
        }),
    )?;
    Ok(())
}
