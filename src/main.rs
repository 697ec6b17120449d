mod api;
mod common;
mod config;
mod network;
mod ui;

use clap::Parser;
use dotenvy::dotenv;
use tokio::sync::mpsc;

use api::Backend;
use network::SocketClient;
use ui::ChatApp;

#[derive(Parser)]
#[command(
    name = "rust_pair_chat",
    version,
    about = "Desktop client for the two-user realtime chat"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Backend base URL (overrides config file and BACKEND_URL)
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);
    let backend_url = cli
        .backend_url
        .or_else(|| std::env::var("BACKEND_URL").ok())
        .unwrap_or(app_config.backend_url);
    log::info!("Using backend {backend_url}");

    // 1. Tạo các kênh giao tiếp (Channels)
    // UI -> Network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    // 2. Khởi chạy task WebSocket (chạy ngầm, idle tới khi user login)
    let socket = SocketClient::new(&backend_url, event_tx.clone(), cmd_rx);
    tokio::spawn(socket.run());

    // 3. Khởi chạy UI (chạy trên Main Thread). Các task REST/upload do UI
    // spawn qua runtime handle này.
    let backend = Backend::new(backend_url);
    let runtime = tokio::runtime::Handle::current();
    let options = eframe::NativeOptions::default();
    let mut event_rx = Some(event_rx);

    eframe::run_native(
        "Pair Chat",
        options,
        Box::new(move |cc| {
            let event_receiver = event_rx
                .take()
                .expect("ChatApp should only be initialized once");

            Ok(Box::new(ChatApp::new(
                cc,
                backend.clone(),
                runtime.clone(),
                cmd_tx.clone(),
                event_tx.clone(),
                event_receiver,
            )))
        }),
    )
}
