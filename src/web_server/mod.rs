//! Liveness page. Hosting platforms ping this to keep the process awake.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::{routing::get, Router};
use log::{error, info, warn};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::shared::state::StatusState;

const PAGE_HEAD: &str = r#"<html>
    <head>
        <title>Discord Ticket Bot - Status</title>
        <style>
            body {
                font-family: Arial, sans-serif;
                background: #0d1117;
                color: #c9d1d9;
                display: flex;
                justify-content: center;
                align-items: center;
                height: 100vh;
                margin: 0;
            }
            .container {
                text-align: center;
                padding: 40px;
                background: #161b22;
                border-radius: 10px;
                box-shadow: 0 0 20px rgba(0,0,0,0.5);
            }
            h1 { color: #58a6ff; }
            .status {
                color: #3fb950;
                font-size: 24px;
                font-weight: bold;
                margin: 20px 0;
            }
            .info {
                margin: 10px 0;
                color: #8b949e;
            }
        </style>
    </head>"#;

/// Binds and serves until the process exits. A port already in use gets one
/// retry on the next port up.
pub async fn run(server: ServerConfig, status: Arc<StatusState>) -> std::io::Result<()> {
    let app = Router::new().route("/", get(status_page)).with_state(status);
    let addr = format!("{}:{}", server.host, server.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            let fallback = format!("{}:{}", server.host, server.port + 1);
            warn!("port {} already in use, trying {}", server.port, fallback);
            match TcpListener::bind(&fallback).await {
                Ok(listener) => listener,
                Err(err) => {
                    error!("failed to bind {}: {}", fallback, err);
                    return Err(err);
                }
            }
        }
        Err(err) => {
            error!("failed to bind {}: {}", addr, err);
            return Err(err);
        }
    };
    if let Ok(local) = listener.local_addr() {
        info!("HTTP server listening on {}", local);
    }
    axum::serve(listener, app.into_make_service()).await
}

async fn status_page(State(status): State<Arc<StatusState>>) -> Html<String> {
    Html(render(&status))
}

fn render(status: &StatusState) -> String {
    let bot_status = if status.online() { "Online ✅" } else { "Offline ❌" };
    let bot_name = status.bot_tag().unwrap_or_else(|| "N/A".to_string());
    format!(
        r#"{head}
    <body>
        <div class="container">
            <h1>🤖 Discord Ticket Bot - Multi-Painel</h1>
            <div class="status">✅ Sistema Online!</div>
            <div class="info">Bot Status: {bot_status}</div>
            <div class="info">Bot Name: {bot_name}</div>
            <div class="info">Servers: {guilds}</div>
            <div class="info">Uptime: {uptime}s</div>
            <p style="margin-top: 30px; color: #8b949e;">Powered by 7M Store</p>
        </div>
    </body>
</html>"#,
        head = PAGE_HEAD,
        bot_status = bot_status,
        bot_name = bot_name,
        guilds = status.guild_count(),
        uptime = status.uptime_secs(),
    )
}
