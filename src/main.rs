use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use log::{error, info};
use tokio::sync::mpsc;

use ticketbot::bot::{commands, TicketBot};
use ticketbot::channels::gateway::{self, GatewayEvent};
use ticketbot::channels::{ChannelProvider, DiscordProvider};
use ticketbot::config::AppConfig;
use ticketbot::panels::PanelStore;
use ticketbot::shared::state::StatusState;
use ticketbot::web_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let store = PanelStore::load(&config.store_path)
        .with_context(|| format!("could not load {}", config.store_path))?;

    let provider: Arc<dyn ChannelProvider> = Arc::new(DiscordProvider::new(
        &config.discord.token,
        &config.discord.client_id,
    ));
    let status = Arc::new(StatusState::new());

    // login check; a bad token should abort before anything is spawned
    let identity = provider
        .get_current_user()
        .await
        .context("login failed, check DISCORD_TOKEN")?;
    status.set_identity(&identity.id, &identity.tag());
    info!("authenticated as {}", identity.tag());

    info!("registering application commands");
    if let Err(err) = provider.register_commands(&commands::definitions()).await {
        error!("failed to register commands: {}", err);
    }

    let server = config.server.clone();
    let web_status = Arc::clone(&status);
    tokio::spawn(async move {
        if let Err(err) = web_server::run(server, web_status).await {
            error!("web server stopped: {}", err);
        }
    });

    let keepalive = Arc::clone(&status);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(300));
        tick.tick().await;
        loop {
            tick.tick().await;
            info!("keep-alive: serving {} guilds", keepalive.guild_count());
        }
    });

    let (events_tx, mut events_rx) = mpsc::channel::<GatewayEvent>(64);
    tokio::spawn(gateway::run(config.discord.token.clone(), events_tx));

    let mut bot = TicketBot::new(provider, store, status);
    tokio::spawn(async move {
        while let Some((name, payload)) = events_rx.recv().await {
            bot.handle_event(&name, payload).await;
        }
    });

    tokio::signal::ctrl_c().await.ok();
    info!("shutting down");
    Ok(())
}
