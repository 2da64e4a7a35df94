//! Process configuration, read once from the environment at startup.

use anyhow::{bail, Context};

#[derive(Clone)]
pub struct AppConfig {
    pub discord: DiscordConfig,
    pub server: ServerConfig,
    /// Path of the panel configuration snapshot.
    pub store_path: String,
}

#[derive(Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub client_id: String,
}

#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// The bot cannot run without a token and an application id; everything
    /// else falls back to a default.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let token = match std::env::var("DISCORD_TOKEN") {
            Ok(value) if !value.trim().is_empty() => value,
            _ => bail!("DISCORD_TOKEN is not set"),
        };
        let client_id = match std::env::var("DISCORD_CLIENT_ID") {
            Ok(value) if !value.trim().is_empty() => value,
            _ => bail!("DISCORD_CLIENT_ID is not set"),
        };
        let port = match std::env::var("SERVER_PORT") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("invalid SERVER_PORT {:?}", value))?,
            Err(_) => 5000,
        };
        Ok(AppConfig {
            discord: DiscordConfig { token, client_id },
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port,
            },
            store_path: std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.json".to_string()),
        })
    }
}
