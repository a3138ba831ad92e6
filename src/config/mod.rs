//! Application configuration

pub mod bot;

use std::env;

use serde::{Deserialize, Serialize};

pub use bot::{BotProfile, ConfigError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Directory the client application is served from.
    pub web_root: String,
    /// Path to the bot profile TOML file.
    pub bot_profile_path: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            web_root: env::var("WEB_ROOT").unwrap_or_else(|_| "./build".into()),
            bot_profile_path: env::var("BOT_PROFILE")
                .unwrap_or_else(|_| "configs/bot.toml".into()),
        })
    }
}
