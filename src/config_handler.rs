use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use tracing::log;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    pub base_url: String,
    pub game_code: String,

    #[serde(default="default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default="default_confirmation_ms")]
    pub confirmation_ms: u64,

    #[serde(default)]
    pub share_url: Option<String>,
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_confirmation_ms() -> u64 {
    5000
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation(&self) -> Duration {
        Duration::from_millis(self.confirmation_ms)
    }

    /// Address handed out by the share action.
    pub fn page_url(&self) -> String {
        match &self.share_url {
            Some(url) => url.clone(),
            None => format!("{}/{}", self.base_url.trim_end_matches('/'), self.game_code),
        }
    }
}

pub fn get_config() -> anyhow::Result<Config> {
    let path = std::env::var("CONFIG_PATH").ok()
        .unwrap_or_else(|| "./deployment/config.json".to_string());
    let mut result = read_config(&path)?;
    if let Ok(game_code) = std::env::var("GAME_CODE") {
        result.game_code = game_code;
        log::info!("[CONFIG] GAME_CODE {}", result.game_code);
    }
    if let Ok(base_url) = std::env::var("SCOREBOARD_URL") {
        result.base_url = base_url;
        log::info!("[CONFIG] SCOREBOARD_URL {}", result.base_url);
    }
    log::info!("[CONFIG] {:?}", result);
    Ok(result)
}

pub fn read_config(path: &str) -> anyhow::Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Unable to read config at {path}"))?;
    let config: Config = serde_json::from_str(&data)
        .with_context(|| format!("Could not parse JSON at {path}!"))?;
    if config.poll_interval_ms == 0 {
        anyhow::bail!("poll_interval_ms must be positive in {path}");
    }
    Ok(config)
}
