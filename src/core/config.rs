//! Environment-driven configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Classifier epochs, conversation cache size and media settings
//! - 1.0.0: Initial release with Discord/OpenAI credentials

use anyhow::{Context, Result};
use log::warn;
use std::str::FromStr;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_DATABASE_PATH: &str = "fefe.db";
pub const DEFAULT_CONVERSATION_CACHE_SIZE: usize = 200;
pub const DEFAULT_HISTORY_TURNS: usize = 5;
pub const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_CLASSIFIER_EPOCHS: usize = 50;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub database_path: String,
    pub log_level: String,
    /// Registers commands to a single guild for instant updates during development
    pub discord_guild_id: Option<String>,
    /// Capacity `N` for conversation eviction
    pub conversation_cache_size: usize,
    /// Number of past conversation records replayed into a completion
    pub history_turns: usize,
    pub reminder_interval_secs: u64,
    pub classifier_epochs: usize,
    pub youtube_api_key: Option<String>,
    pub ytdlp_path: String,
    /// External process that streams audio into a voice channel
    pub media_player_command: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            discord_token: std::env::var("DISCORD_TOKEN")
                .context("DISCORD_TOKEN environment variable is required")?,
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY environment variable is required")?,
            openai_model: env_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            database_path: env_or("DATABASE_PATH", DEFAULT_DATABASE_PATH),
            log_level: env_or("LOG_LEVEL", "info"),
            discord_guild_id: optional_env("DISCORD_GUILD_ID"),
            conversation_cache_size: parse_or_default(
                "CONVERSATION_CACHE_SIZE",
                std::env::var("CONVERSATION_CACHE_SIZE").ok(),
                DEFAULT_CONVERSATION_CACHE_SIZE,
            ),
            history_turns: parse_or_default(
                "CONVERSATION_HISTORY_TURNS",
                std::env::var("CONVERSATION_HISTORY_TURNS").ok(),
                DEFAULT_HISTORY_TURNS,
            ),
            reminder_interval_secs: parse_or_default(
                "REMINDER_INTERVAL_SECS",
                std::env::var("REMINDER_INTERVAL_SECS").ok(),
                DEFAULT_REMINDER_INTERVAL_SECS,
            )
            .max(1),
            classifier_epochs: parse_or_default(
                "CLASSIFIER_EPOCHS",
                std::env::var("CLASSIFIER_EPOCHS").ok(),
                DEFAULT_CLASSIFIER_EPOCHS,
            ),
            youtube_api_key: optional_env("YOUTUBE_API_KEY"),
            ytdlp_path: env_or("YTDLP_PATH", "yt-dlp"),
            media_player_command: optional_env("MEDIA_PLAYER_COMMAND"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank variables are both treated as absent
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Invalid value `{value}` for {key}, using default {default}");
                default
            }
        },
    }
}
