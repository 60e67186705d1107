//! Environment-driven bot configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Add settings database path and prompt wait default
//! - 1.0.0: Initial implementation with token, prefix, and owners

use anyhow::{Context, Result};
use serenity::model::id::UserId;
use std::collections::HashSet;
use std::env;

/// Default command prefix when `COMMAND_PREFIX` is unset
pub const DEFAULT_PREFIX: &str = "!";

/// Default seconds an argument prompt waits for a reply
pub const DEFAULT_PROMPT_WAIT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// `None` means the bot only answers to mentions
    pub command_prefix: Option<String>,
    pub owners: HashSet<UserId>,
    pub log_level: String,
    /// SQLite file for persisted settings; in-memory settings when absent
    pub settings_database_path: Option<String>,
    pub unknown_command_response: bool,
    pub prompt_wait_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// `.env` loading is the caller's job (the bot binary uses dotenvy).
    pub fn from_env() -> Result<Self> {
        let discord_token =
            env::var("DISCORD_TOKEN").context("DISCORD_TOKEN must be set in the environment")?;

        let command_prefix = match env::var("COMMAND_PREFIX") {
            Ok(prefix) if prefix.trim().is_empty() => None,
            Ok(prefix) => Some(prefix.trim().to_string()),
            Err(_) => Some(DEFAULT_PREFIX.to_string()),
        };

        let owners = parse_owners(&env::var("BOT_OWNERS").unwrap_or_default())?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let settings_database_path = env::var("SETTINGS_DATABASE_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty());

        let unknown_command_response = match env::var("UNKNOWN_COMMAND_RESPONSE") {
            Ok(value) => parse_bool(&value)
                .with_context(|| format!("UNKNOWN_COMMAND_RESPONSE is not a boolean: {value}"))?,
            Err(_) => true,
        };

        let prompt_wait_secs = match env::var("DEFAULT_PROMPT_WAIT_SECS") {
            Ok(value) => value
                .trim()
                .parse()
                .with_context(|| format!("DEFAULT_PROMPT_WAIT_SECS is not a number: {value}"))?,
            Err(_) => DEFAULT_PROMPT_WAIT_SECS,
        };

        Ok(Self {
            discord_token,
            command_prefix,
            owners,
            log_level,
            settings_database_path,
            unknown_command_response,
            prompt_wait_secs,
        })
    }
}

/// Parse a comma-separated list of user ids
pub fn parse_owners(raw: &str) -> Result<HashSet<UserId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<u64>()
                .map(UserId)
                .with_context(|| format!("Invalid owner id in BOT_OWNERS: {id}"))
        })
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
