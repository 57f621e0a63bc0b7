//! Base config: message store, attachments root, logging, loop timing. Loaded from env.

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Base config: paths and timings of the polling loop.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// CHAT_DB_PATH
    pub chat_db_path: PathBuf,
    /// ATTACHMENTS_DIR
    pub attachments_dir: PathBuf,
    /// Log file path
    pub log_file: String,
    /// Sleep between polls
    pub poll_interval: Duration,
    /// Pause between two groups of one poll; keeps clear of the Messages app's own writes
    pub group_pause: Duration,
    /// SQLite busy timeout for the read-only store connection
    pub store_busy_timeout: Duration,
    /// Longest wait on one collaborator call
    pub collaborator_timeout: Duration,
    /// How often resolved attachment paths are forgotten; zero keeps them for the process
    pub attachment_cache_refresh: Duration,
    /// Log replies instead of sending them
    pub dry_run: bool,
}

/// Expands a leading `~/` against the home directory; other paths are returned as is.
pub fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs_next::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str) -> bool {
    env::var(key)
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

impl BaseConfig {
    /// Load from environment variables.
    pub fn load() -> Result<Self> {
        let chat_db_path = expand_home(
            &env::var("CHAT_DB_PATH").unwrap_or_else(|_| "~/Library/Messages/chat.db".to_string()),
        );
        let attachments_dir = expand_home(
            &env::var("ATTACHMENTS_DIR")
                .unwrap_or_else(|_| "~/Library/Messages/Attachments".to_string()),
        );
        let log_file =
            env::var("LOG_FILE").unwrap_or_else(|_| "logs/imessage-relay.log".to_string());

        Ok(Self {
            chat_db_path,
            attachments_dir,
            log_file,
            poll_interval: Duration::from_millis(env_u64("POLL_INTERVAL_MS", 1000)),
            group_pause: Duration::from_millis(env_u64("GROUP_PAUSE_MS", 100)),
            store_busy_timeout: Duration::from_millis(env_u64("STORE_BUSY_TIMEOUT_MS", 5000)),
            collaborator_timeout: Duration::from_secs(env_u64("COLLABORATOR_TIMEOUT_SECS", 120)),
            attachment_cache_refresh: Duration::from_secs(env_u64(
                "ATTACHMENT_CACHE_REFRESH_SECS",
                3600,
            )),
            dry_run: env_bool("RELAY_DRY_RUN"),
        })
    }

    /// Validate config: non-zero timings and an existing store file.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("POLL_INTERVAL_MS must be greater than 0");
        }
        if self.store_busy_timeout.is_zero() {
            anyhow::bail!("STORE_BUSY_TIMEOUT_MS must be greater than 0");
        }
        if self.collaborator_timeout.is_zero() {
            anyhow::bail!("COLLABORATOR_TIMEOUT_SECS must be greater than 0");
        }
        if !self.chat_db_path.is_file() {
            anyhow::bail!(
                "CHAT_DB_PATH does not point to a database file: {}",
                self.chat_db_path.display()
            );
        }
        Ok(())
    }
}
