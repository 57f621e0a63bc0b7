//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RelayConfig;

#[derive(Parser)]
#[command(name = "imessage-relay")]
#[command(about = "iMessage relay CLI", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay (config from env; flags override CHAT_DB_PATH, ATTACHMENTS_DIR, DRY_RUN).
    Run {
        #[arg(long)]
        chat_db: Option<PathBuf>,
        #[arg(long)]
        attachments_dir: Option<PathBuf>,
        /// Log replies instead of sending them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the most recent rows of the chat database and exit.
    Inspect {
        #[arg(short, long, default_value_t = 10)]
        rows: i64,
        #[arg(long)]
        chat_db: Option<PathBuf>,
    },
}

/// Load RelayConfig from environment, then apply command-line overrides.
pub fn load_config(
    chat_db: Option<PathBuf>,
    attachments_dir: Option<PathBuf>,
    dry_run: bool,
) -> Result<RelayConfig> {
    Ok(RelayConfig::load()?.with_overrides(chat_db, attachments_dir, dry_run))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_flags() {
        let cli = Cli::parse_from([
            "imessage-relay",
            "run",
            "--chat-db",
            "/tmp/chat.db",
            "--dry-run",
        ]);
        match cli.command {
            Commands::Run {
                chat_db,
                attachments_dir,
                dry_run,
            } => {
                assert_eq!(chat_db, Some(PathBuf::from("/tmp/chat.db")));
                assert_eq!(attachments_dir, None);
                assert!(dry_run);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn inspect_defaults_to_ten_rows() {
        let cli = Cli::parse_from(["imessage-relay", "inspect"]);
        match cli.command {
            Commands::Inspect { rows, chat_db } => {
                assert_eq!(rows, 10);
                assert!(chat_db.is_none());
            }
            _ => panic!("expected inspect"),
        }
    }
}
