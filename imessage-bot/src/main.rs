//! Binary for the iMessage relay. Replies are sent through osascript, or only logged in dry-run.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use imessage_bot::{
    load_config, offline_collaborators, run_relay, Cli, Commands, LogSender, OsaScriptSender,
};
use relay_core::MessageSender;
use storage::ChatDbReader;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            chat_db,
            attachments_dir,
            dry_run,
        } => {
            let config = load_config(chat_db, attachments_dir, dry_run)?;
            run_relay(config, |config| {
                let sender: Arc<dyn MessageSender> = if config.dry_run() {
                    Arc::new(LogSender::new())
                } else {
                    Arc::new(OsaScriptSender::new())
                };
                offline_collaborators(sender)
            })
            .await
        }
        Commands::Inspect { rows, chat_db } => {
            let config = load_config(chat_db, None, false)?;
            let reader =
                ChatDbReader::open(config.chat_db_path(), config.store_busy_timeout()).await?;
            for record in reader.recent_rows(rows).await? {
                println!(
                    "{:>8}  {:<24}  {:<8}  {}",
                    record.id,
                    record.sender,
                    record.service.as_deref().unwrap_or("-"),
                    record
                        .text_content()
                        .or(record.attachment_name.as_deref())
                        .unwrap_or("")
                );
            }
            Ok(())
        }
    }
}
