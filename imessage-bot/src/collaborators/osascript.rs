//! Outbound transport through the Messages app, driven by `osascript`.

use std::path::Path;

use anyhow::{bail, Context};
use async_trait::async_trait;
use relay_core::{MessageSender, ServiceKind};
use tokio::process::Command;
use tracing::{error, info};

/// Sends with AppleScript. Only works on macOS with Messages signed in.
#[derive(Debug, Clone, Default)]
pub struct OsaScriptSender;

impl OsaScriptSender {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, script: &str) -> anyhow::Result<()> {
        let mut command = Command::new("osascript");
        command.arg("-e").arg(script);
        run_to_completion(command).await
    }
}

/// Waits for `command` to exit successfully. The child is killed if the returned future is
/// dropped, so a timed-out send leaves no process behind.
async fn run_to_completion(mut command: Command) -> anyhow::Result<()> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();
    let output = command
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("failed to spawn {}", program))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(
            program = %program,
            status = %output.status,
            stderr = %stderr.trim(),
            "Send script failed"
        );
        bail!("{} exited with {}: {}", program, output.status, stderr.trim());
    }
    Ok(())
}

/// Quotes `value` as an AppleScript string literal.
pub fn apple_script_literal(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Only iMessage is addressed as such; everything else goes out as SMS.
fn service_type(service: &ServiceKind) -> &'static str {
    match service {
        ServiceKind::IMessage => "iMessage",
        _ => "SMS",
    }
}

fn script(recipient: &str, service: &ServiceKind, payload: &str) -> String {
    format!(
        "tell application \"Messages\"\n\
         \tset targetService to first service whose service type is {}\n\
         \tset targetBuddy to buddy {} of targetService\n\
         \tsend {} to targetBuddy\n\
         end tell",
        service_type(service),
        apple_script_literal(recipient),
        payload
    )
}

#[async_trait]
impl MessageSender for OsaScriptSender {
    async fn send_text(&self, recipient: &str, text: &str, service: &ServiceKind) -> anyhow::Result<()> {
        info!(recipient = %recipient, service = %service, text_len = text.len(), "Sending message");
        self.run(&script(recipient, service, &apple_script_literal(text)))
            .await
    }

    async fn send_file(&self, recipient: &str, path: &Path, service: &ServiceKind) -> anyhow::Result<()> {
        if !path.is_file() {
            bail!("file not found: {}", path.display());
        }
        info!(recipient = %recipient, service = %service, path = %path.display(), "Sending file");
        let payload = format!("POSIX file {}", apple_script_literal(&path.to_string_lossy()));
        self.run(&script(recipient, service, &payload)).await
    }
}
