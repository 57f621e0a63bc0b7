//! RelayConfig: BaseConfig + PipelineTuning. Use load() for env-based loading.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{BaseConfig, PipelineTuning};

/// Relay config: BaseConfig + tuning. Use RelayConfig::load() for env-based loading.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub base: BaseConfig,
    pub tuning: PipelineTuning,
}

impl RelayConfig {
    /// Load full config from environment variables.
    /// Call validate() after load to check config before init.
    pub fn load() -> Result<Self> {
        let base = BaseConfig::load()?;
        let tuning = PipelineTuning::with_collaborator_timeout(base.collaborator_timeout);
        Ok(Self { base, tuning })
    }

    /// Validate config. Call after load() to fail fast before init.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()
    }

    /// Applies command-line overrides on top of the env values.
    pub fn with_overrides(
        mut self,
        chat_db: Option<PathBuf>,
        attachments_dir: Option<PathBuf>,
        dry_run: bool,
    ) -> Self {
        if let Some(path) = chat_db {
            self.base.chat_db_path = path;
        }
        if let Some(dir) = attachments_dir {
            self.base.attachments_dir = dir;
        }
        self.base.dry_run |= dry_run;
        self
    }

    pub fn base(&self) -> &BaseConfig {
        &self.base
    }
    pub fn tuning(&self) -> &PipelineTuning {
        &self.tuning
    }

    // --- Base config getters ---
    pub fn chat_db_path(&self) -> &Path {
        &self.base.chat_db_path
    }
    pub fn attachments_dir(&self) -> &Path {
        &self.base.attachments_dir
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn poll_interval(&self) -> Duration {
        self.base.poll_interval
    }
    pub fn group_pause(&self) -> Duration {
        self.base.group_pause
    }
    pub fn store_busy_timeout(&self) -> Duration {
        self.base.store_busy_timeout
    }
    pub fn attachment_cache_refresh(&self) -> Duration {
        self.base.attachment_cache_refresh
    }
    pub fn dry_run(&self) -> bool {
        self.base.dry_run
    }
}
