use crate::args::KeyArgs;
use anyhow::Context;
use keepsake_logger::LogSettings;
use keepsake_session::{CipherMode, SessionConfig, load_config};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Configuration file layout shared with services embedding keepsake.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub session: SessionConfig,
    pub log: LogSettings,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            log: LogSettings { level: DEFAULT_LOG_LEVEL.to_owned(), ..LogSettings::default() },
        }
    }
}

impl CliConfig {
    /// Loads `path` with `KEEPSAKE__*` overrides, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        load_config(path).with_context(|| format!("Failed to load config {}", path.display()))
    }

    /// The key from `--key`, then `session.encryption_key`.
    pub fn key<'a>(&'a self, keys: &'a KeyArgs) -> Option<&'a str> {
        keys.key.as_deref().or(self.session.encryption_key.as_deref())
    }

    pub const fn mode(&self, keys: &KeyArgs) -> CipherMode {
        if keys.authenticated { CipherMode::Authenticated } else { self.session.cipher }
    }
}
