use crate::accessor::{Accessor, DEFAULT_NAMESPACE};
use crate::error::{SessionError, SessionErrorExt};
use crate::state::SessionState;
use config::{Config, Environment, File};
use keepsake_codec::CipherMode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Prefix of environment overrides, e.g. `KEEPSAKE__SESSION__ENCRYPTION_KEY`.
pub const ENV_PREFIX: &str = "KEEPSAKE";

const DEFAULT_LIFETIME_MINUTES: u64 = 24;

/// Session section of a keepsake configuration file.
///
/// ```toml
/// [session]
/// namespace = "app"
/// encryption_key = "change-me"
/// bind_user_agent = true
/// cipher = "authenticated"
/// lifetime_minutes = 24
/// save_path = "/var/lib/keepsake"
/// ```
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub namespace: String,
    pub encryption_key: Option<String>,
    pub bind_user_agent: bool,
    pub cipher: CipherMode,
    pub lifetime_minutes: u64,
    pub save_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            encryption_key: None,
            bind_user_agent: false,
            cipher: CipherMode::default(),
            lifetime_minutes: DEFAULT_LIFETIME_MINUTES,
            save_path: None,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("namespace", &self.namespace)
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "<redacted>"))
            .field("bind_user_agent", &self.bind_user_agent)
            .field("cipher", &self.cipher)
            .field("lifetime_minutes", &self.lifetime_minutes)
            .field("save_path", &self.save_path)
            .finish()
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_minutes.saturating_mul(60))
    }

    /// An accessor over `state` bound to the configured namespace.
    #[must_use]
    pub fn accessor(&self, state: &SessionState) -> Accessor {
        Accessor::with_namespace(state, self.namespace.as_str())
    }

    /// # Errors
    /// Returns [`SessionError::Configuration`] for an empty namespace, an empty
    /// encryption key, a zero lifetime, or `bind_user_agent` without a key.
    pub fn validate(&self) -> Result<(), SessionError> {
        let invalid = |message: &'static str| {
            Err(SessionError::Configuration { message: message.into(), context: None })
        };

        if self.namespace.trim().is_empty() {
            return invalid("Session namespace cannot be empty");
        }
        if self.encryption_key.as_deref().is_some_and(str::is_empty) {
            return invalid("Encryption key cannot be empty; omit it to disable encryption");
        }
        if self.bind_user_agent && self.encryption_key.is_none() {
            return invalid("bind_user_agent requires an encryption key");
        }
        if self.lifetime_minutes == 0 {
            return invalid("lifetime_minutes must be greater than zero");
        }

        Ok(())
    }
}

/// Loads a configuration file layered with `KEEPSAKE__*` environment overrides.
///
/// Nested keys use double underscores: `KEEPSAKE__SESSION__NAMESPACE` maps to
/// `session.namespace`. The file format follows the extension (`.toml`, `.json`, `.yaml`).
///
/// # Errors
/// Returns [`SessionError::Config`] if the file is missing or does not match `T`.
///
/// # Example
/// ```rust,no_run
/// use keepsake_session::{SessionConfig, load_config};
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     #[serde(default)]
///     session: SessionConfig,
/// }
///
/// let cfg: AppConfig = load_config("keepsake.toml").unwrap_or_default();
/// ```
pub fn load_config<T>(path: impl AsRef<Path>) -> Result<T, SessionError>
where
    T: DeserializeOwned,
{
    load(path.as_ref(), None)
}

/// Like [`load_config`], but takes the `KEEPSAKE__*` overrides from `vars` instead of the
/// process environment.
///
/// # Errors
/// Returns [`SessionError::Config`] if the file is missing or does not match `T`.
pub fn load_config_with_env<T, K, V>(
    path: impl AsRef<Path>,
    vars: impl IntoIterator<Item = (K, V)>,
) -> Result<T, SessionError>
where
    T: DeserializeOwned,
    K: Into<String>,
    V: Into<String>,
{
    let vars = vars.into_iter().map(|(key, value)| (key.into(), value.into())).collect();
    load(path.as_ref(), Some(vars))
}

fn load<T>(path: &Path, vars: Option<config::Map<String, String>>) -> Result<T, SessionError>
where
    T: DeserializeOwned,
{
    let env = Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .convert_case(config::Case::Snake)
        .source(vars);
    let builder = Config::builder().add_source(File::from(path).required(true)).add_source(env);

    info!("Loading config from {}", path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
