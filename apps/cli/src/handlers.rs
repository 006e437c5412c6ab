use crate::args::KeyArgs;
use crate::settings::CliConfig;
use anyhow::{Context, Result, bail};
use keepsake_codec::Codec;
use keepsake_session::{Accessor, LoadOutcome, SessionHandler, SessionId, fingerprint};
use keepsake_store::FileStore;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Reads stdin to the end and writes one blob line to stdout.
///
/// # Errors
/// Fails without a key, or if stdin or stdout are unavailable.
pub fn encrypt(cfg: &CliConfig, keys: &KeyArgs) -> Result<()> {
    let codec = build_codec(cfg, keys)?;

    let mut plaintext = Vec::new();
    io::stdin().read_to_end(&mut plaintext).context("Failed to read stdin")?;

    let blob = codec.encrypt(&plaintext)?;
    debug!(bytes = plaintext.len(), blob_len = blob.len(), "Encrypted stdin");

    writeln!(io::stdout().lock(), "{blob}").context("Failed to write stdout")
}

/// Decrypts `blob` (or stdin) and writes the raw plaintext to stdout.
///
/// # Errors
/// Fails without a key, or if the blob is malformed or was written under another key.
pub fn decrypt(cfg: &CliConfig, keys: &KeyArgs, blob: Option<String>) -> Result<()> {
    let codec = build_codec(cfg, keys)?;

    let blob = match blob {
        Some(blob) => blob,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
            text
        },
    };

    let plaintext = codec.decrypt(blob.trim()).context("Blob cannot be decrypted with this key")?;

    let mut out = io::stdout().lock();
    out.write_all(&plaintext).context("Failed to write stdout")?;
    out.flush().context("Failed to flush stdout")
}

/// Part of a loaded session that `inspect` prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Every namespace.
    Whole,
    /// One namespace; `None` means the configured `session.namespace`.
    Namespace(Option<String>),
}

/// Loads one session from a file store and prints it (or a part of it) as JSON.
///
/// # Errors
/// Fails if the directory is missing, the id is invalid, nothing is stored under the id,
/// or the stored data cannot be decrypted.
pub async fn inspect(
    cfg: &CliConfig,
    keys: &KeyArgs,
    root: Option<PathBuf>,
    id: &str,
    view: View,
    path: Option<&str>,
) -> Result<()> {
    let root = root
        .or_else(|| cfg.session.save_path.clone())
        .context("No session directory: pass --root or set session.save_path")?;
    let id = SessionId::new(id)?;

    let store = FileStore::builder()
        .root(&root)
        .create(false)
        .lifetime(cfg.session.lifetime())
        .connect()
        .await
        .with_context(|| format!("Cannot open session directory {}", root.display()))?;

    let mut builder = SessionHandler::builder().store(store).mode(cfg.mode(keys));
    if let Some(key) = cfg.key(keys) {
        builder = builder.encryption_key(key);
        if let Some(client) = client(cfg, keys) {
            builder = builder.fingerprint(fingerprint(client));
        }
    }
    let handler = builder.build()?;

    let loaded = handler.load(&id).await?;
    match loaded.outcome {
        LoadOutcome::Fresh => bail!("No stored data for session '{id}'"),
        LoadOutcome::Discarded => {
            bail!("Stored data for session '{id}' cannot be decrypted with this key")
        },
        LoadOutcome::Restored => info!(session = %id, keys = loaded.state.len(), "Session restored"),
    }

    let view = match view {
        View::Whole => Accessor::root(&loaded.state),
        View::Namespace(Some(name)) => Accessor::with_namespace(&loaded.state, name),
        View::Namespace(None) => cfg.session.accessor(&loaded.state),
    };
    let value = match path {
        Some(path) => view.get(path).unwrap_or(Value::Null),
        None => Value::Object(view.all()),
    };

    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &value)?;
    writeln!(out).context("Failed to write stdout")
}

fn build_codec(cfg: &CliConfig, keys: &KeyArgs) -> Result<Codec> {
    let Some(key) = cfg.key(keys) else {
        bail!("No encryption key: pass --key or set session.encryption_key");
    };

    let mut builder = Codec::builder().secret(key).mode(cfg.mode(keys));
    if let Some(client) = client(cfg, keys) {
        builder = builder.fingerprint(fingerprint(client));
    }

    Ok(builder.build()?)
}

/// The client value to fingerprint: `--user-agent`, or the empty agent when the
/// configuration binds sessions to one.
fn client<'a>(cfg: &CliConfig, keys: &'a KeyArgs) -> Option<&'a str> {
    keys.user_agent.as_deref().or_else(|| cfg.session.bind_user_agent.then_some(""))
}
