//! # CLI Argument Definitions
//!
//! Every subcommand reads its key material from flags first and falls back to the
//! `[session]` section of the file passed with `--config`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "keepsake")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Encrypt, decrypt and inspect keepsake session blobs")]
pub struct Cli {
    /// Configuration file with `[session]` and `[log]` sections
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level for stderr output (overrides `log.level`)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Key material shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct KeyArgs {
    /// Encryption key (falls back to `session.encryption_key`)
    #[arg(short, long)]
    pub key: Option<String>,

    /// Client User-Agent the session is bound to
    #[arg(short, long)]
    pub user_agent: Option<String>,

    /// Use the authenticated AES-256-GCM blob format
    #[arg(long)]
    pub authenticated: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encrypt stdin into a printable session blob
    Encrypt {
        #[command(flatten)]
        keys: KeyArgs,
    },
    /// Decrypt a session blob to stdout
    Decrypt {
        #[command(flatten)]
        keys: KeyArgs,
        /// The blob to decrypt (read from stdin when omitted)
        blob: Option<String>,
    },
    /// Load a stored session and print it as JSON
    Inspect {
        #[command(flatten)]
        keys: KeyArgs,
        /// Session directory (falls back to `session.save_path`)
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Session id
        #[arg(long)]
        id: String,
        /// Namespace to print (falls back to `session.namespace`)
        #[arg(short, long)]
        namespace: Option<String>,
        /// Print the whole payload instead of a single namespace
        #[arg(short, long, conflicts_with = "namespace")]
        whole: bool,
        /// Dotted path to print, relative to the selected namespace
        #[arg(short, long)]
        path: Option<String>,
    },
}
