pub mod args;
pub mod handlers;
pub mod settings;

use crate::args::{Cli, Command};
use crate::settings::CliConfig;
use clap::Parser;
use keepsake_logger::Logger;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = CliConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        cfg.log.level = level;
    }

    let _log = Logger::builder().name(env!("CARGO_PKG_NAME")).settings(&cfg.log)?.init()?;

    match cli.command {
        Command::Encrypt { keys } => handlers::encrypt(&cfg, &keys)?,
        Command::Decrypt { keys, blob } => handlers::decrypt(&cfg, &keys, blob)?,
        Command::Inspect { keys, root, id, namespace, whole, path } => {
            let scope = if whole {
                handlers::View::Whole
            } else {
                handlers::View::Namespace(namespace)
            };
            handlers::inspect(&cfg, &keys, root, &id, scope, path.as_deref()).await?;
        },
    }

    Ok(())
}
