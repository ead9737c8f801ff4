//! Greenhouse - entry point.
//!
//! Loads configuration, installs logging, and serves the plant API until
//! SIGINT or SIGTERM.

use std::path::PathBuf;

use anyhow::Context;
use greenhouse::config::ConfigLoader;
use greenhouse::core::Logger;
use greenhouse::server::Server;
use greenhouse::telemetry::init_logging;
use greenhouse::{build_handler, server_config, VERSION};

/// The only flag is `--config <PATH>`; everything else comes from the
/// environment (`API_HOST`, `API_PORT`, `API_ROOT_PREFIX`,
/// `GREENHOUSE__SECTION__KEY`, `RUST_LOG`).
fn config_path(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<PathBuf>> {
    match (args.next().as_deref(), args.next(), args.next()) {
        (None, _, _) => Ok(None),
        (Some("--config"), Some(path), None) => Ok(Some(PathBuf::from(path))),
        _ => anyhow::bail!("usage: greenhouse [--config <PATH>]"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_file = config_path(std::env::args().skip(1))?;

    let mut loader = ConfigLoader::new().with_dotenv()?;
    if let Some(path) = &config_file {
        loader = loader
            .with_file(path)
            .with_context(|| format!("load configuration from {}", path.display()))?;
    }
    let (config, fallbacks) = loader.load_with_fallbacks().context("load configuration")?;

    init_logging(&config.logging.to_log_config()).context("initialise logging")?;

    let logger = Logger::new();
    for fallback in &fallbacks {
        logger.warn(fallback);
    }
    logger.info(format_args!("starting greenhouse v{VERSION}"));

    let handler = build_handler(&config, logger.clone());
    Server::new(server_config(&config), handler, logger.clone())
        .run()
        .await
        .context("serve")?;

    logger.info("greenhouse stopped");
    Ok(())
}
