/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Running Bitfinex feeds with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bitfinex_ws_feed::FeedConfig;

#[derive(Parser, Debug)]
#[command(name = "bitfinex-ws-feed", version, about = "Bitfinex WebSocket feed runner")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: PathBuf,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    info!(
        config_path = %args.config_path.display(),
        dry_run = args.dry_run,
        "starting bitfinex-ws-feed"
    );

    let config = load_config(&args.config_path)?;
    config.validate().context("validate config")?;
    info!(
        subscriptions = config.public.subscriptions.len(),
        trading = config.trading.is_some(),
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    spawn_shutdown_listener(shutdown.clone());

    bitfinex_ws_feed::run(config, shutdown)
        .await
        .context("run feeds")?;
    info!("shutdown complete");

    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level)
        .with_context(|| format!("log level filter `{log_level}` rejected"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("install feed log subscriber")?;
    Ok(())
}

fn load_config(path: &Path) -> Result<FeedConfig> {
    let Some(path_str) = path.to_str() else {
        bail!("feed config path {} is not utf-8", path.display());
    };
    FeedConfig::from_file(path_str).with_context(|| format!("read feed config {path_str}"))
}

/// Cancels `shutdown` on the first ctrl-c or (on unix) SIGTERM.
fn spawn_shutdown_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let signal = tokio::select! {
            res = tokio::signal::ctrl_c() => match res {
                Ok(()) => "ctrl-c",
                Err(err) => {
                    warn!(error = %err, "ctrl-c listener unavailable, feeds stop only on SIGTERM");
                    terminate().await
                }
            },
            name = terminate() => name,
        };
        info!(signal, "stopping feeds");
        shutdown.cancel();
    });
}

#[cfg(unix)]
async fn terminate() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
            "SIGTERM"
        }
        Err(err) => {
            warn!(error = %err, "SIGTERM listener unavailable");
            std::future::pending().await
        }
    }
}

#[cfg(not(unix))]
async fn terminate() -> &'static str {
    std::future::pending().await
}
