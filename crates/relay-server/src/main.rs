//! Key-relay server entry point.
//!
//! Loads the config, builds the relay for the configured backend, then serves
//! the `KeyInput` gRPC service until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ resolve_config_path() / load_config_from()
//!  └─ build_relay()            -- mapping table + backend adapter
//!  └─ KeyInputService::new()   -- worker permits
//!  └─ serve()                  -- until Ctrl-C
//!       └─ Send / SendUp / SendDown -> RelayService::dispatch
//! ```
//!
//! # Usage
//!
//! ```text
//! key-relay [--print-config] [CONFIG_PATH]
//! ```
//!
//! Without a path the config comes from `KEY_RELAY_CONFIG`, then the
//! platform config directory.  `RUST_LOG` overrides `server.log_level`.
//! `--print-config` writes the effective config as TOML and exits, which is
//! a convenient way to start a config file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use relay_server::infrastructure::backend::build_relay;
use relay_server::infrastructure::rpc::{serve, KeyInputService};
use relay_server::infrastructure::storage::config::{
    load_config_from, render_config, resolve_config_path,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args: Vec<_> = std::env::args_os().skip(1).collect();
    let print_config = match args.iter().position(|a| a == "--print-config") {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    };

    let path = resolve_config_path(args.into_iter().next().map(PathBuf::from))?;
    let config = load_config_from(&path)
        .with_context(|| format!("loading config from {}", path.display()))?;
    if print_config {
        print!("{}", render_config(&config)?);
        return Ok(());
    }

    // Initialise structured logging.
    let fallback = config.server.log_level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();

    info!(config = %path.display(), "key relay starting");

    let relay = build_relay(&config).context("initializing relay")?;
    let addr = config.server.socket_addr()?;
    let service = KeyInputService::new(Arc::new(relay), config.server.max_workers);

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => {
                error!("cannot listen for Ctrl-C: {e}; running until killed");
                std::future::pending::<()>().await;
            }
        }
    };

    serve(service, addr, shutdown).await?;

    info!("key relay stopped");
    Ok(())
}
