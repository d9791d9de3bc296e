//! Restaurant POS
//!
//! Cashier login, menu and cashier management, order entry, order history,
//! a sales dashboard and receipt printing. All shared state lives in a hosted
//! PostgREST data service; the terminal only keeps its session markers in a
//! local SQLite database.
//!
//! The `pos` binary is a thin command line front end over the page
//! controllers in [`pages`].

use clap::Parser;
use std::path::Path;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub mod api;
pub mod cart;
pub mod checkout;
pub mod cli;
mod commands;
pub mod config;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod fetch;
pub mod models;
pub mod money;
pub mod pages;
pub mod print;
pub mod receipt_renderer;
pub mod session;
pub mod stats;
pub mod storage;
pub mod store;

use crate::cli::Cli;
use crate::commands::AppContext;
use crate::config::AppConfig;
use crate::error::PosResult;

const DEFAULT_LOG_FILTER: &str = "info,restaurant_pos_lib=debug";

/// Install the tracing subscriber: env filter, stderr console layer, and a
/// daily rolling file under `log_dir`. The returned guard flushes the file
/// writer when dropped.
fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // Command output goes to stdout; the console only shows problems unless
    // RUST_LOG asks for more.
    let console_level = if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        LevelFilter::TRACE
    } else {
        LevelFilter::WARN
    };
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(console_level);

    diagnostics::prune_old_logs(log_dir);
    let (file_layer, guard) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(log_dir, diagnostics::LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    if installed.is_ok() && guard.is_none() {
        warn!(dir = %log_dir.display(), "log directory unavailable, file logging disabled");
    }
    guard
}

/// Parse the command line, set up logging and the local store, and run the
/// requested subcommand to completion.
pub fn run() -> PosResult<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.overrides())?;
    let _log_guard = init_logging(&config.logs_dir());
    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "Starting Restaurant POS"
    );

    let db = db::init(&config.data_dir)?;
    let ctx = AppContext::new(config, db);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(commands::dispatch(&ctx, cli.command))
}
