//! Subcommand handlers.
//!
//! Handlers open the matching page controller, drive it, and print the
//! result. Anything that can fail returns a [`PosError`]; the binary turns
//! it into a one-line message and a non-zero exit code.

mod analytics;
mod auth;
mod cashiers;
mod diagnostics;
mod menu;
mod orders;
mod print;
mod settings;

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::debug;

use crate::api::SupabaseStore;
use crate::cli::Command;
use crate::config::AppConfig;
use crate::db::DbState;
use crate::error::{PosError, PosResult};
use crate::receipt_renderer::LayoutConfig;
use crate::session::{Session, SessionStore};
use crate::store::PosData;

/// Everything a handler needs: resolved configuration and the local store.
pub struct AppContext {
    pub config: AppConfig,
    pub db: DbState,
}

impl AppContext {
    pub fn new(config: AppConfig, db: DbState) -> Self {
        Self { config, db }
    }

    pub fn sessions(&self) -> SessionStore<'_> {
        SessionStore::new(&self.db)
    }

    pub fn session(&self) -> PosResult<Option<Session>> {
        self.sessions().current()
    }

    /// Data facade over the hosted service.
    pub fn data(&self) -> PosResult<PosData> {
        let creds = self.config.require_credentials()?;
        let store = SupabaseStore::new(&creds.url, &creds.anon_key, self.config.http_timeout)?;
        debug!(url = %store.base_url(), "data service client ready");
        Ok(PosData::new(Arc::new(store)))
    }

    pub fn layout(&self) -> LayoutConfig {
        LayoutConfig {
            branding: self.config.branding.clone(),
            ..LayoutConfig::default()
        }
    }

    pub fn currency(&self) -> &str {
        &self.config.branding.currency_symbol
    }
}

pub async fn dispatch(ctx: &AppContext, command: Command) -> PosResult<()> {
    match command {
        Command::Login { input } => auth::login(ctx, input).await,
        Command::Logout => auth::logout(ctx),
        Command::Whoami => auth::whoami(ctx),
        Command::Configure(args) => settings::configure(args).await,
        Command::Status => diagnostics::status(ctx),
        Command::About => diagnostics::about(),
        Command::Dashboard => analytics::dashboard(ctx).await,
        Command::Foods(cmd) => menu::run(ctx, cmd).await,
        Command::Cashiers(cmd) => cashiers::run(ctx, cmd).await,
        Command::Orders(args) => orders::all_orders(ctx, args).await,
        Command::Order(args) => orders::new_order(ctx, args).await,
        Command::MyOrders(args) => orders::my_orders(ctx, args).await,
        Command::Receipt(args) => print::receipt(ctx, args).await,
    }
}

/// Read one trimmed line from stdin after printing `prompt`.
pub(crate) fn prompt_line(prompt: &str) -> PosResult<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask for confirmation unless `assume_yes`. Anything but y/yes declines.
pub(crate) fn confirm(prompt: &str, assume_yes: bool) -> PosResult<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = prompt_line(&format!("{prompt} [y/N] "))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Fit `value` into `width` columns, cutting with `..` when it is longer.
pub(crate) fn fit(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let kept: String = value.chars().take(width.saturating_sub(2)).collect();
    format!("{kept}..")
}

pub(crate) fn cancelled() -> PosError {
    PosError::validation("Cancelled")
}
