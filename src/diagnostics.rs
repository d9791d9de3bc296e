//! Diagnostics for the terminal.
//!
//! Provides:
//! - **About info**: version, build timestamp, git SHA, platform
//! - **System health**: local store schema, session, data-service
//!   configuration with secrets redacted
//! - **Log rotation helpers**: used by `lib.rs` to keep the log directory small

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::{AppConfig, CredentialSource};
use crate::db::DbState;
use crate::error::{PosError, PosResult};
use crate::session::Session;

/// Prefix of the rolling log files written by `lib.rs`.
pub const LOG_FILE_PREFIX: &str = "pos.log";

/// Maximum number of log files to retain.
pub const MAX_LOG_FILES: usize = 10;

pub fn get_about_info() -> Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "buildTimestamp": env!("BUILD_TIMESTAMP"),
        "gitSha": env!("BUILD_GIT_SHA"),
        "platform": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "rustVersion": env!("CARGO_PKG_RUST_VERSION"),
    })
}

// ---------------------------------------------------------------------------
// System health
// ---------------------------------------------------------------------------

fn credential_source_label(source: CredentialSource) -> &'static str {
    match source {
        CredentialSource::Environment => "environment",
        CredentialSource::ConnectionString => "connection_string",
        CredentialSource::Keyring => "keyring",
    }
}

/// Local health snapshot for `pos status`. Secrets are redacted.
pub fn get_system_health(
    db: &DbState,
    config: &AppConfig,
    session: Option<&Session>,
) -> PosResult<Value> {
    let schema_version: i64 = {
        let conn = db
            .conn
            .lock()
            .map_err(|e| PosError::Local(format!("db lock poisoned: {e}")))?;
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?
    };
    let db_size = fs::metadata(&db.db_path).map(|m| m.len()).unwrap_or(0);

    let data_service = match &config.credentials {
        Some(c) => json!({
            "configured": true,
            "url": c.url,
            "source": credential_source_label(c.source),
            "anon_key": c.anon_key,
        }),
        None => json!({ "configured": false }),
    };

    let health = json!({
        "schemaVersion": schema_version,
        "dbPath": db.db_path.to_string_lossy(),
        "dbSizeBytes": db_size,
        "dataDir": config.data_dir.to_string_lossy(),
        "logDir": config.logs_dir().to_string_lossy(),
        "httpTimeoutSecs": config.http_timeout.as_secs(),
        "session": session.map(|s| s.display_name().to_string()),
        "dataService": data_service,
    });
    Ok(redact_sensitive_fields(health))
}

fn redact_sensitive_fields(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, value) in map {
                if should_redact_key(&key) {
                    redacted.insert(key, Value::String("[REDACTED]".to_string()));
                } else {
                    redacted.insert(key, redact_sensitive_fields(value));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => {
            Value::Array(items.into_iter().map(redact_sensitive_fields).collect())
        }
        other => other,
    }
}

fn should_redact_key(key: &str) -> bool {
    let normalized = key.to_ascii_lowercase();
    let sensitive_markers = [
        "anon_key",
        "api_key",
        "apikey",
        "secret",
        "password",
        "token",
        "authorization",
    ];
    sensitive_markers
        .iter()
        .any(|marker| normalized.contains(marker))
}

// ---------------------------------------------------------------------------
// Log rotation
// ---------------------------------------------------------------------------

/// Prune old log files in `log_dir`, keeping only the most recent `MAX_LOG_FILES`.
pub fn prune_old_logs(log_dir: &Path) {
    if !log_dir.exists() {
        return;
    }

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    if let Ok(entries) = fs::read_dir(log_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if name.starts_with(LOG_FILE_PREFIX) {
                        let modified = entry
                            .metadata()
                            .ok()
                            .and_then(|m| m.modified().ok())
                            .unwrap_or(std::time::UNIX_EPOCH);
                        log_files.push((path, modified));
                    }
                }
            }
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to prune log file {}: {e}", path.display());
        }
    }
}
