//! Runtime configuration.
//!
//! Resolved once at startup from the environment, the OS credential store and
//! command line overrides. The data-service credentials are looked up in
//! order: `POS_SUPABASE_URL` + `POS_SUPABASE_ANON_KEY`, then
//! `POS_CONNECTION_STRING`, then the credential store.

use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::api;
use crate::error::{PosError, PosResult};
use crate::storage;

pub const ENV_SUPABASE_URL: &str = "POS_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "POS_SUPABASE_ANON_KEY";
pub const ENV_CONNECTION_STRING: &str = "POS_CONNECTION_STRING";
pub const ENV_DATA_DIR: &str = "POS_DATA_DIR";
pub const ENV_HTTP_TIMEOUT: &str = "POS_HTTP_TIMEOUT_SECS";
pub const ENV_RESTAURANT_NAME: &str = "POS_RESTAURANT_NAME";
pub const ENV_RESTAURANT_SHORT_NAME: &str = "POS_RESTAURANT_SHORT_NAME";
pub const ENV_CURRENCY_SYMBOL: &str = "POS_CURRENCY_SYMBOL";

const APP_IDENTIFIER: &str = "com.restaurant.pos";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;

/// Header and footer text printed on receipts.
#[derive(Debug, Clone, PartialEq)]
pub struct Branding {
    pub restaurant_name: String,
    /// Used in the merchant copy label, e.g. `SHABAN COPY`.
    pub short_name: String,
    pub address_lines: Vec<String>,
    pub phone: String,
    pub currency_symbol: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            restaurant_name: "SHABAN RESTAURANT".to_string(),
            short_name: "SHABAN".to_string(),
            address_lines: vec!["Farawa Kwanar Yashi".to_string(), "Kano, Nigeria".to_string()],
            phone: "Tel: 0803 XXX XXXX".to_string(),
            currency_symbol: "₦".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    ConnectionString,
    Keyring,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCredentials {
    pub url: String,
    pub anon_key: String,
    pub source: CredentialSource,
}

/// Command line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub http_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub http_timeout: Duration,
    pub branding: Branding,
    pub credentials: Option<ServiceCredentials>,
}

impl AppConfig {
    pub fn load(overrides: &ConfigOverrides) -> PosResult<Self> {
        let data_dir = match &overrides.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        let timeout_secs = match overrides.http_timeout_secs {
            Some(secs) => secs,
            None => match env_var(ENV_HTTP_TIMEOUT) {
                Some(raw) => raw.parse::<u64>().map_err(|_| {
                    PosError::Config(format!("{ENV_HTTP_TIMEOUT} must be a whole number of seconds"))
                })?,
                None => DEFAULT_HTTP_TIMEOUT_SECS,
            },
        };
        if timeout_secs == 0 {
            return Err(PosError::Config("HTTP timeout must be at least 1 second".into()));
        }

        let credentials = resolve_credentials(env_var, storage::stored_service_credentials);
        if let Some(c) = &credentials {
            debug!(source = ?c.source, url = %c.url, "data service credentials resolved");
        }

        Ok(Self {
            data_dir,
            http_timeout: Duration::from_secs(timeout_secs),
            branding: branding_from(env_var),
            credentials,
        })
    }

    pub fn require_credentials(&self) -> PosResult<&ServiceCredentials> {
        self.credentials.as_ref().ok_or_else(|| {
            PosError::Config(format!(
                "data service not configured: set {ENV_SUPABASE_URL} and {ENV_SUPABASE_ANON_KEY}, \
                 {ENV_CONNECTION_STRING}, or run `pos configure`"
            ))
        })
    }

    pub fn receipts_dir(&self) -> PathBuf {
        self.data_dir.join("receipts")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `$POS_DATA_DIR`, else `$XDG_DATA_HOME/<id>`, else `$HOME/.local/share/<id>`.
pub fn default_data_dir() -> PosResult<PathBuf> {
    if let Some(dir) = env_var(ENV_DATA_DIR) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = env_var("XDG_DATA_HOME") {
        return Ok(PathBuf::from(xdg).join(APP_IDENTIFIER));
    }
    let home = env_var("HOME")
        .or_else(|| env_var("USERPROFILE"))
        .ok_or_else(|| PosError::Config(format!("cannot locate a home directory; set {ENV_DATA_DIR}")))?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join(APP_IDENTIFIER))
}

pub fn resolve_credentials(
    env: impl Fn(&str) -> Option<String>,
    keyring: impl FnOnce() -> Option<(String, String)>,
) -> Option<ServiceCredentials> {
    if let (Some(url), Some(anon_key)) = (env(ENV_SUPABASE_URL), env(ENV_SUPABASE_ANON_KEY)) {
        return Some(ServiceCredentials {
            url: api::normalize_service_url(&url),
            anon_key,
            source: CredentialSource::Environment,
        });
    }
    if let Some((url, anon_key)) = env(ENV_CONNECTION_STRING)
        .as_deref()
        .and_then(api::parse_connection_string)
    {
        return Some(ServiceCredentials {
            url,
            anon_key,
            source: CredentialSource::ConnectionString,
        });
    }
    keyring().map(|(url, anon_key)| ServiceCredentials {
        url: api::normalize_service_url(&url),
        anon_key,
        source: CredentialSource::Keyring,
    })
}

fn branding_from(env: impl Fn(&str) -> Option<String>) -> Branding {
    let mut branding = Branding::default();
    if let Some(name) = env(ENV_RESTAURANT_NAME) {
        branding.restaurant_name = name;
    }
    if let Some(short) = env(ENV_RESTAURANT_SHORT_NAME) {
        branding.short_name = short;
    }
    if let Some(symbol) = env(ENV_CURRENCY_SYMBOL) {
        branding.currency_symbol = symbol;
    }
    branding
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn environment_beats_connection_string_and_keyring() {
        let env = env_of(&[
            (ENV_SUPABASE_URL, "abc.supabase.co"),
            (ENV_SUPABASE_ANON_KEY, "env-key"),
            (
                ENV_CONNECTION_STRING,
                r#"{"url":"https://other.supabase.co","key":"cs-key"}"#,
            ),
        ]);
        let creds = resolve_credentials(env, || panic!("keyring must not be consulted"))
            .expect("credentials");
        assert_eq!(creds.url, "https://abc.supabase.co");
        assert_eq!(creds.anon_key, "env-key");
        assert_eq!(creds.source, CredentialSource::Environment);
    }

    #[test]
    fn connection_string_then_keyring() {
        let env = env_of(&[(
            ENV_CONNECTION_STRING,
            r#"{"url":"https://other.supabase.co","key":"cs-key"}"#,
        )]);
        let creds = resolve_credentials(env, || None).expect("credentials");
        assert_eq!(creds.source, CredentialSource::ConnectionString);

        let creds = resolve_credentials(env_of(&[]), || {
            Some(("https://kr.supabase.co/".to_string(), "kr-key".to_string()))
        })
        .expect("credentials");
        assert_eq!(creds.source, CredentialSource::Keyring);
        assert_eq!(creds.url, "https://kr.supabase.co");

        assert!(resolve_credentials(env_of(&[]), || None).is_none());
    }

    #[test]
    fn branding_overrides() {
        let branding = branding_from(env_of(&[(ENV_CURRENCY_SYMBOL, "NGN ")]));
        assert_eq!(branding.currency_symbol, "NGN ");
        assert_eq!(branding.short_name, "SHABAN");
    }

    #[test]
    #[serial]
    fn load_reads_data_dir_and_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::env::set_var(ENV_DATA_DIR, dir.path());
        std::env::set_var(ENV_HTTP_TIMEOUT, "7");
        let cfg = AppConfig::load(&ConfigOverrides::default()).expect("load");
        assert_eq!(cfg.data_dir, dir.path());
        assert_eq!(cfg.http_timeout, Duration::from_secs(7));
        assert_eq!(cfg.receipts_dir(), dir.path().join("receipts"));

        let cfg = AppConfig::load(&ConfigOverrides {
            data_dir: Some(PathBuf::from("/tmp/override")),
            http_timeout_secs: Some(3),
        })
        .expect("load with overrides");
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/override"));
        assert_eq!(cfg.http_timeout, Duration::from_secs(3));

        std::env::set_var(ENV_HTTP_TIMEOUT, "soon");
        assert!(AppConfig::load(&ConfigOverrides::default()).is_err());

        std::env::remove_var(ENV_DATA_DIR);
        std::env::remove_var(ENV_HTTP_TIMEOUT);
    }
}
