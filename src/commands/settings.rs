use tracing::warn;

use crate::api;
use crate::cli::ConfigureArgs;
use crate::error::{PosError, PosResult};
use crate::storage;

/// Resolve the credentials given on the command line, falling back to the
/// ones already stored when only `--check` was passed.
fn credentials_from_args(args: &ConfigureArgs) -> PosResult<(String, String)> {
    if let Some(raw) = &args.connection_string {
        return api::parse_connection_string(raw).ok_or_else(|| {
            PosError::validation("Connection string must be JSON (or base64 JSON) with url and key")
        });
    }
    match (&args.url, &args.anon_key) {
        (Some(url), Some(key)) => Ok((api::normalize_service_url(url), key.trim().to_string())),
        (Some(_), None) => Err(PosError::validation("--anon-key is required with --url")),
        _ if args.check => storage::stored_service_credentials()
            .ok_or_else(|| PosError::Config("no stored data service credentials".into())),
        _ => Err(PosError::validation(
            "Pass --url and --anon-key, or --connection-string",
        )),
    }
}

pub async fn configure(args: ConfigureArgs) -> PosResult<()> {
    if args.reset {
        storage::factory_reset()?;
        println!("Stored credentials deleted");
        return Ok(());
    }

    let (url, key) = credentials_from_args(&args)?;
    let result = api::test_connectivity(&url, &key).await;
    match (&result.error, result.latency_ms) {
        (None, Some(ms)) => println!("Connected to {url} ({ms} ms)"),
        (None, None) => println!("Connected to {url}"),
        (Some(e), _) => {
            if args.check {
                return Err(PosError::data_service(e.clone()));
            }
            // stored anyway so the terminal can be set up ahead of the network
            warn!(error = %e, "storing credentials that failed the connectivity test");
            println!("Warning: connectivity test failed: {e}");
        }
    }
    if args.check {
        return Ok(());
    }

    storage::store_service_credentials(&url, &key)?;
    println!("Credentials stored in the OS credential store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    fn args() -> ConfigureArgs {
        ConfigureArgs {
            url: None,
            anon_key: None,
            connection_string: None,
            check: false,
            reset: false,
        }
    }

    #[test]
    fn url_and_key_are_normalized() {
        let a = ConfigureArgs {
            url: Some("abc.supabase.co/rest/v1/".into()),
            anon_key: Some(" key ".into()),
            ..args()
        };
        assert_eq!(
            credentials_from_args(&a).expect("creds"),
            ("https://abc.supabase.co".to_string(), "key".to_string())
        );
    }

    #[test]
    fn connection_string_takes_precedence() {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(r#"{"url":"https://abc.supabase.co","key":"k"}"#);
        let a = ConfigureArgs {
            connection_string: Some(encoded),
            ..args()
        };
        let (url, key) = credentials_from_args(&a).expect("creds");
        assert_eq!(url, "https://abc.supabase.co");
        assert_eq!(key, "k");

        let bad = ConfigureArgs {
            connection_string: Some("not a connection string".into()),
            ..args()
        };
        assert!(credentials_from_args(&bad).expect_err("bad").is_validation());
    }

    #[test]
    fn nothing_to_configure() {
        assert!(credentials_from_args(&args()).expect_err("empty").is_validation());
    }
}
