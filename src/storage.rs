//! Data-service credentials in the OS credential store.
//!
//! On Windows this uses the Credential Manager (via the `keyring` crate), on
//! macOS Keychain, and on Linux the Secret Service API.

use keyring::Entry;
use tracing::{info, warn};

use crate::error::{PosError, PosResult};

const SERVICE_NAME: &str = "restaurant-pos";

pub const KEY_SUPABASE_URL: &str = "supabase_url";
pub const KEY_SUPABASE_ANON_KEY: &str = "supabase_anon_key";

const ALL_KEYS: &[&str] = &[KEY_SUPABASE_URL, KEY_SUPABASE_ANON_KEY];

/// Retrieve a single credential. Returns `None` when the entry does not
/// exist or the platform store is unavailable.
pub fn get_credential(key: &str) -> Option<String> {
    let entry = match Entry::new(SERVICE_NAME, key) {
        Ok(e) => e,
        Err(e) => {
            warn!(key, error = %e, "keyring: failed to create entry");
            return None;
        }
    };
    match entry.get_password() {
        Ok(pw) => Some(pw).filter(|s| !s.trim().is_empty()),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(key, error = %e, "keyring: failed to read credential");
            None
        }
    }
}

pub fn set_credential(key: &str, value: &str) -> PosResult<()> {
    let entry = Entry::new(SERVICE_NAME, key).map_err(keyring_error)?;
    entry.set_password(value).map_err(keyring_error)?;
    Ok(())
}

/// Silently succeeds if the entry does not exist.
pub fn delete_credential(key: &str) -> PosResult<()> {
    let entry = Entry::new(SERVICE_NAME, key).map_err(keyring_error)?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(keyring_error(e)),
    }
}

fn keyring_error(e: keyring::Error) -> PosError {
    PosError::Config(format!("credential store: {e}"))
}

/// Stored `(url, anon key)` pair, when both are present.
pub fn stored_service_credentials() -> Option<(String, String)> {
    Some((
        get_credential(KEY_SUPABASE_URL)?,
        get_credential(KEY_SUPABASE_ANON_KEY)?,
    ))
}

/// Save the data-service endpoint and key after `pos configure`.
pub fn store_service_credentials(url: &str, anon_key: &str) -> PosResult<()> {
    if url.trim().is_empty() || anon_key.trim().is_empty() {
        return Err(PosError::validation(
            "Both the data service URL and the anon key are required",
        ));
    }
    set_credential(KEY_SUPABASE_URL, url.trim())?;
    set_credential(KEY_SUPABASE_ANON_KEY, anon_key.trim())?;
    info!(url = %url.trim(), "data service credentials stored");
    Ok(())
}

/// Delete every stored credential.
pub fn factory_reset() -> PosResult<()> {
    info!("deleting stored data service credentials");
    for key in ALL_KEYS {
        delete_credential(key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_are_rejected_before_touching_the_store() {
        let err = store_service_credentials("  ", "key").expect_err("blank url");
        assert!(err.is_validation());
        let err = store_service_credentials("https://x.supabase.co", "").expect_err("blank key");
        assert!(err.is_validation());
    }
}
