//! Login and logout.

use tracing::{info, warn};

use crate::error::{PosError, PosResult};
use crate::session::{self, Session, SessionStore};
use crate::store::PosData;

/// Resolve a login input to a session without persisting it.
///
/// The shared administrator secret is checked first; otherwise the input is
/// matched against the active cashiers by name or id.
pub async fn authenticate(data: &PosData, input: &str) -> PosResult<Session> {
    if input.trim().is_empty() {
        return Err(PosError::validation("Enter the admin password or your cashier name"));
    }
    if session::is_admin_secret(input) {
        return Ok(Session::Administrator);
    }
    let cashiers = data.active_cashiers().await?;
    match session::match_cashier(input, &cashiers) {
        Some(cashier) => Ok(Session::Cashier(cashier.clone())),
        None => {
            warn!(active_cashiers = cashiers.len(), "login rejected");
            Err(PosError::InvalidCredentials)
        }
    }
}

/// Authenticate and store the resulting session.
pub async fn login(data: &PosData, store: &SessionStore<'_>, input: &str) -> PosResult<Session> {
    let session = authenticate(data, input).await?;
    store.save(&session)?;
    match &session {
        Session::Administrator => info!("Admin login successful"),
        Session::Cashier(c) => info!(cashier = %c.name, "Welcome {}", c.name),
    }
    Ok(session)
}

pub fn logout(store: &SessionStore<'_>) -> PosResult<()> {
    store.clear()?;
    info!("Logged out successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::store::memory::MemoryStore;
    use crate::store::Table;
    use serde_json::json;
    use std::sync::Arc;

    async fn data() -> (Arc<MemoryStore>, PosData) {
        let store = Arc::new(MemoryStore::new());
        store
            .seed(
                Table::Cashiers,
                json!({ "id": "c-1", "name": "Musa", "type": "cash", "is_active": true }),
            )
            .await;
        store
            .seed(
                Table::Cashiers,
                json!({ "id": "c-2", "name": "Halima", "type": "transfer_pos", "is_active": false }),
            )
            .await;
        (store.clone(), PosData::new(store))
    }

    #[tokio::test]
    async fn admin_then_cashier_login_swaps_markers() {
        let (_, data) = data().await;
        let db = db::open_in_memory().expect("db");
        let sessions = SessionStore::new(&db);

        let admin = login(&data, &sessions, "admin123").await.expect("admin");
        assert!(admin.is_admin());
        assert_eq!(sessions.current().expect("read"), Some(Session::Administrator));

        let musa = login(&data, &sessions, "musa").await.expect("cashier");
        assert_eq!(musa.cashier().map(|c| c.id.as_str()), Some("c-1"));
        let current = sessions.current().expect("read").expect("session");
        assert!(!current.is_admin());
        assert_eq!(current.display_name(), "Musa");

        logout(&sessions).expect("logout");
        assert_eq!(sessions.current().expect("read"), None);
    }

    #[tokio::test]
    async fn rejected_logins_leave_the_session_alone() {
        let (_, data) = data().await;
        let db = db::open_in_memory().expect("db");
        let sessions = SessionStore::new(&db);
        sessions.save(&Session::Administrator).expect("seed session");

        assert!(matches!(
            login(&data, &sessions, "Admin123").await,
            Err(PosError::InvalidCredentials)
        ));
        // inactive cashiers cannot log in
        assert!(matches!(
            login(&data, &sessions, "Halima").await,
            Err(PosError::InvalidCredentials)
        ));
        assert!(login(&data, &sessions, "   ").await.expect_err("blank").is_validation());
        assert_eq!(sessions.current().expect("read"), Some(Session::Administrator));
    }

    #[tokio::test]
    async fn service_failure_surfaces_as_data_error() {
        let (store, data) = data().await;
        store.set_offline(true);
        assert!(matches!(
            authenticate(&data, "Musa").await,
            Err(PosError::DataService(_))
        ));
        // the admin secret needs no round trip
        assert!(authenticate(&data, "admin123").await.is_ok());
    }
}
