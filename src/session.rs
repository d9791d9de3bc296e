//! Session state: who is acting on this terminal.
//!
//! The session is persisted in the local `local_settings` table under two
//! mutually exclusive markers (`session/is_admin`, `session/active_cashier`)
//! and has no expiry; it lasts until an explicit logout. Controllers receive
//! the decoded [`Session`] value instead of reading the markers themselves.

use serde::Serialize;
use tracing::{info, warn};

use crate::db::{self, DbState};
use crate::error::{PosError, PosResult};
use crate::models::{Cashier, PaymentType};

/// Shared administrator secret. Compared case-sensitively.
pub const ADMIN_PASSWORD: &str = "admin123";

const SESSION_CATEGORY: &str = "session";
const KEY_IS_ADMIN: &str = "is_admin";
const KEY_ACTIVE_CASHIER: &str = "active_cashier";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", content = "cashier", rename_all = "snake_case")]
pub enum Session {
    Administrator,
    Cashier(Cashier),
}

impl Session {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Administrator)
    }

    pub fn cashier(&self) -> Option<&Cashier> {
        match self {
            Self::Cashier(c) => Some(c),
            Self::Administrator => None,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Administrator => "Administrator",
            Self::Cashier(c) => &c.name,
        }
    }

    /// Payment methods this session may record. Administrators take no orders.
    pub fn allowed_payment_types(&self) -> &'static [PaymentType] {
        match self {
            Self::Administrator => &[],
            Self::Cashier(c) => c.cashier_type.allowed_payment_types(),
        }
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Any logged-in session. `None` means "go to login".
pub fn require_session(session: Option<&Session>) -> PosResult<&Session> {
    session.ok_or(PosError::NotAuthenticated)
}

/// Administrator-only pages: cashiers, foods, all orders.
pub fn require_admin(session: Option<&Session>) -> PosResult<()> {
    match require_session(session)? {
        Session::Administrator => Ok(()),
        Session::Cashier(_) => Err(PosError::forbidden(
            "This page is only available to the administrator",
        )),
    }
}

/// Cashier-only pages: new order, my orders.
pub fn require_cashier(session: Option<&Session>) -> PosResult<&Cashier> {
    match require_session(session)? {
        Session::Cashier(c) => Ok(c),
        Session::Administrator => Err(PosError::forbidden(
            "Please switch to cashier mode first",
        )),
    }
}

// ---------------------------------------------------------------------------
// Login policy
// ---------------------------------------------------------------------------

pub fn is_admin_secret(input: &str) -> bool {
    input == ADMIN_PASSWORD
}

/// Resolve a login input against the active cashiers.
///
/// Matches the name case-insensitively or the id exactly. When several
/// cashiers share a name the first one in `cashiers` order wins.
pub fn match_cashier<'a>(input: &str, cashiers: &'a [Cashier]) -> Option<&'a Cashier> {
    let lowered = input.to_lowercase();
    cashiers
        .iter()
        .filter(|c| c.is_active)
        .find(|c| c.name.to_lowercase() == lowered || c.id == input)
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Reads and writes the two session markers.
pub struct SessionStore<'a> {
    db: &'a DbState,
}

impl<'a> SessionStore<'a> {
    pub fn new(db: &'a DbState) -> Self {
        Self { db }
    }

    fn lock(&self) -> PosResult<std::sync::MutexGuard<'a, rusqlite::Connection>> {
        self.db
            .conn
            .lock()
            .map_err(|e| PosError::Local(format!("db lock poisoned: {e}")))
    }

    /// Decode the current session. A corrupt cashier marker counts as absent.
    pub fn current(&self) -> PosResult<Option<Session>> {
        let conn = self.lock()?;
        if db::get_setting(&conn, SESSION_CATEGORY, KEY_IS_ADMIN).as_deref() == Some("true") {
            return Ok(Some(Session::Administrator));
        }
        let Some(raw) = db::get_setting(&conn, SESSION_CATEGORY, KEY_ACTIVE_CASHIER) else {
            return Ok(None);
        };
        match serde_json::from_str::<Cashier>(&raw) {
            Ok(cashier) => Ok(Some(Session::Cashier(cashier))),
            Err(e) => {
                warn!(error = %e, "active cashier marker is unreadable, ignoring");
                Ok(None)
            }
        }
    }

    /// Persist `session`, setting exactly one marker and clearing the other.
    pub fn save(&self, session: &Session) -> PosResult<()> {
        let conn = self.lock()?;
        match session {
            Session::Administrator => {
                db::set_setting(&conn, SESSION_CATEGORY, KEY_IS_ADMIN, "true")?;
                db::delete_setting(&conn, SESSION_CATEGORY, KEY_ACTIVE_CASHIER)?;
            }
            Session::Cashier(cashier) => {
                let encoded = serde_json::to_string(cashier)
                    .map_err(|e| PosError::Local(format!("encode cashier: {e}")))?;
                db::set_setting(&conn, SESSION_CATEGORY, KEY_ACTIVE_CASHIER, &encoded)?;
                db::delete_setting(&conn, SESSION_CATEGORY, KEY_IS_ADMIN)?;
            }
        }
        info!(role = %session.display_name(), "session stored");
        Ok(())
    }

    /// Clear both markers.
    pub fn clear(&self) -> PosResult<()> {
        let conn = self.lock()?;
        db::delete_setting(&conn, SESSION_CATEGORY, KEY_IS_ADMIN)?;
        db::delete_setting(&conn, SESSION_CATEGORY, KEY_ACTIVE_CASHIER)?;
        info!("session cleared");
        Ok(())
    }
}
