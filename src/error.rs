//! Error taxonomy shared by every layer of the POS.
//!
//! Data-service and local-store failures abort the current operation and are
//! surfaced to the operator as a single notification line. Validation and
//! authentication failures are raised before any persistence call so the
//! caller's state is left exactly as it was.

use thiserror::Error;

pub type PosResult<T> = Result<T, PosError>;

#[derive(Debug, Error)]
pub enum PosError {
    /// Network, HTTP status, or decoding failure talking to the hosted data service.
    #[error("{0}")]
    DataService(String),

    /// Local SQLite session store failure.
    #[error("local store: {0}")]
    Local(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid password or cashier not found")]
    InvalidCredentials,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PosError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn data_service(msg: impl Into<String>) -> Self {
        Self::DataService(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// True for failures raised before any persistence call was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<rusqlite::Error> for PosError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Local(err.to_string())
    }
}

impl From<serde_json::Error> for PosError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataService(format!("Invalid JSON: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_operator_facing() {
        assert_eq!(
            PosError::InvalidCredentials.to_string(),
            "Invalid password or cashier not found"
        );
        assert_eq!(PosError::NotFound("Order".into()).to_string(), "Order not found");
        assert!(PosError::validation("Please add items").is_validation());
        assert!(!PosError::NotAuthenticated.is_validation());
    }
}
