use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Display)]
pub enum SError {
    /// Transport failure talking to the catalog. Retryable.
    #[display("catalog lookup failed: {_0}")]
    CatalogLookupFailed(String),
    /// The catalog answered but had no entry for the id.
    #[display("unknown mod id: {_0}")]
    UnknownId(String),
    /// The store rejected a save because the collection changed underneath us.
    #[display("collection was modified concurrently: {_0}")]
    PersistenceConflict(String),
    #[display("mod not found: {_0}")]
    NotFound(String),
    #[display("invalid mod id: {_0:?}")]
    InvalidId(String),
    #[display("io error: {_0}")]
    IOError(String),
    #[display("parse error: {_0}")]
    ParseError(String),
    #[display("config error: {_0}")]
    ConfigError(String),
    #[display("async runtime error: {_0}")]
    AsyncRuntimeError(String),
}

impl SError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SError::CatalogLookupFailed(_))
    }
}

impl std::error::Error for SError {}

impl From<std::io::Error> for SError {
    fn from(e: std::io::Error) -> Self {
        SError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for SError {
    fn from(e: serde_json::Error) -> Self {
        SError::ParseError(e.to_string())
    }
}

impl From<quick_xml::DeError> for SError {
    fn from(e: quick_xml::DeError) -> Self {
        SError::ParseError(e.to_string())
    }
}

impl From<confy::ConfyError> for SError {
    fn from(e: confy::ConfyError) -> Self {
        SError::ConfigError(e.to_string())
    }
}

impl From<tokio::task::JoinError> for SError {
    fn from(e: tokio::task::JoinError) -> Self {
        SError::AsyncRuntimeError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_catalog_transport_failures_are_retryable() {
        assert!(SError::CatalogLookupFailed("timeout".into()).is_retryable());
        assert!(!SError::UnknownId("X".into()).is_retryable());
        assert!(!SError::PersistenceConflict("c1".into()).is_retryable());
        assert!(!SError::NotFound("X".into()).is_retryable());
    }

    #[test]
    fn display_names_the_offending_id() {
        assert_eq!(SError::NotFound("ABC".into()).to_string(), "mod not found: ABC");
    }

    #[test]
    fn io_errors_convert() {
        let err: SError = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
        assert!(matches!(err, SError::IOError(msg) if msg.contains("disk gone")));
    }
}
