//! Shared error type and result alias
//!
//! Every component reports through [`NamebridgeError`]. "Not found" is never an
//! error here: lookups return `Option`/[`crate::resolvers::Lookup`] for absence so
//! callers can tell a confirmed miss apart from an outage.

/// Errors surfaced by the resolution subsystem
#[derive(Debug, thiserror::Error)]
pub enum NamebridgeError {
    /// Malformed address or name supplied by the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Naming service unreachable, timed out or returned garbage
    #[error("Resolver unavailable: {0}")]
    ResolverUnavailable(String),

    /// Social-graph contract call failed (RPC error, revert, bad return data)
    #[error("On-chain query failed: {0}")]
    OnchainQuery(String),

    /// Persistent store unavailable or rejected the operation
    #[error("Storage error: {0}")]
    Storage(String),

    /// Unique index violation on insert
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Invalid process configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NamebridgeError {
    /// HTTP status class the web layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            NamebridgeError::InvalidInput(_) => 400,
            NamebridgeError::ResolverUnavailable(_) | NamebridgeError::OnchainQuery(_) => 502,
            NamebridgeError::Storage(_) | NamebridgeError::DuplicateKey(_) => 503,
            NamebridgeError::Config(_) | NamebridgeError::Internal(_) => 500,
        }
    }

    /// Whether retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NamebridgeError::ResolverUnavailable(_)
                | NamebridgeError::OnchainQuery(_)
                | NamebridgeError::Storage(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NamebridgeError>;
