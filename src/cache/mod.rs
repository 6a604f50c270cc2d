//! Name ↔ address cache
//!
//! Confirmed pairs from either resolution direction, queryable both ways.
//!
//! ## Semantics
//!
//! - At most one record per address; re-resolving an address to a different
//!   name overwrites the stored name (last-resolved-wins).
//! - Names are not unique. When several addresses share a name, lookups by
//!   name return the most recently updated mapping.
//! - Storage failures surface as [`NamebridgeError::Storage`](crate::NamebridgeError)
//!   and are never reported as a miss.

mod memory;
mod mongo;

pub use memory::InMemoryNameAddressCache;
pub use mongo::MongoNameAddressCache;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chain::Address;
use crate::types::Result;

/// A confirmed name/address pair
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameAddressRecord {
    pub address: Address,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistent bidirectional cache of name/address pairs
#[async_trait::async_trait]
pub trait NameAddressCache: Send + Sync {
    async fn get_address_by_name(&self, name: &str) -> Result<Option<Address>>;

    async fn get_name_by_address(&self, address: &Address) -> Result<Option<String>>;

    /// Create the mapping, or overwrite the name of an existing one
    async fn upsert(&self, address: &Address, name: &str) -> Result<NameAddressRecord>;

    async fn delete_by_address(&self, address: &Address) -> Result<bool>;

    async fn delete_by_name(&self, name: &str) -> Result<bool>;

    async fn list_all(&self) -> Result<Vec<NameAddressRecord>>;
}
