//! namebridge - name/address identity resolution
//!
//! Maps human-readable names (ENS-style) to chain addresses and back for the
//! builder directory, and reads the on-chain FriendManager social graph.
//!
//! ## Components
//!
//! - **Cache**: confirmed name/address pairs in MongoDB, queryable both ways
//! - **Resolvers**: ENS over JSON-RPC, with a profile-search fallback for reverse lookups
//! - **Directory**: lazily provisioned builder records for newly discovered names
//! - **Onchain**: read-only FriendManager client
//! - **Identity**: the resolution service and batch reconciliation of relationship sets

pub mod cache;
pub mod chain;
pub mod config;
pub mod db;
pub mod directory;
pub mod identity;
pub mod onchain;
pub mod resolvers;
pub mod types;

pub use config::Args;
pub use identity::{IdentityResolutionService, ResolutionConfig, ResolvedMember};
pub use types::{NamebridgeError, Result};
