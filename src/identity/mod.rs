//! Identity resolution service
//!
//! Orchestrates the cache, the resolver chain, directory provisioning and the
//! social-graph client behind one entry point per operation.
//!
//! ## Resolver chain
//!
//! Address → name:
//! 1. cache
//! 2. naming service reverse lookup (forward-confirmed)
//! 3. profile search, only when enabled. A profile without a usable name maps
//!    the address to itself so the search is not repeated.
//!
//! Name → address:
//! 1. cache, by the name as given and then by its normalized form
//! 2. naming service forward lookup
//!
//! Each step either finds something (stop), finds nothing (next step) or fails
//! (propagate). Only the profile search folds its own failures into "nothing".

mod reconcile;

pub use reconcile::{AddressNamer, PendingRequestReconciler, ResolvedMember};

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{NameAddressCache, NameAddressRecord};
use crate::chain::{require_address, Address};
use crate::directory::{DirectoryProvisioner, DirectoryRecord};
use crate::onchain::{RelationshipCounts, RelationshipKind, SocialGraph};
use crate::resolvers::{normalize_name, Lookup, NamingService, ProfileMatch, ProfileSearch};
use crate::types::{NamebridgeError, Result};

/// Service-level tuning
#[derive(Debug, Clone)]
pub struct ResolutionConfig {
    /// Parallel address → name lookups during batch reconciliation
    pub resolve_concurrency: usize,
    /// Suffix appended to bare labels before cache and naming lookups
    pub default_suffix: String,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            resolve_concurrency: 8,
            default_suffix: "eth".to_string(),
        }
    }
}

/// Relationship sets for one address, each member resolved to a name if possible
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRelationshipView {
    pub address: Address,
    pub friends: Vec<ResolvedMember>,
    pub pending_sent: Vec<ResolvedMember>,
    pub pending_received: Vec<ResolvedMember>,
}

/// Where a name → address answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Cache,
    NamingService,
}

pub struct IdentityResolutionService {
    cache: Arc<dyn NameAddressCache>,
    naming: Arc<dyn NamingService>,
    profiles: Arc<dyn ProfileSearch>,
    provisioner: DirectoryProvisioner,
    graph: Option<Arc<dyn SocialGraph>>,
    config: ResolutionConfig,
}

impl IdentityResolutionService {
    pub fn new(
        cache: Arc<dyn NameAddressCache>,
        naming: Arc<dyn NamingService>,
        profiles: Arc<dyn ProfileSearch>,
        provisioner: DirectoryProvisioner,
        config: ResolutionConfig,
    ) -> Self {
        Self {
            cache,
            naming,
            profiles,
            provisioner,
            graph: None,
            config,
        }
    }

    /// Attach the social-graph client used by the relationship operations
    pub fn with_graph(mut self, graph: Arc<dyn SocialGraph>) -> Self {
        self.graph = Some(graph);
        self
    }

    fn graph(&self) -> Result<&dyn SocialGraph> {
        self.graph
            .as_deref()
            .ok_or_else(|| NamebridgeError::Config("social-graph client not configured".to_string()))
    }

    // =========================================================================
    // Address → name
    // =========================================================================

    /// Resolve a caller-supplied address string to a name
    pub async fn address_to_name(&self, address: &str) -> Result<Lookup<String>> {
        let address = Address::parse(address)?;
        self.resolve_address(&address).await
    }

    /// Resolve a validated address to a name, writing confirmed answers back
    pub async fn resolve_address(&self, address: &Address) -> Result<Lookup<String>> {
        if let Some(name) = self.cache.get_name_by_address(address).await? {
            debug!(address = %address, name = %name, "Cache hit");
            return Ok(Lookup::Found(name));
        }

        if let Lookup::Found(name) = self.naming.resolve_address_to_name(address).await? {
            self.cache.upsert(address, &name).await?;
            info!(address = %address, name = %name, "Cached reverse resolution");
            return Ok(Lookup::Found(name));
        }

        if !self.profiles.is_enabled() {
            debug!(address = %address, "No reverse record, profile search disabled");
            return Ok(Lookup::NotFound);
        }

        let name = match self.profiles.resolve_name_by_address(address).await {
            ProfileMatch::Named(name) => name,
            ProfileMatch::Unnamed => {
                debug!(address = %address, "Profile without name, mapping address to itself");
                address.to_checksum()
            }
            ProfileMatch::NoMatch => return Ok(Lookup::NotFound),
        };

        self.cache.upsert(address, &name).await?;
        self.provisioner.ensure_record_for_name(&name).await?;
        info!(address = %address, name = %name, "Cached profile-search resolution");
        Ok(Lookup::Found(name))
    }

    // =========================================================================
    // Name → address
    // =========================================================================

    /// Resolve a name (or pass through an address) to an address
    pub async fn name_to_address(&self, name: &str) -> Result<Lookup<Address>> {
        Ok(self.lookup_name(name).await?.0)
    }

    /// Like [`name_to_address`](Self::name_to_address), and a name newly
    /// established by the naming service also gets a directory record
    pub async fn resolve_and_cache(&self, name: &str) -> Result<Lookup<Address>> {
        let (result, source) = self.lookup_name(name).await?;

        if result.is_found() && source == Source::NamingService {
            let normalized = normalize_name(name, &self.config.default_suffix)?;
            self.provisioner.ensure_record_for_name(&normalized).await?;
        }

        Ok(result)
    }

    async fn lookup_name(&self, input: &str) -> Result<(Lookup<Address>, Source)> {
        if let Ok(address) = Address::parse(input) {
            return Ok((Lookup::Found(address), Source::Cache));
        }

        let name = match self.cached_address(input).await? {
            (Some(address), _) => return Ok((Lookup::Found(address), Source::Cache)),
            (None, name) => name,
        };

        match self.naming.resolve_name_to_address(&name).await? {
            Lookup::Found(address) => {
                self.cache.upsert(&address, &name).await?;
                info!(name = %name, address = %address, "Cached forward resolution");
                Ok((Lookup::Found(address), Source::NamingService))
            }
            Lookup::NotFound => {
                debug!(name = %name, "Name not registered");
                Ok((Lookup::NotFound, Source::NamingService))
            }
        }
    }

    /// Cached address for a name stored verbatim (profile-search names keep
    /// their spelling) or in normalized form. Also returns the normalized name.
    async fn cached_address(&self, input: &str) -> Result<(Option<Address>, String)> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(NamebridgeError::InvalidInput("name must not be empty".to_string()));
        }

        if let Some(address) = self.cache.get_address_by_name(raw).await? {
            debug!(name = %raw, address = %address, "Cache hit");
            return Ok((Some(address), raw.to_string()));
        }

        let name = normalize_name(raw, &self.config.default_suffix)?;
        if name != raw {
            if let Some(address) = self.cache.get_address_by_name(&name).await? {
                debug!(name = %name, address = %address, "Cache hit on normalized name");
                return Ok((Some(address), name));
            }
        }

        Ok((None, name))
    }

    pub async fn ensure_directory_record(&self, name: &str) -> Result<DirectoryRecord> {
        self.provisioner.ensure_record_for_name(name).await
    }

    // =========================================================================
    // Social graph
    // =========================================================================

    /// One relationship set of `address`, each member resolved in contract order
    pub async fn resolve_and_cache_friends_of(
        &self,
        address: &str,
        kind: RelationshipKind,
    ) -> Result<Vec<ResolvedMember>> {
        let user = require_address(address, "user")?;
        let members = self.graph()?.members(&user, kind).await?;
        debug!(address = %user, kind = %kind, count = members.len(), "Read relationship set");

        self.reconciler().reconcile(members).await
    }

    /// All relationship sets of `address`, resolved
    pub async fn relationship_view(&self, address: &str) -> Result<ResolvedRelationshipView> {
        let user = require_address(address, "user")?;
        let view = self.graph()?.relationship_view(&user).await?;

        let reconciler = self.reconciler();
        Ok(ResolvedRelationshipView {
            address: view.address,
            friends: reconciler.reconcile(view.friends).await?,
            pending_sent: reconciler.reconcile(view.pending_sent).await?,
            pending_received: reconciler.reconcile(view.pending_received).await?,
        })
    }

    /// Sizes of the relationship sets of `address`
    pub async fn relationship_counts(&self, address: &str) -> Result<RelationshipCounts> {
        let user = require_address(address, "user")?;
        self.graph()?.relationship_counts(&user).await
    }

    pub async fn are_friends(&self, a: &str, b: &str) -> Result<bool> {
        let a = require_address(a, "first")?;
        let b = require_address(b, "second")?;
        self.graph()?.are_friends(&a, &b).await
    }

    fn reconciler(&self) -> PendingRequestReconciler<'_> {
        PendingRequestReconciler::new(self, self.config.resolve_concurrency)
    }

    // =========================================================================
    // Administration
    // =========================================================================

    pub async fn list_mappings(&self) -> Result<Vec<NameAddressRecord>> {
        self.cache.list_all().await
    }

    pub async fn purge_address(&self, address: &str) -> Result<bool> {
        let address = Address::parse(address)?;
        let deleted = self.cache.delete_by_address(&address).await?;
        info!(address = %address, deleted, "Purged mapping by address");
        Ok(deleted)
    }

    /// Delete a mapping by the name as given, falling back to its normalized form
    pub async fn purge_name(&self, name: &str) -> Result<bool> {
        let raw = name.trim();
        if raw.is_empty() {
            return Err(NamebridgeError::InvalidInput("name must not be empty".to_string()));
        }

        let mut deleted = self.cache.delete_by_name(raw).await?;
        if !deleted {
            if let Ok(normalized) = normalize_name(raw, &self.config.default_suffix) {
                if normalized != raw {
                    deleted = self.cache.delete_by_name(&normalized).await?;
                }
            }
        }

        info!(name = %raw, deleted, "Purged mapping by name");
        Ok(deleted)
    }
}

#[async_trait::async_trait]
impl AddressNamer for IdentityResolutionService {
    async fn name_for(&self, address: &Address) -> Result<Lookup<String>> {
        self.resolve_address(address).await
    }
}

#[cfg(test)]
mod tests;
