//! Batch reconciliation of contract-returned addresses against the name cache

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::debug;

use crate::chain::Address;
use crate::resolvers::Lookup;
use crate::types::{NamebridgeError, Result};

/// One relationship member with its name, if one could be established
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMember {
    pub address: Address,
    pub name: Option<String>,
}

/// Single-address name lookup used by the reconciler
#[async_trait::async_trait]
pub trait AddressNamer: Send + Sync {
    async fn name_for(&self, address: &Address) -> Result<Lookup<String>>;
}

/// Maps an ordered address list to names with bounded concurrency.
///
/// Output order always matches input order. `NotFound` becomes `None`; any
/// error aborts the whole batch.
pub struct PendingRequestReconciler<'a> {
    namer: &'a dyn AddressNamer,
    concurrency: usize,
}

impl<'a> PendingRequestReconciler<'a> {
    pub fn new(namer: &'a dyn AddressNamer, concurrency: usize) -> Self {
        Self {
            namer,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn reconcile(&self, addresses: Vec<Address>) -> Result<Vec<ResolvedMember>> {
        debug!(count = addresses.len(), concurrency = self.concurrency, "Reconciling addresses");
        let namer = self.namer;

        stream::iter(addresses)
            .map(move |address| async move {
                let name = namer.name_for(&address).await?.found();
                Ok::<_, NamebridgeError>(ResolvedMember { address, name })
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}
