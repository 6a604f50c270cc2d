//! Naming-service resolver (ENS)
//!
//! Forward: `name → registry.resolver(node) → resolver.addr(node)`. When the
//! name itself has no resolver, parent names are tried in turn (ENSIP-10); a
//! parent resolver is only used if it implements the extended `resolve` entry
//! point, which is then asked for `addr(node)` of the full name.
//!
//! Reverse: `<hex>.addr.reverse → registry.resolver(node) → resolver.name(node)`,
//! then the claimed name is resolved forward again and only accepted if it
//! points back at the same address.
//!
//! No caching happens here; the identity service owns the cache.

use ethers::abi::{AbiError, Detokenize, Tokenize};
use ethers::contract::BaseContract;
use ethers::providers::ens::{namehash, reverse_address};
use ethers::types::{Bytes, H160, H256};
use std::sync::Arc;
use tracing::debug;

use super::Lookup;
use crate::chain::contracts::{self, ENS_REGISTRY_ABI, ENS_RESOLVER_ABI};
use crate::chain::{Address, EthCaller, RpcError};
use crate::types::{NamebridgeError, Result};

/// ENS registry, identical on mainnet and the public testnets
const ENS_REGISTRY: [u8; 20] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x0c, 0x2e, 0x07, 0x4e, 0xc6, 0x9a, 0x0d, 0xfb, 0x29, 0x97,
    0xba, 0x6c, 0x7d, 0x2e, 0x1e,
];

/// ERC-165 id of `resolve(bytes,bytes)`
const EXTENDED_RESOLVER_INTERFACE: [u8; 4] = [0x90, 0x61, 0xb9, 0x23];

/// Configuration for the ENS resolver
#[derive(Debug, Clone)]
pub struct EnsConfig {
    /// ENS registry contract
    pub registry: Address,
    /// Top-level zone appended to bare labels (without the dot)
    pub default_suffix: String,
}

impl Default for EnsConfig {
    fn default() -> Self {
        Self {
            registry: Address::from_bytes(ENS_REGISTRY),
            default_suffix: "eth".to_string(),
        }
    }
}

/// Forward and reverse lookups against a naming protocol
#[async_trait::async_trait]
pub trait NamingService: Send + Sync {
    /// Resolve a name (or pass through an address) to a checksummed address
    async fn resolve_name_to_address(&self, input: &str) -> Result<Lookup<Address>>;

    /// Resolve an address to its primary name
    async fn resolve_address_to_name(&self, address: &Address) -> Result<Lookup<String>>;
}

/// Trim, lowercase and qualify a bare label with the default suffix
pub fn normalize_name(input: &str, default_suffix: &str) -> Result<String> {
    let mut name = input.trim().to_lowercase();
    if name.is_empty() {
        return Err(NamebridgeError::InvalidInput("name must not be empty".to_string()));
    }

    if !name.contains('.') {
        name = format!("{}.{}", name, default_suffix.trim_start_matches('.'));
        debug!(input = %input, name = %name, "Appended default suffix");
    }

    if name.split('.').any(|label| label.is_empty()) {
        return Err(NamebridgeError::InvalidInput(format!(
            "name has an empty label: {}",
            input
        )));
    }

    Ok(name)
}

/// DNS wire format of a dotted name, as taken by `resolve(bytes,bytes)`
pub fn dns_encode(name: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(name.len() + 2);
    for label in name.split('.') {
        let len = u8::try_from(label.len()).map_err(|_| {
            NamebridgeError::InvalidInput(format!("label longer than 255 bytes in {}", name))
        })?;
        out.push(len);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    Ok(out)
}

/// ENS resolver over an injected `eth_call` transport
pub struct EnsResolver {
    config: EnsConfig,
    caller: Arc<dyn EthCaller>,
    registry_abi: BaseContract,
    resolver_abi: BaseContract,
}

impl EnsResolver {
    pub fn new(config: EnsConfig, caller: Arc<dyn EthCaller>) -> Result<Self> {
        Ok(Self {
            config,
            caller,
            registry_abi: contracts::human_readable(ENS_REGISTRY_ABI)?,
            resolver_abi: contracts::human_readable(ENS_RESOLVER_ABI)?,
        })
    }

    async fn call(&self, to: &Address, data: Bytes) -> Result<Option<Bytes>> {
        match self.caller.call(to, data).await {
            Ok(out) if out.is_empty() => Ok(None),
            Ok(out) => Ok(Some(out)),
            // A resolver that does not implement the record type reverts
            Err(e) if e.is_revert() && *to != self.config.registry => {
                debug!(to = %to, error = %e, "Resolver reverted");
                Ok(None)
            }
            Err(e) => Err(unavailable(e)),
        }
    }

    /// Call a resolver function and decode its single return value
    async fn read<T: Tokenize + Send, D: Detokenize>(
        &self,
        contract: &BaseContract,
        to: &Address,
        function: &str,
        args: T,
    ) -> Result<Option<D>> {
        let data = contract.encode(function, args).map_err(encoding)?;
        let Some(out) = self.call(to, data).await? else {
            return Ok(None);
        };
        contract
            .decode_output(function, out)
            .map(Some)
            .map_err(malformed)
    }

    /// Resolver contract registered for exactly `node`, if any
    async fn resolver_for(&self, node: H256) -> Result<Option<Address>> {
        let registry = self.config.registry;
        let resolver: Option<H160> = self
            .read(&self.registry_abi, &registry, "resolver", node)
            .await?;
        Ok(resolver.map(Address::from).filter(|r| !r.is_zero()))
    }

    /// Closest resolver for `name`, walking up through parent names.
    /// The flag is set when the resolver belongs to a parent.
    async fn find_resolver(&self, name: &str) -> Result<Option<(Address, bool)>> {
        let mut current = name;
        loop {
            if let Some(resolver) = self.resolver_for(namehash(current)).await? {
                return Ok(Some((resolver, current != name)));
            }
            match current.split_once('.') {
                Some((_, parent)) if !parent.is_empty() => current = parent,
                _ => return Ok(None),
            }
        }
    }

    async fn supports_extended(&self, resolver: &Address) -> Result<bool> {
        let supported: Option<bool> = self
            .read(
                &self.resolver_abi,
                resolver,
                "supportsInterface",
                EXTENDED_RESOLVER_INTERFACE,
            )
            .await?;
        Ok(supported.unwrap_or(false))
    }

    async fn forward(&self, name: &str) -> Result<Lookup<Address>> {
        let node = namehash(name);
        let Some((resolver, inherited)) = self.find_resolver(name).await? else {
            debug!(name = %name, "No resolver registered");
            return Ok(Lookup::NotFound);
        };

        let address: Option<H160> = if !inherited {
            self.read(&self.resolver_abi, &resolver, "addr", node).await?
        } else if self.supports_extended(&resolver).await? {
            debug!(name = %name, resolver = %resolver, "Wildcard resolution");
            let inner = self.resolver_abi.encode("addr", node).map_err(encoding)?;
            let dns_name = Bytes::from(dns_encode(name)?);
            let wrapped: Option<Bytes> = self
                .read(&self.resolver_abi, &resolver, "resolve", (dns_name, inner))
                .await?;
            match wrapped.filter(|w| !w.is_empty()) {
                Some(w) => Some(self.resolver_abi.decode_output("addr", w).map_err(malformed)?),
                None => None,
            }
        } else {
            debug!(name = %name, resolver = %resolver, "Parent resolver is not a wildcard resolver");
            None
        };

        match address.map(Address::from) {
            Some(address) if !address.is_zero() => Ok(Lookup::Found(address)),
            _ => Ok(Lookup::NotFound),
        }
    }
}

fn unavailable(err: RpcError) -> NamebridgeError {
    NamebridgeError::ResolverUnavailable(format!("naming service: {}", err))
}

fn malformed(err: AbiError) -> NamebridgeError {
    NamebridgeError::ResolverUnavailable(format!("naming service returned malformed data: {}", err))
}

fn encoding(err: AbiError) -> NamebridgeError {
    NamebridgeError::Internal(format!("cannot encode resolver call: {}", err))
}

#[async_trait::async_trait]
impl NamingService for EnsResolver {
    async fn resolve_name_to_address(&self, input: &str) -> Result<Lookup<Address>> {
        if let Ok(address) = Address::parse(input) {
            return Ok(Lookup::Found(address));
        }

        let name = normalize_name(input, &self.config.default_suffix)?;
        let result = self.forward(&name).await?;
        debug!(name = %name, found = result.is_found(), "Forward lookup");
        Ok(result)
    }

    async fn resolve_address_to_name(&self, address: &Address) -> Result<Lookup<String>> {
        let node = namehash(&reverse_address(address.h160()));

        // Reverse records are never inherited from a parent
        let Some(resolver) = self.resolver_for(node).await? else {
            debug!(address = %address, "No reverse record");
            return Ok(Lookup::NotFound);
        };
        let claimed: Option<String> = self.read(&self.resolver_abi, &resolver, "name", node).await?;
        let Some(claimed) = claimed.filter(|c| !c.is_empty()) else {
            return Ok(Lookup::NotFound);
        };

        // A reverse record is only trusted if the name resolves back to us
        let confirmed = match normalize_name(&claimed, &self.config.default_suffix) {
            Ok(name) => self.forward(&name).await?,
            Err(_) => Lookup::NotFound,
        };

        match confirmed {
            Lookup::Found(forward) if forward == *address => Ok(Lookup::Found(claimed)),
            _ => {
                debug!(address = %address, claimed = %claimed, "Reverse record not forward-confirmed");
                Ok(Lookup::NotFound)
            }
        }
    }
}
