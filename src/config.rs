//! Configuration for namebridge
//!
//! CLI arguments and environment variable handling using clap. Every option
//! has an environment fallback; `.env` is loaded before parsing.

use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::chain::{Address, RpcConfig};
use crate::identity::ResolutionConfig;
use crate::onchain::{FriendGraphConfig, RelationshipKind};
use crate::resolvers::{EnsConfig, ProfileSearchConfig};
use crate::types::{NamebridgeError, Result};

/// namebridge - name/address identity resolution for the builder directory
#[derive(Parser, Debug, Clone)]
#[command(name = "namebridge")]
#[command(about = "Resolve names and addresses, reconcile the on-chain friend graph")]
pub struct Args {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "namebridge")]
    pub mongodb_db: String,

    /// Ethereum JSON-RPC endpoint for ENS lookups
    #[arg(long, env = "ETH_RPC_URL", default_value = "https://cloudflare-eth.com")]
    pub eth_rpc_url: String,

    /// JSON-RPC endpoint of the chain hosting the social-graph contract
    /// Falls back to ETH_RPC_URL when unset
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// FriendManager contract address (required for relationship commands)
    #[arg(long, env = "CONTRACT_ADDRESS")]
    pub contract_address: Option<String>,

    /// ENS registry contract
    #[arg(long, env = "ENS_REGISTRY", default_value = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e")]
    pub ens_registry: String,

    /// Suffix appended to bare labels ("alice" -> "alice.eth")
    #[arg(long, env = "DEFAULT_NAME_SUFFIX", default_value = "eth")]
    pub default_name_suffix: String,

    /// Profile search configuration
    #[command(flatten)]
    pub profile_search: ProfileSearchArgs,

    /// Per-request transport timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Parallel name lookups when reconciling relationship sets
    #[arg(long, env = "RESOLVE_CONCURRENCY", default_value = "8")]
    pub resolve_concurrency: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Profile-search API configuration
#[derive(Parser, Debug, Clone)]
pub struct ProfileSearchArgs {
    /// Profile-search API base URL
    #[arg(long, env = "PROFILE_SEARCH_URL", default_value = "https://api.talentprotocol.com")]
    pub profile_search_url: String,

    /// API key; the fallback is disabled without one
    #[arg(long, env = "TALENT_PROTOCOL_API_KEY", hide_env_values = true)]
    pub talent_protocol_api_key: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve an address to a name
    AddressToName { address: String },

    /// Resolve a name to an address
    NameToAddress { name: String },

    /// Resolve a name and provision a directory record for a new identity
    Resolve { name: String },

    /// Make sure a directory record exists for a name
    EnsureDirectory { name: String },

    /// List one relationship set of an address, resolved to names
    Friends {
        address: String,
        #[arg(long, value_enum, default_value_t = RelationshipKind::Friends)]
        kind: RelationshipKind,
    },

    /// All relationship sets of an address, resolved to names
    View { address: String },

    /// Sizes of the relationship sets of an address
    Counts { address: String },

    /// Whether two addresses are friends
    AreFriends { a: String, b: String },

    /// List every cached name/address mapping
    List,

    /// Delete the cached mapping for an address
    PurgeAddress { address: String },

    /// Delete a cached mapping by name
    PurgeName { name: String },
}

impl Command {
    /// Whether the command reads the social-graph contract
    pub fn needs_graph(&self) -> bool {
        matches!(
            self,
            Command::Friends { .. }
                | Command::View { .. }
                | Command::Counts { .. }
                | Command::AreFriends { .. }
        )
    }
}

impl Args {
    /// Effective social-graph RPC endpoint
    pub fn graph_rpc_url(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or(&self.eth_rpc_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn ens_rpc(&self) -> RpcConfig {
        RpcConfig {
            url: self.eth_rpc_url.clone(),
            timeout: self.request_timeout(),
        }
    }

    pub fn graph_rpc(&self) -> RpcConfig {
        RpcConfig {
            url: self.graph_rpc_url().to_string(),
            timeout: self.request_timeout(),
        }
    }

    pub fn ens_config(&self) -> Result<EnsConfig> {
        let registry = Address::parse(&self.ens_registry)
            .map_err(|_| NamebridgeError::Config(format!("invalid ENS_REGISTRY: {}", self.ens_registry)))?;
        Ok(EnsConfig {
            registry,
            default_suffix: self.suffix(),
        })
    }

    pub fn profile_search_config(&self) -> ProfileSearchConfig {
        ProfileSearchConfig {
            base_url: self.profile_search.profile_search_url.clone(),
            api_key: self
                .profile_search
                .talent_protocol_api_key
                .clone()
                .filter(|k| !k.trim().is_empty()),
            request_timeout: self.request_timeout(),
        }
    }

    pub fn friend_graph_config(&self) -> Result<FriendGraphConfig> {
        let contract_address = self
            .contract_address
            .clone()
            .ok_or_else(|| NamebridgeError::Config("CONTRACT_ADDRESS is not set".to_string()))?;
        Ok(FriendGraphConfig { contract_address })
    }

    pub fn resolution_config(&self) -> ResolutionConfig {
        ResolutionConfig {
            resolve_concurrency: self.resolve_concurrency,
            default_suffix: self.suffix(),
        }
    }

    fn suffix(&self) -> String {
        self.default_name_suffix.trim().trim_start_matches('.').to_lowercase()
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (label, url) in [
            ("ETH_RPC_URL", self.eth_rpc_url.as_str()),
            ("RPC_URL", self.graph_rpc_url()),
            ("PROFILE_SEARCH_URL", self.profile_search.profile_search_url.as_str()),
        ] {
            match reqwest::Url::parse(url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                _ => return Err(format!("{} must be an http(s) URL, got '{}'", label, url)),
            }
        }

        if Address::parse(&self.ens_registry).is_err() {
            return Err(format!("ENS_REGISTRY is not a valid address: {}", self.ens_registry));
        }

        if let Some(contract) = &self.contract_address {
            match Address::parse(contract) {
                Ok(a) if !a.is_zero() => {}
                _ => return Err(format!("CONTRACT_ADDRESS is not a valid address: {}", contract)),
            }
        } else if self.command.needs_graph() {
            return Err("CONTRACT_ADDRESS is required for relationship commands".to_string());
        }

        if self.suffix().is_empty() || self.suffix().contains('.') {
            return Err("DEFAULT_NAME_SUFFIX must be a single label".to_string());
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.resolve_concurrency == 0 {
            return Err("RESOLVE_CONCURRENCY must be greater than zero".to_string());
        }

        Ok(())
    }
}
