//! Ethereum JSON-RPC transport
//!
//! Only `eth_call` against the latest block is needed; everything this crate
//! reads from chain is a view function. The production caller is an ethers
//! `Provider<Http>`; tests substitute their own [`EthCaller`].

use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError as _};
use ethers::types::{transaction::eip2718::TypedTransaction, Bytes, TransactionRequest};
use std::time::Duration;
use tracing::debug;

use super::address::Address;
use crate::types::{NamebridgeError, Result};

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("RPC call timed out after {0:?}")]
    Timeout(Duration),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl RpcError {
    /// Whether the node reported an EVM revert rather than a transport problem
    pub fn is_revert(&self) -> bool {
        match self {
            RpcError::Rpc { code, message } => *code == 3 || message.contains("revert"),
            _ => false,
        }
    }
}

impl From<ProviderError> for RpcError {
    fn from(err: ProviderError) -> Self {
        match err.as_error_response() {
            Some(response) => RpcError::Rpc {
                code: response.code,
                message: response.message.clone(),
            },
            None => RpcError::Transport(err.to_string()),
        }
    }
}

/// Read-only contract call seam (mocked in tests)
#[async_trait::async_trait]
pub trait EthCaller: Send + Sync {
    /// Execute `eth_call` and return the raw return data
    async fn call(&self, to: &Address, data: Bytes) -> std::result::Result<Bytes, RpcError>;
}

/// Configuration for a JSON-RPC endpoint
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: String,
    /// Per-call timeout
    pub timeout: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://cloudflare-eth.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// `eth_call` through an ethers HTTP provider
pub struct ProviderCaller {
    provider: Provider<Http>,
    timeout: Duration,
}

impl ProviderCaller {
    pub fn new(config: &RpcConfig) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.url.as_str()).map_err(|e| {
            NamebridgeError::Config(format!("invalid RPC URL '{}': {}", config.url, e))
        })?;

        Ok(Self {
            provider,
            timeout: config.timeout,
        })
    }
}

#[async_trait::async_trait]
impl EthCaller for ProviderCaller {
    async fn call(&self, to: &Address, data: Bytes) -> std::result::Result<Bytes, RpcError> {
        debug!(to = %to, bytes = data.len(), "eth_call");

        let tx: TypedTransaction = TransactionRequest::new().to(to.h160()).data(data).into();
        match tokio::time::timeout(self.timeout, self.provider.call(&tx, None)).await {
            Ok(result) => result.map_err(RpcError::from),
            Err(_) => Err(RpcError::Timeout(self.timeout)),
        }
    }
}
