//! Social-graph contract (read-only)
//!
//! Thin façade over the FriendManager view functions. Every call is a single
//! `eth_call`; failures surface as [`NamebridgeError::OnchainQuery`] and are
//! not retried here.

use ethers::abi::{AbiError, Detokenize, Tokenize};
use ethers::contract::BaseContract;
use ethers::types::{H160, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::chain::contracts::{self, FRIEND_MANAGER_ABI};
use crate::chain::{Address, EthCaller, RpcError};
use crate::types::{NamebridgeError, Result};

/// Which relationship set to read for an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    Friends,
    PendingSent,
    PendingReceived,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelationshipKind::Friends => "friends",
            RelationshipKind::PendingSent => "pending-sent",
            RelationshipKind::PendingReceived => "pending-received",
        })
    }
}

/// All relationship sets for one address, in contract order as of one read
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnchainRelationshipView {
    pub address: Address,
    pub friends: Vec<Address>,
    pub pending_sent: Vec<Address>,
    pub pending_received: Vec<Address>,
}

/// Sizes of the three relationship sets for one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipCounts {
    pub address: Address,
    pub friends: u64,
    pub pending_sent: u64,
    pub pending_received: u64,
}

/// Read-only social-graph queries
#[async_trait::async_trait]
pub trait SocialGraph: Send + Sync {
    async fn are_friends(&self, a: &Address, b: &Address) -> Result<bool>;

    async fn friends_count(&self, user: &Address) -> Result<u64>;

    async fn get_friends(&self, user: &Address) -> Result<Vec<Address>>;

    async fn pending_sent_count(&self, user: &Address) -> Result<u64>;

    async fn get_pending_sent(&self, user: &Address) -> Result<Vec<Address>>;

    async fn pending_recv_count(&self, user: &Address) -> Result<u64>;

    async fn get_pending_received(&self, user: &Address) -> Result<Vec<Address>>;

    /// Members of one relationship set
    async fn members(&self, user: &Address, kind: RelationshipKind) -> Result<Vec<Address>> {
        match kind {
            RelationshipKind::Friends => self.get_friends(user).await,
            RelationshipKind::PendingSent => self.get_pending_sent(user).await,
            RelationshipKind::PendingReceived => self.get_pending_received(user).await,
        }
    }

    /// Count for one relationship set
    async fn count(&self, user: &Address, kind: RelationshipKind) -> Result<u64> {
        match kind {
            RelationshipKind::Friends => self.friends_count(user).await,
            RelationshipKind::PendingSent => self.pending_sent_count(user).await,
            RelationshipKind::PendingReceived => self.pending_recv_count(user).await,
        }
    }

    /// All three counts, read concurrently
    async fn relationship_counts(&self, user: &Address) -> Result<RelationshipCounts> {
        let (friends, pending_sent, pending_received) = futures::try_join!(
            self.count(user, RelationshipKind::Friends),
            self.count(user, RelationshipKind::PendingSent),
            self.count(user, RelationshipKind::PendingReceived),
        )?;

        Ok(RelationshipCounts {
            address: *user,
            friends,
            pending_sent,
            pending_received,
        })
    }

    /// All three sets, read concurrently
    async fn relationship_view(&self, user: &Address) -> Result<OnchainRelationshipView> {
        let (friends, pending_sent, pending_received) = futures::try_join!(
            self.get_friends(user),
            self.get_pending_sent(user),
            self.get_pending_received(user),
        )?;

        Ok(OnchainRelationshipView {
            address: *user,
            friends,
            pending_sent,
            pending_received,
        })
    }
}

/// Configuration for the social-graph client
#[derive(Debug, Clone)]
pub struct FriendGraphConfig {
    /// Deployed FriendManager contract
    pub contract_address: String,
}

/// FriendManager contract client over an injected `eth_call` transport
pub struct FriendManagerClient {
    contract: Address,
    abi: BaseContract,
    caller: Arc<dyn EthCaller>,
}

impl FriendManagerClient {
    /// Validates the contract address once, up front
    pub fn new(config: &FriendGraphConfig, caller: Arc<dyn EthCaller>) -> Result<Self> {
        let contract = Address::parse(&config.contract_address).map_err(|_| {
            NamebridgeError::Config(format!(
                "invalid contract address: '{}'",
                config.contract_address
            ))
        })?;
        if contract.is_zero() {
            return Err(NamebridgeError::Config("contract address is zero".to_string()));
        }

        Ok(Self {
            contract,
            abi: contracts::human_readable(FRIEND_MANAGER_ABI)?,
            caller,
        })
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    async fn view<T: Tokenize + Send, D: Detokenize>(&self, function: &str, args: T) -> Result<D> {
        debug!(contract = %self.contract, function, "Contract view call");
        let data = self.abi.encode(function, args).map_err(|e| {
            NamebridgeError::Internal(format!("cannot encode {}: {}", function, e))
        })?;
        let out = self
            .caller
            .call(&self.contract, data)
            .await
            .map_err(|e| query_error(function, e))?;
        self.abi
            .decode_output(function, out)
            .map_err(|e| decode_error(function, e))
    }

    async fn addresses(&self, function: &str, user: &Address) -> Result<Vec<Address>> {
        let members: Vec<H160> = self.view(function, user.h160()).await?;
        Ok(members.into_iter().map(Address::from).collect())
    }

    async fn count_of(&self, function: &str, user: &Address) -> Result<u64> {
        let count: U256 = self.view(function, user.h160()).await?;
        if count > U256::from(u64::MAX) {
            return Err(NamebridgeError::OnchainQuery(format!(
                "{}: count {} out of range",
                function, count
            )));
        }
        Ok(count.low_u64())
    }
}

fn query_error(function: &str, err: RpcError) -> NamebridgeError {
    NamebridgeError::OnchainQuery(format!("{}: {}", function, err))
}

fn decode_error(function: &str, err: AbiError) -> NamebridgeError {
    NamebridgeError::OnchainQuery(format!("{}: undecodable return data: {}", function, err))
}

#[async_trait::async_trait]
impl SocialGraph for FriendManagerClient {
    async fn are_friends(&self, a: &Address, b: &Address) -> Result<bool> {
        self.view("areFriends", (a.h160(), b.h160())).await
    }

    async fn friends_count(&self, user: &Address) -> Result<u64> {
        self.count_of("friendsCount", user).await
    }

    async fn get_friends(&self, user: &Address) -> Result<Vec<Address>> {
        self.addresses("getFriends", user).await
    }

    async fn pending_sent_count(&self, user: &Address) -> Result<u64> {
        self.count_of("pendingSentCount", user).await
    }

    async fn get_pending_sent(&self, user: &Address) -> Result<Vec<Address>> {
        self.addresses("getPendingSent", user).await
    }

    async fn pending_recv_count(&self, user: &Address) -> Result<u64> {
        self.count_of("pendingRecvCount", user).await
    }

    async fn get_pending_received(&self, user: &Address) -> Result<Vec<Address>> {
        self.addresses("getPendingReceived", user).await
    }
}
