//! Human-readable contract ABIs
//!
//! Only view functions are declared; calldata is built and return data decoded
//! with `ethers::contract::BaseContract`.

use ethers::abi::parse_abi;
use ethers::contract::BaseContract;

use crate::types::{NamebridgeError, Result};

/// ENS registry
pub const ENS_REGISTRY_ABI: &[&str] =
    &["function resolver(bytes32 node) external view returns (address)"];

/// ENS public resolver, including the ENSIP-10 extended entry point
pub const ENS_RESOLVER_ABI: &[&str] = &[
    "function addr(bytes32 node) external view returns (address)",
    "function name(bytes32 node) external view returns (string)",
    "function supportsInterface(bytes4 interfaceID) external view returns (bool)",
    "function resolve(bytes name, bytes data) external view returns (bytes)",
];

/// FriendManager social-graph contract
pub const FRIEND_MANAGER_ABI: &[&str] = &[
    "function areFriends(address a, address b) external view returns (bool)",
    "function friendsCount(address user) external view returns (uint256)",
    "function getFriends(address user) external view returns (address[])",
    "function pendingSentCount(address user) external view returns (uint256)",
    "function getPendingSent(address user) external view returns (address[])",
    "function pendingRecvCount(address user) external view returns (uint256)",
    "function getPendingReceived(address user) external view returns (address[])",
];

/// Parse a human-readable ABI into a contract codec
pub fn human_readable(signatures: &[&str]) -> Result<BaseContract> {
    let abi = parse_abi(signatures)
        .map_err(|e| NamebridgeError::Internal(format!("invalid contract ABI: {}", e)))?;
    Ok(BaseContract::from(abi))
}
