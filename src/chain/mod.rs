//! Chain primitives: addresses, contract ABIs and the `eth_call` transport

pub mod address;
pub mod contracts;
pub mod rpc;

pub use address::{require_address, Address};
pub use rpc::{EthCaller, ProviderCaller, RpcConfig, RpcError};
