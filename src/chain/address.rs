//! Chain account addresses
//!
//! Wraps `ethers::types::Address` so that every textual form this crate emits
//! is the EIP-55 checksummed one. Parsing accepts all-lowercase, all-uppercase,
//! or correctly checksummed mixed case; a mixed-case string with a bad checksum
//! is rejected like any other typo.

use ethers::types::H160;
use ethers::utils::to_checksum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::types::{NamebridgeError, Result};

/// A 20-byte chain account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(H160);

impl Address {
    pub const ZERO: Address = Address(H160([0u8; 20]));

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(H160(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        self.0.as_fixed_bytes()
    }

    /// Underlying ethers address, for building calls
    pub fn h160(&self) -> H160 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse a `0x`-prefixed 40-digit hex string
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| invalid(input, "missing 0x prefix"))?;

        if digits.len() != 40 {
            return Err(invalid(input, "expected 40 hex digits"));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|e| invalid(input, &e.to_string()))?;
        let address = Self::from_bytes(bytes);

        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum()[2..] != *digits {
            return Err(invalid(input, "checksum mismatch"));
        }

        Ok(address)
    }

    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    /// EIP-55 checksummed form including the `0x` prefix
    pub fn to_checksum(&self) -> String {
        to_checksum(&self.0, None)
    }

    /// Lowercase hex without prefix (reverse-record label form)
    pub fn to_lower_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

fn invalid(input: &str, reason: &str) -> NamebridgeError {
    NamebridgeError::InvalidInput(format!("invalid address '{}': {}", input, reason))
}

/// Parse an address, naming the offending argument in the error
pub fn require_address(value: &str, label: &str) -> Result<Address> {
    Address::parse(value)
        .map_err(|_| NamebridgeError::InvalidInput(format!("Invalid {} address: {}", label, value)))
}

impl From<H160> for Address {
    fn from(value: H160) -> Self {
        Self(value)
    }
}

impl From<Address> for H160 {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl FromStr for Address {
    type Err = NamebridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}
