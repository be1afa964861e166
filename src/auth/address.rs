//! Wallet address canonicalization
//!
//! Every address that reaches the nonce store or the signature verifier goes
//! through [`canonicalize`] first. The canonical form is the EIP-55
//! checksummed string and all equality checks happen on [`WalletAddress`],
//! never on raw client input.

use std::fmt;

use alloy_primitives::Address;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors produced while parsing a wallet address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid wallet address format: {0}")]
    InvalidFormat(String),

    #[error("Invalid address checksum")]
    InvalidChecksum,
}

/// A validated EVM wallet address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletAddress(Address);

impl WalletAddress {
    /// EIP-55 checksummed form, `0x`-prefixed
    pub fn to_checksum(&self) -> String {
        self.0.to_checksum(None)
    }
}

impl From<Address> for WalletAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl Serialize for WalletAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

/// Normalize a raw wallet address into its canonical form
///
/// Accepts 40 hex digits with or without a `0x` prefix. Digits that are all
/// lowercase or all uppercase carry no checksum and are accepted as is; mixed
/// case is read as an EIP-55 checksum and must match.
pub fn canonicalize(raw: &str) -> Result<WalletAddress, AddressError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if body.len() != 40 {
        return Err(AddressError::InvalidFormat(format!(
            "Expected 40 hex digits, got {}",
            body.len()
        )));
    }

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(body, &mut bytes)
        .map_err(|e| AddressError::InvalidFormat(e.to_string()))?;

    let address = WalletAddress(Address::from(bytes));

    if is_mixed_case(body) && &address.to_checksum()[2..] != body {
        return Err(AddressError::InvalidChecksum);
    }

    Ok(address)
}

fn is_mixed_case(body: &str) -> bool {
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    has_lower && has_upper
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_canonicalize_checksummed() {
        let address = canonicalize(CHECKSUMMED).unwrap();
        assert_eq!(address.to_checksum(), CHECKSUMMED);
    }

    #[test]
    fn test_canonicalize_lowercase_and_uppercase() {
        let lower = canonicalize(&CHECKSUMMED.to_lowercase()).unwrap();
        let upper = canonicalize(&format!("0x{}", CHECKSUMMED[2..].to_uppercase())).unwrap();

        assert_eq!(lower, upper);
        assert_eq!(lower.to_string(), CHECKSUMMED);
    }

    #[test]
    fn test_canonicalize_without_prefix_and_whitespace() {
        let address = canonicalize(&format!("  {}  ", &CHECKSUMMED[2..])).unwrap();
        assert_eq!(address.to_checksum(), CHECKSUMMED);
    }

    #[test]
    fn test_canonicalize_bad_checksum() {
        // Flip the case of one letter
        let broken = CHECKSUMMED.replacen("Fd6", "fd6", 1);
        assert_eq!(canonicalize(&broken), Err(AddressError::InvalidChecksum));
    }

    #[test]
    fn test_canonicalize_wrong_length() {
        let result = canonicalize("0x1234");
        assert!(matches!(result, Err(AddressError::InvalidFormat(_))));

        let result = canonicalize(&format!("{}00", CHECKSUMMED));
        assert!(matches!(result, Err(AddressError::InvalidFormat(_))));
    }

    #[test]
    fn test_canonicalize_invalid_characters() {
        let result = canonicalize("0xzz9fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert!(matches!(result, Err(AddressError::InvalidFormat(_))));
    }

    #[test]
    fn test_serialize_as_checksum() {
        let address = canonicalize(&CHECKSUMMED.to_lowercase()).unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", CHECKSUMMED));
    }
}
