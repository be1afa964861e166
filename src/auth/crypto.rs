//! Wallet signature recovery
//!
//! Recovers the address behind an EIP-191 `personal_sign` signature over the
//! login challenge message. Stateless and free of I/O.

use alloy_primitives::{Signature, U256};
use thiserror::Error;

use super::address::WalletAddress;

/// Fixed text placed before the nonce in the signed message
pub const AUTH_MESSAGE_PREFIX: &str = "Sign this message to authenticate: ";

/// `r || s || v`
const SIGNATURE_LENGTH: usize = 65;

/// Errors that can occur during signature recovery
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("Signer recovery failed: {0}")]
    RecoveryFailed(String),
}

/// Build the exact message a wallet signs for `nonce`
pub fn challenge_message(nonce: &str) -> String {
    format!("{AUTH_MESSAGE_PREFIX}{nonce}")
}

/// Recover the wallet that signed the challenge for `nonce`
///
/// # Arguments
/// * `nonce` - The nonce issued to the client
/// * `signature_hex` - 65-byte `r || s || v` signature, hex encoded, `0x` optional
///
/// # Returns
/// * `Ok(WalletAddress)` of the signer
/// * `Err(CryptoError)` if the signature is malformed or recovery fails
pub fn recover_signer(nonce: &str, signature_hex: &str) -> Result<WalletAddress, CryptoError> {
    recover_from_signature(nonce, &parse_signature(signature_hex)?)
}

/// Recover the signer of the challenge for `nonce` from a parsed signature
pub fn recover_from_signature(
    nonce: &str,
    signature: &Signature,
) -> Result<WalletAddress, CryptoError> {
    let address = signature
        .recover_address_from_msg(challenge_message(nonce).as_bytes())
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;

    Ok(WalletAddress::from(address))
}

/// Parse a 65-byte hex signature
///
/// Only `v` values of 0, 1, 27 and 28 are accepted. Chain-specific `v`
/// encodings have no meaning for an off-chain message.
pub fn parse_signature(signature_hex: &str) -> Result<Signature, CryptoError> {
    let trimmed = signature_hex.trim();
    let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    let bytes =
        hex::decode(body).map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;

    if bytes.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignatureFormat(format!(
            "Expected {} bytes, got {}",
            SIGNATURE_LENGTH,
            bytes.len()
        )));
    }

    let y_parity = match bytes[64] {
        0 | 27 => false,
        1 | 28 => true,
        v => return Err(CryptoError::InvalidRecoveryId(v)),
    };

    let r = U256::from_be_slice(&bytes[..32]);
    let s = U256::from_be_slice(&bytes[32..64]);

    Ok(Signature::new(r, s, y_parity))
}
