//! Signer recovery against signatures produced by a real wallet signer

use std::str::FromStr;

use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use marketplace_auth_server::auth::{challenge_message, recover_signer, WalletAddress};

const ALICE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const NONCE: &str = "3f1c0b6a9e2d4f8b7a6c5d4e3f2a1b0c9d8e7f6a5b4c3d2e1f0a9b8c7d6e5f4a";

fn sign_bytes(signer: &PrivateKeySigner, nonce: &str) -> [u8; 65] {
    signer
        .sign_message_sync(challenge_message(nonce).as_bytes())
        .unwrap()
        .as_bytes()
}

#[test]
fn test_recovers_exact_signer() {
    let signer = PrivateKeySigner::from_str(ALICE_KEY).unwrap();
    let signature = format!("0x{}", hex::encode(sign_bytes(&signer, NONCE)));

    let recovered = recover_signer(NONCE, &signature).unwrap();

    assert_eq!(recovered, WalletAddress::from(signer.address()));
    assert_eq!(
        recovered.to_checksum(),
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
    );
}

#[test]
fn test_accepts_signature_without_prefix() {
    let signer = PrivateKeySigner::from_str(ALICE_KEY).unwrap();
    let signature = hex::encode(sign_bytes(&signer, NONCE));

    let recovered = recover_signer(NONCE, &signature).unwrap();
    assert_eq!(recovered, WalletAddress::from(signer.address()));
}

#[test]
fn test_accepts_zero_based_recovery_id() {
    let signer = PrivateKeySigner::from_str(ALICE_KEY).unwrap();
    let mut bytes = sign_bytes(&signer, NONCE);
    bytes[64] -= 27;

    let recovered = recover_signer(NONCE, &hex::encode(bytes)).unwrap();
    assert_eq!(recovered, WalletAddress::from(signer.address()));
}

#[test]
fn test_other_nonce_recovers_other_address() {
    let signer = PrivateKeySigner::from_str(ALICE_KEY).unwrap();
    let signature = hex::encode(sign_bytes(&signer, NONCE));

    let other_nonce = "00".repeat(32);
    if let Ok(recovered) = recover_signer(&other_nonce, &signature) {
        assert_ne!(recovered, WalletAddress::from(signer.address()));
    }
}

#[test]
fn test_every_single_bit_flip_breaks_the_signature() {
    let signer = PrivateKeySigner::from_str(ALICE_KEY).unwrap();
    let expected = WalletAddress::from(signer.address());
    let original = sign_bytes(&signer, NONCE);

    for bit in 0..original.len() * 8 {
        let mut tampered = original;
        tampered[bit / 8] ^= 1 << (bit % 8);

        if let Ok(recovered) = recover_signer(NONCE, &hex::encode(tampered)) {
            assert_ne!(recovered, expected, "bit {} flip still recovered the signer", bit);
        }
    }
}
