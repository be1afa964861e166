//! Wallet authentication
//!
//! Challenge-response login for EVM wallets:
//! - Address canonicalization (EIP-55)
//! - Single-use, expiring nonces held in memory
//! - EIP-191 signature recovery
//! - JWT access and refresh tokens

mod address;
mod crypto;
mod directory;
mod jwt;
mod nonce_store;
mod service;
mod session;

pub use address::{canonicalize, AddressError, WalletAddress};
pub use crypto::{
    challenge_message, parse_signature, recover_from_signature, recover_signer, CryptoError,
    AUTH_MESSAGE_PREFIX,
};
pub use directory::{DirectoryError, InMemoryUserDirectory, PgUserDirectory, UserDirectory};
pub use jwt::{Claims, JwtSessionIssuer, TokenType};
pub use nonce_store::{
    run_nonce_sweeper, Nonce, NonceError, NonceRecord, NonceStore, DEFAULT_NONCE_TTL_SECONDS,
    NONCE_BYTES,
};
pub use service::{AuthError, AuthService, AuthenticatedIdentity, Challenge, LoginOutcome};
pub use session::{SessionError, SessionIssuer, SessionTokens};
