//! Authentication service
//!
//! Drives the two-step wallet login. Per address a challenge moves
//! `NoChallenge -> ChallengeIssued -> Consumed | Expired`, after which a new
//! [`AuthService::request_nonce`] starts over. The nonce is taken out of the
//! store before the signature is checked, so every login attempt burns the
//! challenge whether it succeeds or not, and nothing that fails later
//! (directory or session issuing) can bring it back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

use super::address::{canonicalize, AddressError, WalletAddress};
use super::crypto::{challenge_message, parse_signature, recover_from_signature, CryptoError};
use super::directory::{DirectoryError, UserDirectory};
use super::nonce_store::{NonceError, NonceStore};
use super::session::{SessionError, SessionIssuer, SessionTokens};

/// Stand-in recovered against when no challenge is outstanding
const UNISSUED_NONCE: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("Nonce not found")]
    NonceNotFound,

    #[error("Nonce expired")]
    NonceExpired,

    #[error("Invalid signature: {0}")]
    InvalidSignature(#[from] CryptoError),

    #[error("Recovered signer {recovered} does not match {claimed}")]
    SignatureMismatch {
        claimed: WalletAddress,
        recovered: WalletAddress,
    },

    #[error("User directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl From<NonceError> for AuthError {
    fn from(e: NonceError) -> Self {
        match e {
            NonceError::NotFound => AuthError::NonceNotFound,
            NonceError::Expired => AuthError::NonceExpired,
        }
    }
}

impl AuthError {
    /// Stable name of the failure, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidAddress(_) => "invalid_address",
            AuthError::NonceNotFound => "nonce_not_found",
            AuthError::NonceExpired => "nonce_expired",
            AuthError::InvalidSignature(_) => "invalid_signature",
            AuthError::SignatureMismatch { .. } => "signature_mismatch",
            AuthError::Directory(_) => "directory",
            AuthError::Session(_) => "session",
        }
    }
}

/// Challenge handed to a client
#[derive(Debug, Clone)]
pub struct Challenge {
    pub address: WalletAddress,
    pub nonce: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity passed on to the session issuer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub user_id: Uuid,
    pub address: WalletAddress,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: AuthenticatedIdentity,
    pub user: User,
    pub tokens: SessionTokens,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    nonce_store: Arc<NonceStore>,
    users: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionIssuer>,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        nonce_store: Arc<NonceStore>,
        users: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionIssuer>,
    ) -> Self {
        Self {
            nonce_store,
            users,
            sessions,
        }
    }

    /// Issue a fresh challenge for `raw_address`, discarding any earlier one
    pub fn request_nonce(&self, raw_address: &str) -> Result<Challenge, AuthError> {
        let address = canonicalize(raw_address)?;
        let record = self.nonce_store.generate(address);

        tracing::info!(
            address = %address,
            expires_at = %record.expires_at,
            "Issued authentication nonce"
        );

        Ok(Challenge {
            address,
            message: challenge_message(record.nonce.as_str()),
            nonce: record.nonce.into_inner(),
            expires_at: record.expires_at,
        })
    }

    /// Verify a signed challenge and open a session
    pub async fn login(&self, raw_address: &str, signature: &str) -> Result<LoginOutcome, AuthError> {
        let address = canonicalize(raw_address)?;
        let signature = parse_signature(signature);

        let record = self.nonce_store.consume(&address);

        // Recovery runs whether or not a challenge was outstanding, so both
        // outcomes cost the same
        let nonce = record
            .as_ref()
            .map_or(UNISSUED_NONCE, |record| record.nonce.as_str());
        let recovered = signature.and_then(|signature| recover_from_signature(nonce, &signature));

        record?;
        let recovered = recovered?;

        if recovered != address {
            return Err(AuthError::SignatureMismatch {
                claimed: address,
                recovered,
            });
        }

        let user = self.users.find_or_create(&address).await?;
        let identity = AuthenticatedIdentity {
            user_id: user.id,
            address,
        };

        let tokens = self.sessions.issue(identity.user_id, &identity.address).await?;

        tracing::info!(user_id = %identity.user_id, address = %address, "Wallet login succeeded");

        Ok(LoginOutcome {
            identity,
            user,
            tokens,
        })
    }

    /// Look up a user by ID
    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.users.find_by_id(user_id).await?)
    }

    pub fn nonce_store(&self) -> &Arc<NonceStore> {
        &self.nonce_store
    }

    pub fn users(&self) -> &Arc<dyn UserDirectory> {
        &self.users
    }
}
