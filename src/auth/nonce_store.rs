//! In-memory nonce store
//!
//! Holds at most one live challenge per wallet address. The map is a
//! [`DashMap`], so every operation on one address runs under that address's
//! shard lock and is linearizable, while addresses living in other shards
//! never wait on each other. Nothing here performs I/O and no lock is held
//! across an `.await`.
//!
//! Expiry is checked lazily in [`NonceStore::consume`] and that check is the
//! only one that decides whether a challenge is still usable.
//! [`NonceStore::purge_expired`] exists to bound memory and is never relied on
//! for correctness.

use std::fmt;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::RngCore;
use thiserror::Error;

use super::address::WalletAddress;
use crate::time_source::{SystemTimeSource, SystemTimeSourceDefault};

/// Default challenge lifetime in seconds
pub const DEFAULT_NONCE_TTL_SECONDS: i64 = 300;

/// Random bytes per nonce (256 bits)
pub const NONCE_BYTES: usize = 32;

/// Errors returned when consuming a challenge
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NonceError {
    #[error("Nonce not found")]
    NotFound,

    #[error("Nonce expired")]
    Expired,
}

/// Single-use challenge token, rendered as lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nonce(String);

impl Nonce {
    fn random() -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outstanding challenge for one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceRecord {
    pub address: WalletAddress,
    pub nonce: Nonce,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NonceRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Process-local store of outstanding challenges
pub struct NonceStore {
    records: DashMap<WalletAddress, NonceRecord>,
    ttl: Duration,
    time_source: Arc<dyn SystemTimeSource>,
}

impl NonceStore {
    /// Create a store with the default TTL and the system clock
    pub fn new() -> Self {
        Self::with_ttl(
            Duration::seconds(DEFAULT_NONCE_TTL_SECONDS),
            Arc::new(SystemTimeSourceDefault),
        )
    }

    pub fn with_ttl(ttl: Duration, time_source: Arc<dyn SystemTimeSource>) -> Self {
        Self {
            records: DashMap::new(),
            ttl,
            time_source,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh challenge for `address`
    ///
    /// Any earlier record for the same address is replaced in the same step
    /// and can no longer be consumed, even if it has not expired yet.
    pub fn generate(&self, address: WalletAddress) -> NonceRecord {
        let issued_at = self.time_source.now();
        let record = NonceRecord {
            address,
            nonce: Nonce::random(),
            issued_at,
            expires_at: issued_at + self.ttl,
        };

        if self.records.insert(address, record.clone()).is_some() {
            tracing::debug!(address = %address, "Replaced outstanding nonce");
        }

        record
    }

    /// Take the challenge for `address` out of the store
    ///
    /// The record is removed whatever the outcome, so a given challenge can be
    /// consumed at most once. An expired record is removed and reported as
    /// [`NonceError::Expired`].
    pub fn consume(&self, address: &WalletAddress) -> Result<NonceRecord, NonceError> {
        let (_, record) = self.records.remove(address).ok_or(NonceError::NotFound)?;

        if record.is_expired_at(self.time_source.now()) {
            return Err(NonceError::Expired);
        }

        Ok(record)
    }

    /// Drop every expired record, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.time_source.now();
        let mut purged = 0;

        self.records.retain(|_, record| {
            let keep = !record.is_expired_at(now);
            if !keep {
                purged += 1;
            }
            keep
        });

        purged
    }

    /// Number of records currently held, expired or not
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically purge expired nonces until the task is dropped
pub async fn run_nonce_sweeper(store: Arc<NonceStore>, period: StdDuration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let purged = store.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, remaining = store.len(), "Purged expired nonces");
        }
    }
}
