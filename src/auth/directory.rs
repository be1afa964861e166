//! User directory
//!
//! Resolves a canonical wallet address to a user record, creating the record
//! on first login. Postgres backs it in deployments; the in-memory variant
//! serves tests and database-less local runs.

use dashmap::DashMap;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::address::WalletAddress;
use crate::models::User;

/// User directory errors
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for DirectoryError {
    fn from(e: sqlx::Error) -> Self {
        DirectoryError::DatabaseError(e.to_string())
    }
}

#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Idempotent upsert keyed on the canonical address
    async fn find_or_create(&self, address: &WalletAddress) -> Result<User, DirectoryError>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, DirectoryError>;

    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;

    async fn check_health(&self) -> Result<(), DirectoryError>;
}

/// Postgres-backed user directory
#[derive(Clone)]
pub struct PgUserDirectory {
    db_pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait::async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_or_create(&self, address: &WalletAddress) -> Result<User, DirectoryError> {
        let candidate = User::new(address.to_checksum());

        // The no-op update makes RETURNING yield the existing row on conflict
        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, address, verified, created_at, updated_at)
            VALUES ($1, $2, FALSE, $3, $4)
            ON CONFLICT (address) DO UPDATE SET address = EXCLUDED.address
            RETURNING id, address, username, avatar, verified, created_at, updated_at
            "#,
        )
        .bind(candidate.id)
        .bind(&candidate.address)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .fetch_one(&self.db_pool)
        .await?;

        if user.id == candidate.id {
            tracing::info!(user_id = %user.id, address = %user.address, "Registered new user");
        }

        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, DirectoryError> {
        let user = sqlx::query_as(
            r#"
            SELECT id, address, username, avatar, verified, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn check_health(&self) -> Result<(), DirectoryError> {
        let latency = crate::db::ping(&self.db_pool)
            .await
            .map_err(|e| DirectoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(latency_ms = latency.as_millis(), "Database ping");
        Ok(())
    }
}

/// Process-local user directory
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: DashMap<WalletAddress, User>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_or_create(&self, address: &WalletAddress) -> Result<User, DirectoryError> {
        let user = self
            .users
            .entry(*address)
            .or_insert_with(|| {
                let user = User::new(address.to_checksum());
                tracing::info!(user_id = %user.id, address = %user.address, "Registered new user");
                user
            })
            .clone();

        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, DirectoryError> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().id == user_id)
            .map(|entry| entry.value().clone()))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn check_health(&self) -> Result<(), DirectoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::address::canonicalize;

    #[tokio::test]
    async fn test_in_memory_find_or_create_is_idempotent() {
        let directory = InMemoryUserDirectory::new();
        let address = canonicalize("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();

        let first = directory.find_or_create(&address).await.unwrap();
        let second = directory.find_or_create(&address).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.address, "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert!(!first.verified);
        assert_eq!(directory.len(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_find_by_id() {
        let directory = InMemoryUserDirectory::new();
        let address = canonicalize("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap();
        let user = directory.find_or_create(&address).await.unwrap();

        assert_eq!(directory.find_by_id(user.id).await.unwrap(), Some(user));
        assert_eq!(directory.find_by_id(Uuid::new_v4()).await.unwrap(), None);
    }
}
