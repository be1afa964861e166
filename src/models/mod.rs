//! Data models for the marketplace auth server

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod auth;
pub use auth::*;

/// User model, keyed by canonical wallet address
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub address: String,
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A freshly registered user with no profile data
    pub fn new(address: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            address,
            username: None,
            avatar: None,
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub address: String,
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub verified: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            address: user.address,
            username: user.username,
            avatar: user.avatar,
            verified: user.verified,
        }
    }
}
