use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Notification, TokenSet};

pub const NOTIFICATIONS_TABLE: &str = "notifications";
pub const TOKENS_TABLE: &str = "tokens";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

/// Notification records keyed by `notificationId`.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Create or replace the record under its id.
    async fn put(&self, notification: &Notification) -> Result<(), StoreError>;

    async fn get(&self, notification_id: &str) -> Result<Option<Notification>, StoreError>;

    /// Flip `isRead` to true. `None` when the record does not exist.
    async fn mark_read(&self, notification_id: &str) -> Result<Option<Notification>, StoreError>;
}

/// Device tokens keyed by user id.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn tokens_for(&self, user_id: &str) -> Result<Option<TokenSet>, StoreError>;

    /// Atomically union `token` into the user's set, creating the set if
    /// needed. Returns `true` if the token was newly added.
    async fn add_token(&self, user_id: &str, token: &str) -> Result<bool, StoreError>;
}
