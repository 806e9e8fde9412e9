use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    models::{Notification, TokenSet},
    services::store::{NotificationStore, StoreError, TokenStore},
};

/// 内存存储，用于开发环境和测试
#[derive(Clone, Default)]
pub struct MemoryStore {
    notifications: Arc<RwLock<HashMap<String, Notification>>>,
    tokens: Arc<RwLock<HashMap<String, TokenSet>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notification_count(&self) -> usize {
        self.notifications.read().await.len()
    }

    pub async fn notifications_for(&self, user_id: &str) -> Vec<Notification> {
        self.notifications
            .read()
            .await
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn put(&self, notification: &Notification) -> Result<(), StoreError> {
        debug!("Storing notification {} in memory", notification.notification_id);
        self.notifications
            .write()
            .await
            .insert(notification.notification_id.clone(), notification.clone());
        Ok(())
    }

    async fn get(&self, notification_id: &str) -> Result<Option<Notification>, StoreError> {
        Ok(self.notifications.read().await.get(notification_id).cloned())
    }

    async fn mark_read(&self, notification_id: &str) -> Result<Option<Notification>, StoreError> {
        let mut notifications = self.notifications.write().await;
        Ok(notifications.get_mut(notification_id).map(|n| {
            n.is_read = true;
            n.clone()
        }))
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn tokens_for(&self, user_id: &str) -> Result<Option<TokenSet>, StoreError> {
        Ok(self.tokens.read().await.get(user_id).cloned())
    }

    async fn add_token(&self, user_id: &str, token: &str) -> Result<bool, StoreError> {
        // 持有写锁完成整个读-改-写
        let mut tokens = self.tokens.write().await;
        let set = tokens
            .entry(user_id.to_string())
            .or_insert_with(|| TokenSet::new(user_id));
        Ok(set.insert(token))
    }
}
