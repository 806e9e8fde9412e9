use crate::config::Config;
use crate::models::{Notification, TokenSet};
use crate::services::store::{
    NotificationStore, StoreError, TokenStore, NOTIFICATIONS_TABLE, TOKENS_TABLE,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::{info, error, debug};

/// `tokens` 表中的文档，记录 id 即用户 id
#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenDocument {
    #[serde(default)]
    tokens: Vec<String>,
}

/// SurrealDB 文档存储
#[derive(Clone)]
pub struct Database {
    client: Surreal<Any>,
}

impl Database {
    /// 创建新的数据库实例
    pub async fn new(config: &Config) -> Result<Self, StoreError> {
        info!("Initializing database connection to {}", config.database_url);

        let client = any::connect(config.database_url.as_str())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // 嵌入式引擎 (mem://) 不需要登录
        if !config.database_url.starts_with("mem://") {
            client
                .signin(Root {
                    username: &config.database_username,
                    password: &config.database_password,
                })
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }

        client
            .use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        Ok(Self { client })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<(), StoreError> {
        match self.client.query("INFO FOR DB").await.and_then(|r| r.check()) {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(StoreError::Unavailable(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl NotificationStore for Database {
    async fn put(&self, notification: &Notification) -> Result<(), StoreError> {
        debug!("Writing notification {}", notification.notification_id);

        // UPDATE 对单条记录是 create-or-replace
        let _: Option<Notification> = self
            .client
            .update((NOTIFICATIONS_TABLE, notification.notification_id.as_str()))
            .content(notification)
            .await?;
        Ok(())
    }

    async fn get(&self, notification_id: &str) -> Result<Option<Notification>, StoreError> {
        let notification: Option<Notification> = self
            .client
            .select((NOTIFICATIONS_TABLE, notification_id))
            .await?;
        Ok(notification)
    }

    async fn mark_read(&self, notification_id: &str) -> Result<Option<Notification>, StoreError> {
        // 先确认存在，避免 UPDATE 凭空创建记录
        if self.get(notification_id).await?.is_none() {
            return Ok(None);
        }

        let updated: Option<Notification> = self
            .client
            .update((NOTIFICATIONS_TABLE, notification_id))
            .merge(json!({ "isRead": true }))
            .await?;
        Ok(updated)
    }
}

#[async_trait]
impl TokenStore for Database {
    async fn tokens_for(&self, user_id: &str) -> Result<Option<TokenSet>, StoreError> {
        let document: Option<TokenDocument> = self.client.select((TOKENS_TABLE, user_id)).await?;

        Ok(document.map(|doc| TokenSet {
            user_id: user_id.to_string(),
            tokens: doc.tokens,
        }))
    }

    async fn add_token(&self, user_id: &str, token: &str) -> Result<bool, StoreError> {
        // 单条语句完成并集更新，并发注册不会互相覆盖
        // $token 是 SurrealDB 保留变量，不能绑定
        let query = r#"
            UPDATE type::thing($table, $user_id)
            SET tokens = array::union(tokens ?? [], [$device_token])
            RETURN BEFORE
        "#;

        let mut response = self
            .client
            .query(query)
            .bind(("table", TOKENS_TABLE))
            .bind(("user_id", user_id))
            .bind(("device_token", token))
            .await?;

        let before: Option<TokenDocument> = response.take(0)?;
        let already_present = before
            .map(|doc| doc.tokens.iter().any(|t| t == token))
            .unwrap_or(false);

        Ok(!already_present)
    }
}
