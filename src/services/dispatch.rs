use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::{
    config::Config,
    error::{AppError, Result},
    models::{
        push::token_preview, DeliveryHints, DeliveryOutcome, DispatchResult, Notification,
        PushMessage,
    },
    services::{
        gateway::{DeliveryGateway, GatewayError},
        store::{NotificationStore, TokenStore},
    },
    utils::normalize_data,
};

/// 通知分发服务：查找令牌、写入记录、逐个投递并汇总结果
#[derive(Clone)]
pub struct DispatchService {
    notifications: Arc<dyn NotificationStore>,
    tokens: Arc<dyn TokenStore>,
    gateway: Arc<dyn DeliveryGateway>,
    hints: DeliveryHints,
    concurrency: usize,
    delivery_timeout: Duration,
}

impl DispatchService {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        tokens: Arc<dyn TokenStore>,
        gateway: Arc<dyn DeliveryGateway>,
        config: &Config,
    ) -> Self {
        Self {
            notifications,
            tokens,
            gateway,
            hints: DeliveryHints {
                priority: config.push_priority,
                ttl: config.push_ttl(),
                web_icon: config.push_web_icon.clone(),
            },
            concurrency: config.dispatch_concurrency.max(1),
            delivery_timeout: config.delivery_timeout(),
        }
    }

    pub async fn send_notification(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        data: Option<Map<String, Value>>,
    ) -> Result<DispatchResult> {
        if user_id.is_empty() || title.is_empty() || body.is_empty() {
            return Err(AppError::validation("Missing required fields"));
        }
        info!("Sending notification to user {} with title: {}", user_id, title);

        let token_set = match self.tokens.tokens_for(user_id).await {
            Ok(Some(set)) => set,
            Ok(None) => {
                debug!("No token document for user {}", user_id);
                return Ok(DispatchResult::no_tokens("No tokens found for this user"));
            }
            Err(e) => {
                error!("Failed to load tokens for user {}: {}", user_id, e);
                return Err(e.into());
            }
        };
        if token_set.is_empty() {
            return Ok(DispatchResult::no_tokens("User has no registered tokens"));
        }

        let data = data.unwrap_or_default();
        let payload = normalize_data(&data);

        // 先落库再投递，全部失败时记录依然存在
        let notification = Notification::new(user_id, title, body, data);
        if let Err(e) = self.notifications.put(&notification).await {
            error!("Failed to store notification for user {}: {}", user_id, e);
            return Err(e.into());
        }

        let messages: Vec<PushMessage> = token_set
            .tokens
            .into_iter()
            .map(|token| PushMessage {
                token,
                title: title.to_string(),
                body: body.to_string(),
                data: payload.clone(),
                hints: self.hints.clone(),
            })
            .collect();

        let outcomes: Vec<DeliveryOutcome> = stream::iter(messages)
            .map(|message| self.deliver(message))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let sent = outcomes.iter().filter(|o| o.success).count();
        let failed = outcomes.len() - sent;
        info!(
            "Notification {} for user {}: {} sent, {} failed",
            notification.notification_id, user_id, sent, failed
        );

        Ok(DispatchResult::Success {
            sent,
            failed,
            notification_id: notification.notification_id,
        })
    }

    async fn deliver(&self, message: PushMessage) -> DeliveryOutcome {
        let preview = token_preview(&message.token);

        let result = match tokio::time::timeout(self.delivery_timeout, self.gateway.send(&message)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.delivery_timeout.as_secs())),
        };

        match result {
            Ok(message_id) => {
                info!("Notification sent successfully to {}: {}", preview, message_id);
                DeliveryOutcome::delivered(&message.token)
            }
            Err(e) => {
                if e.is_unregistered() {
                    // 令牌不会被自动移除，仅记录以便排查
                    warn!("Token {} is no longer registered with the provider", preview);
                } else {
                    error!("Failed to send to token {}: {}", preview, e);
                }
                DeliveryOutcome::failed(&message.token, e.to_string())
            }
        }
    }
}
