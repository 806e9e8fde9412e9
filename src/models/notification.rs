use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// 通知记录，以 `notificationId` 作为存储主键
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub notification_id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build a fresh unread notification with a generated id.
    pub fn new(user_id: &str, title: &str, body: &str, data: Map<String, Value>) -> Self {
        Self {
            notification_id: Self::generate_id(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    pub fn generate_id() -> String {
        format!("notification_{}", Uuid::new_v4().simple())
    }
}

/// POST / 请求体，除 userId/title/body 外均可省略
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub notification_id: Option<String>,
    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,
    #[validate(required, length(min = 1))]
    pub title: Option<String>,
    #[validate(required, length(min = 1))]
    pub body: Option<String>,
    pub data: Option<Map<String, Value>>,
    pub is_read: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
}

impl CreateNotificationRequest {
    /// Fill in the defaults for every omitted field.
    pub fn into_notification(self) -> Notification {
        let notification_id = self
            .notification_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(Notification::generate_id);

        Notification {
            notification_id,
            user_id: self.user_id.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            data: self.data.unwrap_or_default(),
            is_read: self.is_read.unwrap_or(false),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// POST /send 请求体
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,
    #[validate(required, length(min = 1))]
    pub title: Option<String>,
    #[validate(required, length(min = 1))]
    pub body: Option<String>,
    pub data: Option<Map<String, Value>>,
}

/// 一次分发的汇总结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchResult {
    Success {
        sent: usize,
        failed: usize,
        #[serde(rename = "notificationId")]
        notification_id: String,
    },
    NoTokens {
        message: String,
        sent: usize,
        failed: usize,
    },
}

impl DispatchResult {
    pub fn no_tokens(message: &str) -> Self {
        Self::NoTokens {
            message: message.to_string(),
            sent: 0,
            failed: 0,
        }
    }

    pub fn sent(&self) -> usize {
        match self {
            Self::Success { sent, .. } | Self::NoTokens { sent, .. } => *sent,
        }
    }

    pub fn failed(&self) -> usize {
        match self {
            Self::Success { failed, .. } | Self::NoTokens { failed, .. } => *failed,
        }
    }

    pub fn notification_id(&self) -> Option<&str> {
        match self {
            Self::Success { notification_id, .. } => Some(notification_id),
            Self::NoTokens { .. } => None,
        }
    }
}
