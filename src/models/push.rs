use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushPriority {
    Normal,
    High,
}

impl std::str::FromStr for PushPriority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "normal" => Ok(Self::Normal),
            other => Err(anyhow::anyhow!("Unknown PUSH_PRIORITY: {}", other)),
        }
    }
}

/// 各平台的投递提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryHints {
    pub priority: PushPriority,
    pub ttl: Duration,
    pub web_icon: String,
}

impl Default for DeliveryHints {
    fn default() -> Self {
        Self {
            priority: PushPriority::High,
            ttl: Duration::from_secs(86400),
            web_icon: "/assets/logo.png".to_string(),
        }
    }
}

/// 发往单个设备令牌的推送消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
    pub hints: DeliveryHints,
}

/// 单个令牌的投递结果，只在一次分发内存在
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub token: String,
    pub success: bool,
    pub error_detail: Option<String>,
}

impl DeliveryOutcome {
    pub fn delivered(token: &str) -> Self {
        Self {
            token: token.to_string(),
            success: true,
            error_detail: None,
        }
    }

    pub fn failed(token: &str, detail: impl Into<String>) -> Self {
        Self {
            token: token.to_string(),
            success: false,
            error_detail: Some(detail.into()),
        }
    }
}

/// Tokens are credentials for a device; logs only carry a prefix.
pub fn token_preview(token: &str) -> String {
    match token.char_indices().nth(20) {
        Some((idx, _)) => format!("{}...", &token[..idx]),
        None => token.to_string(),
    }
}
