use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::models::{push::token_preview, PushMessage};

#[derive(Error, Debug)]
pub enum GatewayError {
    /// The provider no longer recognises the device token.
    #[error("token is not registered with the push provider")]
    Unregistered,

    #[error("push provider rejected the message ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("push provider unreachable: {0}")]
    Transport(String),

    #[error("push provider authentication failed: {0}")]
    Auth(String),

    #[error("delivery timed out after {0}s")]
    Timeout(u64),
}

impl GatewayError {
    pub fn is_unregistered(&self) -> bool {
        matches!(self, GatewayError::Unregistered)
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Transport(format!("request timed out: {}", err))
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

/// Single-message push delivery. Returns the provider's message id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<String, GatewayError>;
}

/// 只记录日志的网关，用于本地开发
#[derive(Debug, Clone, Default)]
pub struct LogGateway;

#[async_trait]
impl DeliveryGateway for LogGateway {
    async fn send(&self, message: &PushMessage) -> Result<String, GatewayError> {
        info!(
            "[log gateway] push to {}: {} ({} data keys)",
            token_preview(&message.token),
            message.title,
            message.data.len()
        );
        Ok(format!("log/{}", uuid::Uuid::new_v4().simple()))
    }
}
