use crate::{
    error::{AppError, Result},
    models::{push::token_preview, RegisterTokenResponse},
    services::store::TokenStore,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Add a device token to the user's set. Registering a known token is a no-op.
    pub async fn register_token(&self, user_id: &str, token: &str) -> Result<RegisterTokenResponse> {
        if user_id.is_empty() || token.is_empty() {
            return Err(AppError::validation("Missing userId or token"));
        }

        let added = self.store.add_token(user_id, token).await.map_err(|e| {
            error!("Error registering token for user {}: {}", user_id, e);
            AppError::from(e)
        })?;

        if added {
            info!("Registered token {} for user {}", token_preview(token), user_id);
            Ok(RegisterTokenResponse::success("Token registered successfully"))
        } else {
            Ok(RegisterTokenResponse::success("Token already registered"))
        }
    }
}
