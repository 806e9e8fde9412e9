use crate::{
    error::{AppError, Result},
    models::{CreateNotificationRequest, Notification},
    services::store::NotificationStore,
};
use std::sync::Arc;
use tracing::{debug, error};
use validator::Validate;

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Store a notification as given, filling in id and timestamp when
    /// absent. The stored record is returned without a re-read.
    pub async fn create_notification(&self, request: CreateNotificationRequest) -> Result<Notification> {
        request
            .validate()
            .map_err(|_| AppError::validation("Missing required fields"))?;

        let notification = request.into_notification();
        debug!("Creating notification {}", notification.notification_id);

        self.store.put(&notification).await.map_err(|e| {
            error!("Error creating notification: {}", e);
            AppError::from(e)
        })?;

        Ok(notification)
    }

    pub async fn get_notification(&self, notification_id: &str) -> Result<Notification> {
        self.store
            .get(notification_id)
            .await
            .map_err(|e| {
                error!("Error fetching notification {}: {}", notification_id, e);
                AppError::from(e)
            })?
            .ok_or_else(|| AppError::not_found("Notification"))
    }

    pub async fn mark_read(&self, notification_id: &str) -> Result<Notification> {
        self.store
            .mark_read(notification_id)
            .await
            .map_err(|e| {
                error!("Error updating notification {}: {}", notification_id, e);
                AppError::from(e)
            })?
            .ok_or_else(|| AppError::not_found("Notification"))
    }
}
