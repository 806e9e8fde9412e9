use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        dispatch::DispatchService,
        gateway::DeliveryGateway,
        notification::NotificationService,
        store::{NotificationStore, TokenStore},
        token::TokenService,
    },
};

/// 应用程序的共享状态
/// 所有服务都通过构造参数注入存储和网关
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 通知服务
    pub notification_service: NotificationService,

    /// 令牌服务
    pub token_service: TokenService,

    /// 分发服务
    pub dispatch_service: DispatchService,
}

impl AppState {
    pub fn new(
        config: Config,
        notifications: Arc<dyn NotificationStore>,
        tokens: Arc<dyn TokenStore>,
        gateway: Arc<dyn DeliveryGateway>,
    ) -> Self {
        let dispatch_service =
            DispatchService::new(notifications.clone(), tokens.clone(), gateway, &config);

        Self {
            notification_service: NotificationService::new(notifications),
            token_service: TokenService::new(tokens),
            dispatch_service,
            config,
        }
    }
}
