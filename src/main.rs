use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rainbow_notifications::{
    config::{Config, GatewayBackend, StoreBackend},
    routes,
    services::{
        Database, DeliveryGateway, FcmGateway, LogGateway, MemoryStore, NotificationStore,
        TokenStore,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 初始化日志
    init_tracing(&config);

    info!("Starting Rainbow notifications service...");

    // 初始化存储
    let (notifications, tokens): (Arc<dyn NotificationStore>, Arc<dyn TokenStore>) =
        match config.store_backend {
            StoreBackend::Surrealdb => {
                let db = Arc::new(Database::new(&config).await?);
                db.verify_connection().await?;
                info!("Database connection established successfully");

                let notifications: Arc<dyn NotificationStore> = db.clone();
                let tokens: Arc<dyn TokenStore> = db;
                (notifications, tokens)
            }
            StoreBackend::Memory => {
                warn!("Using in-memory store, data will be lost on restart");
                let store = Arc::new(MemoryStore::new());

                let notifications: Arc<dyn NotificationStore> = store.clone();
                let tokens: Arc<dyn TokenStore> = store;
                (notifications, tokens)
            }
        };

    // 初始化推送网关
    let gateway: Arc<dyn DeliveryGateway> = match config.gateway_backend {
        GatewayBackend::Fcm => Arc::new(FcmGateway::from_config(&config)?),
        GatewayBackend::Log => {
            warn!("Using log gateway, push messages will not be delivered");
            Arc::new(LogGateway)
        }
    };

    let app_state = Arc::new(AppState::new(config.clone(), notifications, tokens, gateway));
    let app = routes::app(app_state);

    // 启动主服务器
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(&config.log_level);

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, closing connections...");
}
