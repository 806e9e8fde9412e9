pub mod notifications;

use std::sync::Arc;
use axum::{
    http::{HeaderValue, Method},
    routing::post,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// 构建完整的应用路由，API_PREFIX 非空时整体挂载到该前缀下
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    let prefix = state.config.api_prefix.trim_matches('/');
    let router = if prefix.is_empty() {
        notifications::router()
    } else {
        // 前缀下的创建接口同时响应 "/prefix" 与 "/prefix/"
        Router::new()
            .nest(&format!("/{}", prefix), notifications::router())
            .route(&format!("/{}/", prefix), post(notifications::create_notification))
    };

    router
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if allowed_origins.trim() == "*" {
        return cors.allow_origin(Any);
    }

    cors.allow_origin(
        allowed_origins
            .split(',')
            .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
            .collect::<Vec<_>>(),
    )
}
