use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::models::PushPriority;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,
    pub api_prefix: String,
    pub cors_allowed_origins: String,

    // Storage configuration
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub database_namespace: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    // Push gateway configuration
    pub gateway_backend: GatewayBackend,
    pub fcm_credentials_path: String,
    pub fcm_endpoint: String,
    pub fcm_project_id: Option<String>,
    pub fcm_access_token: Option<String>,

    // Dispatch settings
    pub dispatch_concurrency: usize,
    pub delivery_timeout_secs: u64,
    pub push_priority: PushPriority,
    pub push_ttl_secs: u64,
    pub push_web_icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Surrealdb,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayBackend {
    Fcm,
    Log,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "surrealdb" | "surreal" => Ok(Self::Surrealdb),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!("Unknown STORE_BACKEND: {}", other)),
        }
    }
}

impl std::str::FromStr for GatewayBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fcm" => Ok(Self::Fcm),
            "log" => Ok(Self::Log),
            other => Err(anyhow::anyhow!("Unknown GATEWAY_BACKEND: {}", other)),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "rainbow_notifications=debug,tower_http=debug".to_string()),
            api_prefix: env::var("API_PREFIX").unwrap_or_default(),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),

            store_backend: env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "surrealdb".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            database_namespace: env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "rainbow".to_string()),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "notifications".to_string()),
            database_username: env::var("DATABASE_USERNAME")
                .unwrap_or_else(|_| "root".to_string()),
            database_password: env::var("DATABASE_PASSWORD")
                .unwrap_or_else(|_| "root".to_string()),

            gateway_backend: env::var("GATEWAY_BACKEND")
                .unwrap_or_else(|_| "fcm".to_string())
                .parse()?,
            fcm_credentials_path: env::var("FCM_CREDENTIALS_PATH")
                .unwrap_or_else(|_| "credentials.json".to_string()),
            fcm_endpoint: env::var("FCM_ENDPOINT")
                .unwrap_or_else(|_| "https://fcm.googleapis.com".to_string()),
            fcm_project_id: env::var("FCM_PROJECT_ID").ok(),
            fcm_access_token: env::var("FCM_ACCESS_TOKEN").ok(),

            dispatch_concurrency: env::var("DISPATCH_CONCURRENCY")
                .unwrap_or_else(|_| "8".to_string())
                .parse()?,
            delivery_timeout_secs: env::var("DELIVERY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            push_priority: env::var("PUSH_PRIORITY")
                .unwrap_or_else(|_| "high".to_string())
                .parse()?,
            push_ttl_secs: env::var("PUSH_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()?,
            push_web_icon: env::var("PUSH_WEB_ICON")
                .unwrap_or_else(|_| "/assets/logo.png".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }

    pub fn push_ttl(&self) -> Duration {
        Duration::from_secs(self.push_ttl_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            environment: "development".to_string(),
            log_level: "rainbow_notifications=debug,tower_http=debug".to_string(),
            api_prefix: String::new(),
            cors_allowed_origins: "http://localhost:3001".to_string(),
            store_backend: StoreBackend::Memory,
            database_url: "http://localhost:8000".to_string(),
            database_namespace: "rainbow".to_string(),
            database_name: "notifications".to_string(),
            database_username: "root".to_string(),
            database_password: "root".to_string(),
            gateway_backend: GatewayBackend::Log,
            fcm_credentials_path: "credentials.json".to_string(),
            fcm_endpoint: "https://fcm.googleapis.com".to_string(),
            fcm_project_id: None,
            fcm_access_token: None,
            dispatch_concurrency: 8,
            delivery_timeout_secs: 10,
            push_priority: PushPriority::High,
            push_ttl_secs: 86400,
            push_web_icon: "/assets/logo.png".to_string(),
        }
    }
}
