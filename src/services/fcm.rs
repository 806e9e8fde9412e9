use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    models::{push::token_preview, PushMessage, PushPriority},
    services::gateway::{DeliveryGateway, GatewayError},
};

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Google 服务账号凭据 (credentials.json)
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccount {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read FCM credentials {}: {}", path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at - ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS) > Utc::now()
    }
}

enum FcmAuth {
    Static(String),
    ServiceAccount {
        account: ServiceAccount,
        cached: RwLock<Option<CachedToken>>,
    },
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

// ---- FCM HTTP v1 wire format ----

#[derive(Serialize)]
struct SendRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Serialize)]
struct FcmMessage<'a> {
    token: &'a str,
    notification: FcmNotification<'a>,
    data: &'a BTreeMap<String, String>,
    webpush: WebpushConfig<'a>,
    android: AndroidConfig<'a>,
    apns: ApnsConfig,
}

#[derive(Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct WebpushConfig<'a> {
    headers: BTreeMap<&'static str, String>,
    notification: WebpushNotification<'a>,
}

#[derive(Serialize)]
struct WebpushNotification<'a> {
    title: &'a str,
    body: &'a str,
    icon: &'a str,
}

#[derive(Serialize)]
struct AndroidConfig<'a> {
    priority: &'static str,
    ttl: String,
    notification: FcmNotification<'a>,
}

#[derive(Serialize)]
struct ApnsConfig {
    headers: BTreeMap<&'static str, String>,
}

#[derive(Deserialize)]
struct SendResponse {
    name: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorStatus,
}

#[derive(Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    #[serde(default)]
    error_code: Option<String>,
}

fn build_request(message: &PushMessage) -> SendRequest<'_> {
    let hints = &message.hints;
    let ttl_secs = hints.ttl.as_secs();
    let (urgency, android_priority, apns_priority) = match hints.priority {
        PushPriority::High => ("high", "high", "10"),
        PushPriority::Normal => ("normal", "normal", "5"),
    };

    let mut webpush_headers = BTreeMap::new();
    webpush_headers.insert("TTL", ttl_secs.to_string());
    webpush_headers.insert("Urgency", urgency.to_string());

    let mut apns_headers = BTreeMap::new();
    apns_headers.insert("apns-priority", apns_priority.to_string());

    SendRequest {
        message: FcmMessage {
            token: &message.token,
            notification: FcmNotification {
                title: &message.title,
                body: &message.body,
            },
            data: &message.data,
            webpush: WebpushConfig {
                headers: webpush_headers,
                notification: WebpushNotification {
                    title: &message.title,
                    body: &message.body,
                    icon: &hints.web_icon,
                },
            },
            android: AndroidConfig {
                priority: android_priority,
                ttl: format!("{}s", ttl_secs),
                notification: FcmNotification {
                    title: &message.title,
                    body: &message.body,
                },
            },
            apns: ApnsConfig {
                headers: apns_headers,
            },
        },
    }
}

fn classify_error(status: StatusCode, body: &str) -> GatewayError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();

    let unregistered = status == StatusCode::NOT_FOUND
        || parsed.as_ref().map_or(false, |b| {
            b.error
                .details
                .iter()
                .any(|d| d.error_code.as_deref() == Some("UNREGISTERED"))
        });
    if unregistered {
        return GatewayError::Unregistered;
    }

    let detail = parsed
        .map(|b| b.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        GatewayError::Auth(detail)
    } else {
        GatewayError::Rejected {
            status: status.as_u16(),
            detail,
        }
    }
}

/// Firebase Cloud Messaging HTTP v1 客户端
pub struct FcmGateway {
    http_client: Client,
    endpoint: String,
    project_id: String,
    auth: FcmAuth,
}

impl FcmGateway {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let timeout = config.delivery_timeout();

        if let Some(token) = &config.fcm_access_token {
            let project_id = config
                .fcm_project_id
                .clone()
                .ok_or_else(|| anyhow::anyhow!("FCM_PROJECT_ID is required with FCM_ACCESS_TOKEN"))?;
            info!("Using static FCM access token for project {}", project_id);
            return Self::with_static_token(&config.fcm_endpoint, &project_id, token, timeout);
        }

        let mut account = ServiceAccount::from_file(&config.fcm_credentials_path)?;
        if let Some(project_id) = &config.fcm_project_id {
            account.project_id = project_id.clone();
        }
        info!(
            "Using FCM service account {} for project {}",
            account.client_email, account.project_id
        );
        Self::with_service_account(&config.fcm_endpoint, account, timeout)
    }

    pub fn with_static_token(
        endpoint: &str,
        project_id: &str,
        access_token: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            auth: FcmAuth::Static(access_token.to_string()),
        })
    }

    pub fn with_service_account(
        endpoint: &str,
        account: ServiceAccount,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        // 提前校验私钥，启动时即可发现配置错误
        EncodingKey::from_rsa_pem(account.private_key.as_bytes())?;

        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: account.project_id.clone(),
            auth: FcmAuth::ServiceAccount {
                account,
                cached: RwLock::new(None),
            },
        })
    }

    fn send_url(&self) -> String {
        format!("{}/v1/projects/{}/messages:send", self.endpoint, self.project_id)
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        let (account, cached) = match &self.auth {
            FcmAuth::Static(token) => return Ok(token.clone()),
            FcmAuth::ServiceAccount { account, cached } => (account, cached),
        };

        if let Some(token) = cached.read().await.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        let mut slot = cached.write().await;
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        let fresh = self.exchange_assertion(account).await?;
        let access_token = fresh.access_token.clone();
        *slot = Some(fresh);
        Ok(access_token)
    }

    async fn exchange_assertion(&self, account: &ServiceAccount) -> Result<CachedToken, GatewayError> {
        debug!("Requesting FCM access token from {}", account.token_uri);

        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &account.client_email,
            scope: FCM_SCOPE,
            aud: &account.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| GatewayError::Auth(e.to_string()))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| GatewayError::Auth(e.to_string()))?;

        let response = self
            .http_client
            .post(&account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Auth(e.to_string()))?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in),
        })
    }

    async fn invalidate_token(&self) {
        if let FcmAuth::ServiceAccount { cached, .. } = &self.auth {
            *cached.write().await = None;
        }
    }
}

#[async_trait]
impl DeliveryGateway for FcmGateway {
    async fn send(&self, message: &PushMessage) -> Result<String, GatewayError> {
        let access_token = self.access_token().await?;

        let response = self
            .http_client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&build_request(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let sent: SendResponse = response
                .json()
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))?;
            debug!("FCM accepted message for {}: {}", token_preview(&message.token), sent.name);
            return Ok(sent.name);
        }

        let body = response.text().await.unwrap_or_default();
        let err = classify_error(status, &body);
        if matches!(err, GatewayError::Auth(_)) {
            warn!("FCM rejected credentials, dropping cached access token");
            self.invalidate_token().await;
        }
        Err(err)
    }
}
