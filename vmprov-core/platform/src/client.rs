//! 平台客户端核心实现

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{InventoryApi, SnapshotApi, TaskApi, VmApi};
use crate::error::{PlatformError, Result};

/// 平台客户端配置
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// 连接超时（秒）
    pub connect_timeout: u64,

    /// 请求超时（秒）
    pub request_timeout: u64,

    /// 是否验证 SSL 证书
    pub verify_ssl: bool,

    /// 任务状态轮询间隔（毫秒）
    pub task_poll_interval_ms: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            connect_timeout: 10,
            request_timeout: 30,
            verify_ssl: true,
            task_poll_interval_ms: 1000,
        }
    }
}

/// 平台客户端（已认证的会话句柄）
pub struct PlatformClient {
    /// API 基础 URL
    base_url: String,

    /// HTTP 客户端
    http_client: Client,

    /// 认证令牌
    access_token: Arc<RwLock<Option<String>>>,

    /// 配置
    config: PlatformConfig,
}

impl PlatformClient {
    /// 创建新的平台客户端（未登录）
    pub fn new(base_url: &str, config: PlatformConfig) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| PlatformError::ConfigError(format!("无效的平台地址 {}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PlatformError::ConfigError(format!(
                "不支持的协议: {}",
                parsed.scheme()
            )));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| PlatformError::HttpError(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            access_token: Arc::new(RwLock::new(None)),
            config,
        })
    }

    /// 建立已认证会话
    pub async fn connect(
        endpoint: &str,
        username: &str,
        password: &str,
        config: PlatformConfig,
    ) -> Result<Self> {
        let mut client = Self::new(endpoint, config)?;
        client.login(username, password).await?;
        Ok(client)
    }

    /// 创建会话并保存令牌
    ///
    /// 密码以 MD5 摘要提交，令牌随后通过 `Token` 请求头发送
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        info!("平台客户端登录: {}", username);

        let credentials = Credentials {
            username,
            password_digest: format!("{:x}", md5::compute(password.as_bytes())),
        };

        let response = self
            .http_client
            .post(format!("{}/api/v1/session", self.base_url))
            .json(&credentials)
            .send()
            .await
            .map_err(|e| PlatformError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::AuthError(format!("平台登录失败: HTTP {}", status)));
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PlatformError::ParseError(e.to_string()))?;

        let session: Session = unwrap_envelope(envelope).map_err(|e| match e {
            PlatformError::ApiError(_, msg) => PlatformError::AuthError(format!("平台登录失败: {}", msg)),
            other => other,
        })?;

        *self.access_token.write().await = Some(session.token);

        info!("平台客户端登录成功");
        Ok(())
    }

    /// 获取清单查询 API
    pub fn inventory(&self) -> InventoryApi<'_> {
        InventoryApi::new(self)
    }

    /// 获取虚拟机管理 API
    pub fn vm(&self) -> VmApi<'_> {
        VmApi::new(self)
    }

    /// 获取快照管理 API
    pub fn snapshot(&self) -> SnapshotApi<'_> {
        SnapshotApi::new(self)
    }

    /// 获取任务管理 API
    pub fn task(&self) -> TaskApi<'_> {
        TaskApi::new(self)
    }

    /// 客户端配置
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// 发送 HTTP 请求并解开 `{status, msg, data}` 响应封装
    pub(crate) async fn request<T: Serialize, R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<T>,
    ) -> Result<R> {
        let url = format!("{}{}", self.base_url, path);
        debug!("平台 API 请求: {} {}", method, url);

        let token = self.get_token().await?;

        let mut request = self
            .http_client
            .request(method.clone(), &url)
            .header("Token", token)
            .header("Content-Type", "application/json");

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PlatformError::HttpError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PlatformError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "无法读取错误响应".to_string());
            warn!("API 请求失败: {} - {}", status, error_text);
            return Err(PlatformError::ApiError(status.as_u16(), error_text));
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PlatformError::ParseError(e.to_string()))?;

        unwrap_envelope(envelope)
    }

    /// 获取当前访问令牌
    pub async fn get_token(&self) -> Result<String> {
        let token = self.access_token.read().await;
        token
            .clone()
            .ok_or_else(|| PlatformError::AuthError("未认证，请先登录".to_string()))
    }
}

/// 登录请求体
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials<'a> {
    username: &'a str,
    password_digest: String,
}

/// 登录响应中的会话信息
#[derive(Deserialize)]
struct Session {
    token: String,
}

/// 检查响应状态码并取出 data 字段
fn unwrap_envelope<R: DeserializeOwned>(envelope: serde_json::Value) -> Result<R> {
    if envelope["status"].as_i64().unwrap_or(-1) != 0 {
        let msg = envelope["msg"].as_str().unwrap_or("未知错误");
        return Err(PlatformError::ApiError(500, msg.to_string()));
    }

    serde_json::from_value(envelope["data"].clone())
        .map_err(|e| PlatformError::ParseError(e.to_string()))
}
