use axum::http::StatusCode;
use thiserror::Error;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please wait a moment and try again.";
pub const QUOTA_MESSAGE: &str = "AI usage limit reached. Please add credits.";

/// 模型回复无法还原为 JSON
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Failed to parse AI response")]
    NoJsonObject,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// 代理返回给调用方的错误，`status()` 决定 HTTP 状态码
#[derive(Debug, Error)]
pub enum ProxyError {
    /// 上游凭证未配置，参数为环境变量名
    #[error("{0} not configured")]
    Configuration(String),
    #[error("Rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,
    #[error("AI usage limit reached. Please add credits.")]
    QuotaExceeded,
    #[error("AI gateway error: {0}")]
    Gateway(u16),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Transport(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 按上游的非 2xx 状态码映射错误
    pub fn from_upstream_status(status: u16) -> Self {
        match status {
            429 => ProxyError::RateLimited,
            402 => ProxyError::QuotaExceeded,
            other => ProxyError::Gateway(other),
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        ProxyError::Transport(e.to_string())
    }
}
