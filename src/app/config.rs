use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::services::analysis::ProxySettings;

/// JSON 外壳（mimeType、poseName 等字段）预留的字节数
const BODY_ENVELOPE_BYTES: u64 = 64 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// 直接写在配置里的密钥，优先于环境变量
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    #[serde(default)]
    pub tts_url: Option<String>,
    #[serde(default = "default_live_interval_secs")]
    pub live_interval_secs: u64,
    #[serde(default = "default_first_frame_delay_secs")]
    pub first_frame_delay_secs: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = config_path.unwrap_or_else(|| Path::new("config.toml"));
        if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
            let cfg: AppConfig = toml::from_str(&raw)
                .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
            return Ok(cfg);
        }
        Ok(AppConfig::default())
    }

    /// 启动时解析一次上游凭证，之后注入到分析服务中
    pub fn proxy_settings(&self) -> ProxySettings {
        let api_key = self
            .api_key
            .as_deref()
            .and_then(non_blank)
            .or_else(|| std::env::var(&self.api_key_env).ok().as_deref().and_then(non_blank));

        ProxySettings {
            api_key,
            api_key_env: self.api_key_env.clone(),
            model: self.model.clone(),
        }
    }

    /// 代理接受的请求体上限：视频 base64 编码后的长度加上 JSON 外壳
    pub fn request_body_limit(&self) -> usize {
        let encoded = self.max_upload_bytes.div_ceil(3) * 4;
        usize::try_from(encoded + BODY_ENVELOPE_BYTES).unwrap_or(usize::MAX)
    }

    pub fn live_interval(&self) -> Duration {
        Duration::from_secs(self.live_interval_secs)
    }

    pub fn first_frame_delay(&self) -> Duration {
        Duration::from_secs(self.first_frame_delay_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            gateway_url: default_gateway_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            api_key: None,
            proxy_url: default_proxy_url(),
            tts_url: None,
            live_interval_secs: default_live_interval_secs(),
            first_frame_delay_secs: default_first_frame_delay_secs(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn non_blank(key: &str) -> Option<String> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8787".to_string()
}

fn default_gateway_url() -> String {
    "https://ai.gateway.lovable.dev/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "google/gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "LOVABLE_API_KEY".to_string()
}

fn default_proxy_url() -> String {
    "http://127.0.0.1:8787/analyze-pose".to_string()
}

fn default_live_interval_secs() -> u64 {
    6
}

fn default_first_frame_delay_secs() -> u64 {
    2
}

fn default_max_upload_bytes() -> u64 {
    20 * 1024 * 1024
}
