use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::ai::prompt::build_messages;
use crate::ai::{ChatGateway, ChatRequest};
use crate::domain::{AnalysisReply, AnalysisRequest, AnalyzeRequestBody, ProxyError};
use crate::utils::normalize_model_reply;

/// 代理运行所需的配置，启动时由 `AppConfig::proxy_settings` 生成
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// 上游密钥，`None` 表示未配置
    pub api_key: Option<String>,
    /// 密钥对应的环境变量名，用于错误提示
    pub api_key_env: String,
    pub model: String,
}

/// 姿势分析代理：构造请求、调用网关、修复并返回 JSON
pub struct AnalysisService {
    settings: ProxySettings,
    gateway: Arc<dyn ChatGateway>,
}

impl AnalysisService {
    pub fn new(settings: ProxySettings, gateway: Arc<dyn ChatGateway>) -> Self {
        Self { settings, gateway }
    }

    fn api_key(&self) -> Result<&str, ProxyError> {
        self.settings
            .api_key
            .as_deref()
            .ok_or_else(|| ProxyError::Configuration(self.settings.api_key_env.clone()))
    }

    /// 处理原始请求体。凭证检查先于请求解析
    pub async fn handle(&self, body: &[u8]) -> Result<Value, ProxyError> {
        self.api_key()?;

        let body: AnalyzeRequestBody = serde_json::from_slice(body)
            .map_err(|e| ProxyError::InvalidRequest(e.to_string()))?;
        let request = AnalysisRequest::try_from_body(body)?;

        self.analyze(request).await
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> Result<Value, ProxyError> {
        let span = info_span!("analyze", request_id = %Uuid::new_v4());
        self.analyze_inner(request).instrument(span).await
    }

    async fn analyze_inner(&self, request: AnalysisRequest) -> Result<Value, ProxyError> {
        let api_key = self.api_key()?;

        info!(
            "开始分析动作: {}，模式: {:?}，媒体类型: {}",
            request.pose_name,
            request.mode,
            request.media.kind()
        );

        let chat_request = ChatRequest {
            model: self.settings.model.clone(),
            messages: build_messages(&request),
        };

        let content = self.gateway.complete(api_key, &chat_request).await?;
        debug!("模型原始回复: {}", content);

        let value = normalize_model_reply(&content).map_err(|e| {
            error!("解析模型回复失败: {}，原始内容: {}", e, content);
            e
        })?;

        // 只做诊断，结构不符时仍原样返回
        match AnalysisReply::decode(request.mode, &value) {
            Ok(AnalysisReply::Full(result)) if !result.within_bounds() => {
                warn!("模型返回的分数或条目数量超出约定范围，原样返回");
            }
            Ok(AnalysisReply::Live(live)) if !(0..=100).contains(&live.score) => {
                warn!("模型返回的分数超出 0-100: {}", live.score);
            }
            Ok(reply) => info!("分析完成，得分: {}", reply.score()),
            Err(e) => warn!("模型回复结构不符合预期: {}，原样返回", e),
        }

        Ok(value)
    }
}
