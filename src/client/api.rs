use anyhow::{Result, anyhow};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{AnalysisMode, AnalysisReply, AnalysisResult, AnalyzeRequestBody, LiveFeedback};

/// 调用姿势分析代理的 HTTP 客户端
#[derive(Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ProxyClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// 发送请求并解码为对应模式的结构
    pub async fn analyze(&self, body: &AnalyzeRequestBody) -> Result<AnalysisReply> {
        let mode = if body.live_mode {
            AnalysisMode::Live
        } else {
            AnalysisMode::Full
        };

        debug!("请求姿势分析: {:?}", body.pose_name);
        let response = self.http.post(&self.endpoint).json(body).send().await?;
        let status = response.status();
        let value: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let msg = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            warn!("分析请求失败: {} {}", status.as_u16(), msg);
            return Err(anyhow!("Analysis failed ({}): {}", status.as_u16(), msg));
        }

        AnalysisReply::decode(mode, &value)
            .map_err(|e| anyhow!("分析结果格式不正确: {}", e))
    }

    /// 上传整段视频做完整分析
    pub async fn analyze_clip(
        &self,
        video_base64: String,
        mime_type: String,
        pose_name: &str,
    ) -> Result<AnalysisResult> {
        let body = AnalyzeRequestBody {
            video_base64: Some(video_base64),
            mime_type: Some(mime_type),
            pose_name: Some(pose_name.to_string()),
            ..Default::default()
        };

        match self.analyze(&body).await? {
            AnalysisReply::Full(result) => Ok(result),
            AnalysisReply::Live(_) => Err(anyhow!("期望完整分析结果")),
        }
    }

    /// 分析单帧图像，返回实时反馈
    pub async fn analyze_frame(&self, jpeg_base64: String, pose_name: &str) -> Result<LiveFeedback> {
        let body = AnalyzeRequestBody {
            image_base64: Some(jpeg_base64),
            mime_type: Some("image/jpeg".to_string()),
            pose_name: Some(pose_name.to_string()),
            live_mode: true,
            ..Default::default()
        };

        match self.analyze(&body).await? {
            AnalysisReply::Live(feedback) => Ok(feedback),
            AnalysisReply::Full(_) => Err(anyhow!("期望实时反馈结果")),
        }
    }
}
