use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::ProxyError;

/// 入站请求体，字段全部可选，由 `AnalysisRequest::try_from_body` 统一校验
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose_name: Option<String>,
    #[serde(default)]
    pub live_mode: bool,
}

/// 媒体负载（base64 编码）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPayload {
    Image { base64: String },
    Video { base64: String },
}

impl MediaPayload {
    pub fn base64(&self) -> &str {
        match self {
            MediaPayload::Image { base64 } | MediaPayload::Video { base64 } => base64,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MediaPayload::Image { .. } => "image",
            MediaPayload::Video { .. } => "video",
        }
    }

    /// 拼接上游需要的 data URI
    pub fn data_uri(&self, mime_type: &str) -> String {
        format!("data:{};base64,{}", mime_type, self.base64())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// 单帧实时反馈
    Live,
    /// 整段视频的完整分析
    Full,
}

/// 校验后的分析请求
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub media: MediaPayload,
    pub mime_type: String,
    pub pose_name: String,
    pub mode: AnalysisMode,
}

impl AnalysisRequest {
    pub fn try_from_body(body: AnalyzeRequestBody) -> Result<Self, ProxyError> {
        let image = body.image_base64.filter(|s| !s.is_empty());
        let video = body.video_base64.filter(|s| !s.is_empty());

        let media = match (image, video) {
            (Some(base64), None) => MediaPayload::Image { base64 },
            (None, Some(base64)) => MediaPayload::Video { base64 },
            (Some(_), Some(_)) => {
                return Err(ProxyError::InvalidRequest(
                    "Provide either imageBase64 or videoBase64, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(ProxyError::InvalidRequest(
                    "imageBase64 or videoBase64 is required".to_string(),
                ));
            }
        };

        let mime_type = body
            .mime_type
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ProxyError::InvalidRequest("mimeType is required".to_string()))?;

        let pose_name = body
            .pose_name
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ProxyError::InvalidRequest("poseName is required".to_string()))?;

        let mode = if body.live_mode {
            AnalysisMode::Live
        } else {
            AnalysisMode::Full
        };

        Ok(Self {
            media,
            mime_type,
            pose_name,
            mode,
        })
    }
}

/// 完整分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub score: i64,
    pub quick_win: String,
    pub quick_fix: String,
    pub corrections: Vec<String>,
    pub praise: Vec<String>,
    pub tips: Vec<String>,
}

impl AnalysisResult {
    /// 数量是否符合提示词中约定的范围，仅用于诊断，不做拦截
    pub fn within_bounds(&self) -> bool {
        (0..=100).contains(&self.score)
            && (2..=4).contains(&self.corrections.len())
            && (1..=3).contains(&self.praise.len())
            && (2..=3).contains(&self.tips.len())
    }
}

/// 实时模式反馈
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveFeedback {
    pub feedback: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisReply {
    Live(LiveFeedback),
    Full(AnalysisResult),
}

impl AnalysisReply {
    /// 按模式解码模型返回的 JSON
    pub fn decode(mode: AnalysisMode, value: &Value) -> Result<Self, serde_json::Error> {
        match mode {
            AnalysisMode::Live => {
                LiveFeedback::deserialize(value).map(AnalysisReply::Live)
            }
            AnalysisMode::Full => {
                AnalysisResult::deserialize(value).map(AnalysisReply::Full)
            }
        }
    }

    pub fn score(&self) -> i64 {
        match self {
            AnalysisReply::Live(live) => live.score,
            AnalysisReply::Full(full) => full.score,
        }
    }
}
