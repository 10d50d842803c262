use crate::ai::gateway::{ChatMessage, ContentPart};
use crate::domain::{AnalysisMode, AnalysisRequest};

pub const SYSTEM_PROMPT: &str = "You are FormCheck AI, an expert pose analysis coach for calisthenics, aerial circus (silks, hoop, trapeze), and pole fitness athletes.

When analyzing a pose image/video frame:
1. Identify the pose the athlete is attempting
2. Evaluate their form on a scale of 0-100
3. Provide specific corrections referencing body parts (use \"your left/right\" from the athlete's perspective)
4. Praise what they're doing well
5. Give actionable improvement tips

IMPORTANT: Always respond with valid JSON matching the requested format. Be encouraging but honest.";

/// 实时模式：一句话反馈加分数
fn build_live_prompt(pose_name: &str) -> String {
    format!(
        "The athlete is practicing: {}. Analyze this camera frame and give ONE short sentence of real-time coaching feedback. Also provide a score. Respond as JSON: {{\"feedback\":\"...\",\"score\":NUMBER}}",
        pose_name
    )
}

/// 完整模式：详细评分与建议
fn build_full_prompt(pose_name: &str) -> String {
    format!(
        "The athlete is attempting: {}. Analyze their form in detail. Respond as JSON:
{{\"score\":NUMBER,\"quickWin\":\"...\",\"quickFix\":\"...\",\"corrections\":[\"...\"],\"praise\":[\"...\"],\"tips\":[\"...\"]}}
- score: 0-100 rating
- quickWin: ONE short sentence (max 10 words) summarizing what they did best
- quickFix: ONE short sentence (max 10 words) summarizing the #1 thing to fix
- corrections: 2-4 specific things to fix
- praise: 1-3 things done well
- tips: 2-3 actionable improvement suggestions",
        pose_name
    )
}

pub fn build_user_prompt(mode: AnalysisMode, pose_name: &str) -> String {
    match mode {
        AnalysisMode::Live => build_live_prompt(pose_name),
        AnalysisMode::Full => build_full_prompt(pose_name),
    }
}

/// 组装 system + 多模态 user 两条消息
pub fn build_messages(request: &AnalysisRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(vec![
            ContentPart::text(build_user_prompt(request.mode, &request.pose_name)),
            ContentPart::image_url(request.media.data_uri(&request.mime_type)),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MediaPayload;
    use serde_json::json;

    fn request(mode: AnalysisMode) -> AnalysisRequest {
        AnalysisRequest {
            media: MediaPayload::Image { base64: "QUJD".to_string() },
            mime_type: "image/jpeg".to_string(),
            pose_name: "Front Lever".to_string(),
            mode,
        }
    }

    #[test]
    fn test_live_prompt() {
        let prompt = build_user_prompt(AnalysisMode::Live, "Handstand");

        assert!(prompt.contains("practicing: Handstand"), "prompt 应该包含动作名称");
        assert!(prompt.contains(r#"{"feedback":"...","score":NUMBER}"#), "prompt 应该包含返回格式");
        assert!(!prompt.contains("quickWin"), "实时模式不应要求完整分析字段");
    }

    #[test]
    fn test_full_prompt_states_bounds() {
        let prompt = build_user_prompt(AnalysisMode::Full, "Planche");

        assert!(prompt.contains("attempting: Planche"));
        assert!(prompt.contains("corrections: 2-4"));
        assert!(prompt.contains("praise: 1-3"));
        assert!(prompt.contains("tips: 2-3"));
        assert!(prompt.contains("max 10 words"));
    }

    #[test]
    fn test_messages_shape() {
        let messages = build_messages(&request(AnalysisMode::Live));
        let value = serde_json::to_value(&messages).unwrap();

        assert_eq!(value[0]["role"], "system");
        assert_eq!(value[0]["content"], SYSTEM_PROMPT);
        assert_eq!(value[1]["role"], "user");
        assert_eq!(value[1]["content"][0]["type"], "text");
        assert_eq!(
            value[1]["content"][1],
            json!({"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,QUJD"}})
        );
    }
}
