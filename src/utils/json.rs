use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::domain::FormatError;

static FENCE_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```json\s*").expect("invalid fence regex"));
static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*").expect("invalid fence regex"));
static TRAILING_COMMA_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*\}").expect("invalid trailing comma regex"));
static TRAILING_COMMA_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*\]").expect("invalid trailing comma regex"));
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x1F\x7F]").expect("invalid control char regex"));

/// 去掉 LLM 回复中的 markdown 代码块标记并 trim
pub fn strip_code_fences(input: &str) -> String {
    let without_json = FENCE_JSON.replace_all(input, "");
    FENCE.replace_all(&without_json, "").trim().to_string()
}

/// 截取第一个 `{` 到最后一个 `}`（含）之间的内容
pub fn extract_object_span(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    // `}` 出现在 `{` 之前也按缺少 JSON 对象处理，不交给解析器
    if end < start {
        return None;
    }
    Some(&input[start..=end])
}

/// 修复常见的 JSON 格式问题：结尾多余逗号、控制字符
pub fn repair_json(input: &str) -> String {
    let fixed = TRAILING_COMMA_OBJECT.replace_all(input, "}");
    let fixed = TRAILING_COMMA_ARRAY.replace_all(&fixed, "]");
    CONTROL_CHARS.replace_all(&fixed, "").into_owned()
}

/// 把模型的自由文本回复还原为 JSON 对象
///
/// 先严格解析，失败后做一次修复再解析；第二次仍失败则返回解析错误。
pub fn normalize_model_reply(raw: &str) -> Result<Value, FormatError> {
    let cleaned = strip_code_fences(raw);
    let span = extract_object_span(&cleaned).ok_or(FormatError::NoJsonObject)?;

    match serde_json::from_str(span) {
        Ok(value) => Ok(value),
        Err(e) => {
            debug!("严格解析失败，尝试修复: {}", e);
            let repaired = repair_json(span);
            Ok(serde_json::from_str(&repaired)?)
        }
    }
}
