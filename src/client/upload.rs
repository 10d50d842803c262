use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// 待上传的视频片段
#[derive(Debug, Clone)]
pub struct UploadClip {
    pub mime_type: String,
    pub base64: String,
    pub size: u64,
}

/// 根据扩展名推断 MIME 类型
pub fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => return None,
    };
    Some(mime)
}

impl UploadClip {
    /// 读取并校验视频文件：必须是 video/*，且不超过 `max_bytes`
    pub fn from_path(path: &Path, max_bytes: u64) -> Result<Self> {
        let mime_type = guess_mime_type(path)
            .filter(|m| m.starts_with("video/"))
            .ok_or_else(|| anyhow!("Please upload a video file"))?;

        let size = fs::metadata(path)
            .with_context(|| format!("读取文件信息失败: {}", path.display()))?
            .len();
        if size > max_bytes {
            return Err(anyhow!("File must be under {}MB", max_bytes / (1024 * 1024)));
        }

        let bytes = fs::read(path).with_context(|| format!("读取文件失败: {}", path.display()))?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            base64: STANDARD.encode(&bytes),
            size,
        })
    }
}
