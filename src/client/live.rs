use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::oneshot;
use tokio::time::{Instant, interval_at, sleep};
use tracing::{debug, info, warn};

use crate::client::api::ProxyClient;
use crate::domain::LiveFeedback;

/// 摄像头等帧来源，返回 JPEG 字节；暂时没有画面时返回 None
pub trait FrameSource: Send + Sync {
    fn capture_frame(&self) -> Option<Vec<u8>>;
}

/// 按文件名顺序循环读取目录中的 JPEG 帧
pub struct DirectoryFrames {
    paths: Vec<PathBuf>,
    next: AtomicUsize,
}

impl DirectoryFrames {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("读取帧目录失败: {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(anyhow!("目录中没有 JPEG 帧: {}", dir.display()));
        }
        Ok(Self {
            paths,
            next: AtomicUsize::new(0),
        })
    }
}

impl FrameSource for DirectoryFrames {
    fn capture_frame(&self) -> Option<Vec<u8>> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.paths.len();
        let path = &self.paths[index];
        match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("读取帧失败 {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// 音频播放
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play_audio(&self, bytes: Vec<u8>) -> Result<()>;
}

/// 把反馈文字念出来
#[async_trait]
pub trait Speech: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;
}

/// 调用 TTS 接口合成语音并交给 `AudioSink` 播放
pub struct HttpSpeech {
    http: reqwest::Client,
    endpoint: String,
    sink: Arc<dyn AudioSink>,
}

impl HttpSpeech {
    pub fn new(endpoint: impl Into<String>, sink: Arc<dyn AudioSink>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            sink,
        }
    }
}

#[async_trait]
impl Speech for HttpSpeech {
    async fn speak(&self, text: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("TTS 返回 {}，跳过播放", response.status());
            return Ok(());
        }

        let bytes = response.bytes().await?;
        self.sink.play_audio(bytes.to_vec()).await
    }
}

/// 把合成的语音写入目录，每条反馈一个文件
pub struct FileAudioSink {
    dir: PathBuf,
}

impl FileAudioSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("创建音频目录失败: {}", dir.display()))?;
        Ok(Self { dir })
    }
}

#[async_trait]
impl AudioSink for FileAudioSink {
    async fn play_audio(&self, bytes: Vec<u8>) -> Result<()> {
        let path = self.dir.join(format!("{}.mp3", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("写入音频失败: {}", path.display()))?;
        info!("🔊 语音反馈: {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackEntry {
    pub text: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub feedback: Vec<FeedbackEntry>,
    pub best_score: Option<i64>,
}

/// 实时教练会话：定时截帧、请求分析、记录反馈
pub struct LiveSession {
    client: ProxyClient,
    frames: Arc<dyn FrameSource>,
    speech: Option<Arc<dyn Speech>>,
    pose_name: String,
    feedback: Vec<FeedbackEntry>,
    best_score: Option<i64>,
}

impl LiveSession {
    pub fn new(client: ProxyClient, frames: Arc<dyn FrameSource>, pose_name: impl Into<String>) -> Self {
        Self {
            client,
            frames,
            speech: None,
            pose_name: pose_name.into(),
            feedback: Vec::new(),
            best_score: None,
        }
    }

    pub fn with_speech(mut self, speech: Arc<dyn Speech>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn best_score(&self) -> Option<i64> {
        self.best_score
    }

    pub fn feedback(&self) -> &[FeedbackEntry] {
        &self.feedback
    }

    fn record(&mut self, result: &LiveFeedback) {
        if !result.feedback.is_empty() {
            self.feedback.push(FeedbackEntry {
                text: result.feedback.clone(),
                at: Utc::now(),
            });
        }
        self.best_score = Some(match self.best_score {
            Some(best) => best.max(result.score),
            None => result.score,
        });
    }

    /// 分析一帧。没有画面或请求失败时返回 None，会话继续
    pub async fn tick(&mut self) -> Option<LiveFeedback> {
        let frame = self.frames.capture_frame()?;

        let result = match self.client.analyze_frame(STANDARD.encode(&frame), &self.pose_name).await {
            Ok(result) => result,
            Err(e) => {
                warn!("实时分析失败: {}", e);
                return None;
            }
        };

        self.record(&result);

        if let Some(speech) = self.speech.clone() {
            if !result.feedback.is_empty() {
                let text = result.feedback.clone();
                tokio::spawn(async move {
                    if let Err(e) = speech.speak(&text).await {
                        debug!("语音播放失败: {}", e);
                    }
                });
            }
        }

        Some(result)
    }

    /// 首帧在 `first_delay` 后分析，之后每 `interval` 一次，直到收到停止信号
    pub async fn run(
        mut self,
        first_delay: Duration,
        interval: Duration,
        mut stop: oneshot::Receiver<()>,
    ) -> SessionSummary {
        let started = Instant::now();
        info!("实时教练会话开始: {}", self.pose_name);

        tokio::select! {
            _ = sleep(first_delay) => {
                self.tick().await;
            }
            _ = &mut stop => return self.finish(),
        }

        let mut ticker = interval_at(started + interval, interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = &mut stop => break,
            }
        }

        self.finish()
    }

    fn finish(self) -> SessionSummary {
        info!(
            "实时教练会话结束，共 {} 条反馈，最高分: {:?}",
            self.feedback.len(),
            self.best_score
        );
        SessionSummary {
            feedback: self.feedback,
            best_score: self.best_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::tests::spawn_proxy;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use std::sync::Mutex;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    struct StaticFrames(Option<Vec<u8>>);

    impl FrameSource for StaticFrames {
        fn capture_frame(&self) -> Option<Vec<u8>> {
            self.0.clone()
        }
    }

    struct ChannelSpeech(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl Speech for ChannelSpeech {
        async fn speak(&self, text: &str) -> Result<()> {
            let _ = self.0.send(text.to_string());
            Ok(())
        }
    }

    struct BrokenSpeech;

    #[async_trait]
    impl Speech for BrokenSpeech {
        async fn speak(&self, _text: &str) -> Result<()> {
            Err(anyhow!("no audio device"))
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<Vec<u8>>>);

    #[async_trait]
    impl AudioSink for RecordingSink {
        async fn play_audio(&self, bytes: Vec<u8>) -> Result<()> {
            self.0.lock().unwrap().push(bytes);
            Ok(())
        }
    }

    async fn session(reply: &'static str, api_key: Option<&str>, frame: Option<Vec<u8>>) -> LiveSession {
        let base = spawn_proxy(reply, api_key).await;
        let client = ProxyClient::new(format!("{}/analyze-pose", base));
        LiveSession::new(client, Arc::new(StaticFrames(frame)), "Handstand")
    }

    #[tokio::test]
    async fn test_tick_records_feedback_and_speaks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut live = session(
            r#"{"feedback":"Straighten your elbows.","score":62}"#,
            Some("key"),
            Some(vec![0xFF, 0xD8]),
        )
        .await
        .with_speech(Arc::new(ChannelSpeech(tx)));

        let result = live.tick().await.unwrap();

        assert_eq!(result.score, 62);
        assert_eq!(live.best_score(), Some(62));
        assert_eq!(live.feedback().len(), 1);
        let spoken = timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert_eq!(spoken.as_deref(), Some("Straighten your elbows."));
    }

    #[tokio::test]
    async fn test_tick_without_frame_is_skipped() {
        let mut live = session(r#"{"feedback":"x","score":1}"#, Some("key"), None).await;

        assert!(live.tick().await.is_none());
        assert!(live.feedback().is_empty());
        assert_eq!(live.best_score(), None);
    }

    #[tokio::test]
    async fn test_analysis_errors_are_swallowed() {
        let mut live = session("{}", None, Some(vec![1])).await;

        assert!(live.tick().await.is_none(), "请求失败时不应中断会话");
        assert!(live.feedback().is_empty());
    }

    #[tokio::test]
    async fn test_speech_failure_is_swallowed() {
        let mut live = session(r#"{"feedback":"Point your toes.","score":55}"#, Some("key"), Some(vec![1]))
            .await
            .with_speech(Arc::new(BrokenSpeech));

        let result = live.tick().await;
        assert_eq!(result.map(|r| r.score), Some(55));
    }

    #[tokio::test]
    async fn test_best_score_is_running_max() {
        let mut live = session("{}", Some("key"), None).await;

        for score in [40, 75, 60] {
            live.record(&LiveFeedback {
                feedback: format!("score {}", score),
                score,
            });
        }

        assert_eq!(live.best_score(), Some(75));
        assert_eq!(live.feedback().len(), 3);
    }

    #[tokio::test]
    async fn test_run_until_stopped() {
        let live = session(r#"{"feedback":"Hold it.","score":80}"#, Some("key"), Some(vec![1])).await;
        let (stop_tx, stop_rx) = oneshot::channel();

        let handle = tokio::spawn(live.run(
            Duration::from_millis(10),
            Duration::from_millis(50),
            stop_rx,
        ));
        sleep(Duration::from_millis(200)).await;
        stop_tx.send(()).unwrap();

        let summary = timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
        assert!(summary.feedback.len() >= 2, "应至少分析两帧，实际 {}", summary.feedback.len());
        assert_eq!(summary.best_score, Some(80));
    }

    #[tokio::test]
    async fn test_run_stopped_before_first_frame() {
        let live = session(r#"{"feedback":"Hold it.","score":80}"#, Some("key"), Some(vec![1])).await;
        let (stop_tx, stop_rx) = oneshot::channel();
        stop_tx.send(()).unwrap();

        let summary = live
            .run(Duration::from_secs(5), Duration::from_secs(5), stop_rx)
            .await;

        assert!(summary.feedback.is_empty());
        assert_eq!(summary.best_score, None);
    }

    async fn spawn_tts(status: StatusCode) -> String {
        let router = Router::new().route("/tts", post(move || async move { (status, "AUDIO") }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/tts", addr)
    }

    #[tokio::test]
    async fn test_http_speech_plays_audio() {
        let sink = Arc::new(RecordingSink::default());
        let speech = HttpSpeech::new(spawn_tts(StatusCode::OK).await, sink.clone());

        speech.speak("Lock your knees.").await.unwrap();

        assert_eq!(sink.0.lock().unwrap().as_slice(), &[b"AUDIO".to_vec()]);
    }

    #[tokio::test]
    async fn test_http_speech_ignores_failed_tts() {
        let sink = Arc::new(RecordingSink::default());
        let speech = HttpSpeech::new(spawn_tts(StatusCode::INTERNAL_SERVER_ERROR).await, sink.clone());

        speech.speak("Lock your knees.").await.unwrap();

        assert!(sink.0.lock().unwrap().is_empty(), "TTS 失败时不应播放");
    }

    #[test]
    fn test_directory_frames_cycle_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.jpg"), b"second").unwrap();
        fs::write(dir.path().join("a.JPEG"), b"first").unwrap();
        fs::write(dir.path().join("notes.txt"), b"skip").unwrap();

        let frames = DirectoryFrames::open(dir.path()).unwrap();

        assert_eq!(frames.capture_frame().as_deref(), Some(&b"first"[..]));
        assert_eq!(frames.capture_frame().as_deref(), Some(&b"second"[..]));
        assert_eq!(frames.capture_frame().as_deref(), Some(&b"first"[..]), "读完后应从头循环");
    }

    #[test]
    fn test_directory_without_jpegs_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"skip").unwrap();

        assert!(DirectoryFrames::open(dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_file_audio_sink_writes_clip() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(FileAudioSink::new(dir.path().join("audio")).unwrap());
        let speech = HttpSpeech::new(spawn_tts(StatusCode::OK).await, sink);

        speech.speak("Lock your knees.").await.unwrap();

        let files: Vec<_> = fs::read_dir(dir.path().join("audio")).unwrap().collect();
        assert_eq!(files.len(), 1, "应写入一条语音");
        let path = files[0].as_ref().unwrap().path();
        assert_eq!(fs::read(path).unwrap(), b"AUDIO");
    }
}
