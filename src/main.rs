use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{info, warn};

use formcheck::ai::HttpGateway;
use formcheck::app::AppConfig;
use formcheck::client::{DirectoryFrames, FileAudioSink, HttpSpeech, LiveSession, ProxyClient, UploadClip};
use formcheck::domain::catalog::{self, PoseCategory};
use formcheck::domain::gauge::ScoreTier;
use formcheck::services::AnalysisService;

const USAGE: &str = "用法:
  formcheck serve [config.toml]
  formcheck analyze <video> <pose-id> [config.toml]
  formcheck live <frames-dir> <pose-id> [config.toml]
  formcheck poses";

// ============================================================================
// 子命令
// ============================================================================

/// 启动分析代理服务
async fn run_server(config: AppConfig) -> Result<()> {
    let settings = config.proxy_settings();
    if settings.api_key.is_none() {
        warn!("⚠️ 未配置 {}，所有分析请求都会返回 500", settings.api_key_env);
    }

    let gateway = Arc::new(HttpGateway::new(config.gateway_url.clone()));
    let service = Arc::new(AnalysisService::new(settings, gateway));

    info!("🔌 上游网关: {}", config.gateway_url);
    info!("🤖 模型: {}", config.model);
    formcheck::server::serve(&config.bind_addr, service, config.request_body_limit()).await
}

/// 上传视频到正在运行的代理，打印完整分析
async fn run_analyze(config: AppConfig, video: &Path, pose_id: &str) -> Result<()> {
    let pose = catalog::find(pose_id).ok_or_else(|| anyhow!("未知动作: {}", pose_id))?;
    let clip = UploadClip::from_path(video, config.max_upload_bytes)?;

    info!("📤 上传 {} ({} 字节)，动作: {}", video.display(), clip.size, pose.name);
    let client = ProxyClient::new(config.proxy_url.clone());
    let result = client.analyze_clip(clip.base64, clip.mime_type, pose.name).await?;

    println!("{}: {} / 100 ({})", pose.name, result.score, ScoreTier::from_score(result.score).label());
    println!("✅ {}", result.quick_win);
    println!("🔧 {}", result.quick_fix);
    println!("\nWhat to Correct:");
    for item in &result.corrections {
        println!("  - {}", item);
    }
    println!("\nWhat You Did Well:");
    for item in &result.praise {
        println!("  - {}", item);
    }
    println!("\nHow to Improve:");
    for item in &result.tips {
        println!("  - {}", item);
    }

    Ok(())
}

/// 实时教练：循环读取目录中的帧，按间隔请求反馈，Ctrl-C 结束
async fn run_live(config: AppConfig, frames_dir: &Path, pose_id: &str) -> Result<()> {
    let pose = catalog::find(pose_id).ok_or_else(|| anyhow!("未知动作: {}", pose_id))?;
    let frames = Arc::new(DirectoryFrames::open(frames_dir)?);
    let client = ProxyClient::new(config.proxy_url.clone());

    let mut session = LiveSession::new(client, frames, pose.name);
    if let Some(tts_url) = &config.tts_url {
        let sink = Arc::new(FileAudioSink::new(frames_dir.join("audio"))?);
        session = session.with_speech(Arc::new(HttpSpeech::new(tts_url.clone(), sink)));
        info!("🔊 语音反馈已开启: {}", tts_url);
    }

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = stop_tx.send(());
    });

    info!("🎥 实时教练: {}，按 Ctrl-C 结束", pose.name);
    let summary = session
        .run(config.first_frame_delay(), config.live_interval(), stop_rx)
        .await;

    println!("\nSession Feedback:");
    for entry in &summary.feedback {
        println!("  [{}] {}", entry.at.format("%H:%M:%S"), entry.text);
    }
    match summary.best_score {
        Some(score) => println!("Best score: {} / 100 ({})", score, ScoreTier::from_score(score).label()),
        None => println!("Best score: -"),
    }

    Ok(())
}

fn print_poses() {
    for category in PoseCategory::ALL {
        println!("{}", category.label());
        for pose in catalog::by_category(category) {
            println!("  {:<16} {}", pose.id, pose.name);
        }
    }
}

// ============================================================================
// 主函数
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    formcheck::logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("serve");

    match command {
        "serve" => {
            let config_path = args.get(1).map(PathBuf::from);
            let config = AppConfig::load(config_path.as_deref())?;
            run_server(config).await
        }
        "analyze" => {
            let (video, pose_id) = match (args.get(1), args.get(2)) {
                (Some(video), Some(pose_id)) => (PathBuf::from(video), pose_id.clone()),
                _ => return Err(anyhow!("{}", USAGE)),
            };
            let config_path = args.get(3).map(PathBuf::from);
            let config = AppConfig::load(config_path.as_deref())?;
            run_analyze(config, &video, &pose_id).await
        }
        "live" => {
            let (frames_dir, pose_id) = match (args.get(1), args.get(2)) {
                (Some(dir), Some(pose_id)) => (PathBuf::from(dir), pose_id.clone()),
                _ => return Err(anyhow!("{}", USAGE)),
            };
            let config_path = args.get(3).map(PathBuf::from);
            let config = AppConfig::load(config_path.as_deref())?;
            run_live(config, &frames_dir, &pose_id).await
        }
        "poses" => {
            print_poses();
            Ok(())
        }
        _ => Err(anyhow!("{}", USAGE)),
    }
}
