use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::domain::catalog;
use crate::services::AnalysisService;

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalysisService>,
}

/// `body_limit` 为请求体字节上限，需要容纳 base64 编码后的整段视频
pub fn router(service: Arc<AnalysisService>, body_limit: usize) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/", post(analyze_pose).options(preflight))
        .route("/analyze-pose", post(analyze_pose).options(preflight))
        .route("/poses", get(list_poses).options(preflight))
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(map_response(finalize_response))
}

/// 绑定地址并运行服务，收到 Ctrl-C 后退出
pub async fn serve(bind_addr: &str, service: Arc<AnalysisService>, body_limit: usize) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("绑定地址失败: {}", bind_addr))?;
    info!("🚀 姿势分析服务已启动: {}", listener.local_addr()?);

    info!("📦 请求体上限: {} 字节", body_limit);

    axum::serve(listener, router(service, body_limit))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("收到退出信号，正在关闭服务");
        })
        .await
        .context("服务运行失败")?;

    Ok(())
}

fn cors_headers() -> [(header::HeaderName, &'static str); 2] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
    ]
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_string(body) {
        Ok(text) => (
            status,
            cors_headers(),
            [(header::CONTENT_TYPE, "application/json")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!("序列化响应失败: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, cors_headers()).into_response()
        }
    }
}

/// 所有响应都带 CORS 头；axum 自身的拒绝响应（404/405/413 等）改写为 `{error}` JSON
async fn finalize_response(response: Response) -> Response {
    let status = response.status();
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));

    if !is_json && (status.is_client_error() || status.is_server_error()) {
        let message = status.canonical_reason().unwrap_or("Request failed");
        return json_response(status, &json!({ "error": message }));
    }

    let mut response = response;
    let headers = response.headers_mut();
    for (name, value) in cors_headers() {
        headers.insert(name, HeaderValue::from_static(value));
    }
    response
}

async fn not_found() -> Response {
    json_response(StatusCode::NOT_FOUND, &json!({ "error": "Not Found" }))
}

async fn preflight() -> Response {
    (StatusCode::OK, cors_headers()).into_response()
}

async fn analyze_pose(State(state): State<AppState>, body: Bytes) -> Response {
    match state.service.handle(&body).await {
        Ok(value) => json_response(StatusCode::OK, &value),
        Err(e) => {
            error!("analyze-pose 失败: {}", e);
            json_response(e.status(), &json!({ "error": e.to_string() }))
        }
    }
}

async fn list_poses() -> Response {
    json_response(StatusCode::OK, &catalog::poses())
}
