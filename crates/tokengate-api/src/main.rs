//! Tokengate API 서버.
//!
//! 환경 변수:
//! - `API_HOST`, `API_PORT`: 바인딩 주소 (기본 127.0.0.1:3000)
//! - `DEPLOYED`, `SECRET_KEY`, `ISSUER`, `TOKEN_EXPIRE_TIME`: 인증 설정
//! - `RUST_LOG`, `LOG_FORMAT`: 로깅
//! - `CORS_ORIGINS`: 쉼표로 구분된 허용 origin 목록

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{header, Method, StatusCode};
use tokengate_api::{create_router, AppState};
use tokengate_core::{init_logging_from_env, AuthConfig, InMemoryCredentialStore};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

/// 서버 설정.
struct ServerConfig {
    host: String,
    port: u16,
}

impl ServerConfig {
    fn from_env() -> Self {
        let host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self { host, port }
    }

    fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// CORS 설정.
///
/// `CORS_ORIGINS`가 없으면 모든 origin을 허용합니다 (개발용).
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            info!(count = origins.len(), "CORS configured");
            AllowOrigin::list(origins)
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env는 여기서 한 번만 로드 (로깅 설정보다 먼저)
    let _ = dotenvy::dotenv();

    init_logging_from_env().context("failed to initialize logging")?;
    info!("Starting tokengate server...");

    let auth_config = Arc::new(AuthConfig::from_env().context("invalid auth configuration")?);
    info!(
        mode = ?auth_config.mode,
        issuer = %auth_config.issuer,
        ttl_secs = auth_config.ttl_secs(),
        "Auth configuration loaded"
    );

    let store = Arc::new(InMemoryCredentialStore::new());
    let state = AppState::new(auth_config, store).context("failed to build application state")?;

    let app = create_router(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer());

    let config = ServerConfig::from_env();
    let addr = config.socket_addr().inspect_err(|e| {
        error!(host = %config.host, port = config.port, error = %e, "Invalid API_HOST/API_PORT");
    })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM 대기.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, shutting down"),
        _ = terminate => warn!("Received SIGTERM, shutting down"),
    }
}
