//! tracing 기반 로깅 초기화.
//!
//! 출력 형식은 `LOG_FORMAT`(pretty/json/compact), 레벨은 `RUST_LOG`로 정합니다.
//! 토큰, 비밀번호, 서명 키는 어떤 레벨에서도 로그에 남기지 않습니다.

use thiserror::Error;
use tracing_subscriber::{
    filter::ParseError, fmt, layer::SubscriberExt, util::SubscriberInitExt,
    util::TryInitError, EnvFilter, Layer, Registry,
};

/// 기본 필터. 인증 크레이트는 거부 사유를 보기 위해 debug까지 출력합니다.
pub const DEFAULT_LOG_FILTER: &str = "info,tokengate_core=debug";

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 개발용
    #[default]
    Pretty,
    /// 로그 수집기용
    Json,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

/// 로깅 초기화 에러.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("알 수 없는 로그 형식: {0}")]
    UnknownFormat(String),
    #[error("잘못된 로그 필터: {0}")]
    Filter(#[from] ParseError),
    #[error("로거가 이미 초기화되었습니다: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// EnvFilter 지시자 (예: "info", "tokengate_api=debug")
    pub filter: String,
    pub format: LogFormat,
    /// 파일명/줄 번호 출력
    pub with_file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            format: LogFormat::default(),
            with_file: false,
        }
    }
}

impl LogConfig {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// 환경 변수에서 설정 생성.
    ///
    /// 인식할 수 없는 `LOG_FORMAT`은 무시하고 pretty를 사용합니다.
    pub fn from_env() -> Self {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        let format = std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Self {
            filter,
            format,
            ..Default::default()
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_file)
            .with_target(true);

        match self.format {
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        }
    }
}

/// 전역 subscriber 설치.
///
/// 프로세스당 한 번만 성공합니다.
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(&config.filter)?;

    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(filter)
        .try_init()?;

    tracing::info!(format = ?config.format, filter = %config.filter, "Logging initialized");
    Ok(())
}

/// `RUST_LOG`/`LOG_FORMAT` 기반 초기화.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_logging(LogConfig::from_env())
}
