//! 설정 관리 -- tailwatch.toml 파싱 및 런타임 설정
//!
//! [`WatchConfig`]는 감시 파일, 폴링 주기, 싱크, 필터, 출력 형식을 담는 최상위 구조체입니다.
//! 핫 리로드 시 같은 경로에서 매번 다시 로드되고 다시 검증됩니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (daemon에서 `[general]` 일부만)
//! 2. 환경변수 (`TAILWATCH_SENDER_TYPE=webhook` 형식)
//! 3. 설정 파일 (`tailwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), tailwatch_core::error::TailwatchError> {
//! use tailwatch_core::config::WatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드 + 정규화 + 검증
//! let config = WatchConfig::load("tailwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱 (정규화/검증 없음)
//! let config = WatchConfig::parse("log_file = \"/var/log/app.log\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TailwatchError};
use crate::types::Level;

/// `poll_interval_ms`가 0 이하일 때 적용되는 기본 폴링 주기
pub const DEFAULT_POLL_INTERVAL_MS: i64 = 500;

/// 폴링 주기 상한 (1시간)
const MAX_POLL_INTERVAL_MS: i64 = 3_600_000;

/// 웹훅 싱크 기본 API 주소
pub const DEFAULT_WEBHOOK_BASE_URL: &str = "https://api.telegram.org";

/// Tailwatch 설정 문서
///
/// `tailwatch.toml` 파일의 최상위 구조를 나타냅니다.
/// 리로드 시 내용이 같은 문서인지 판단하기 위해 `PartialEq`를 구현합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// 감시할 로그 파일 경로
    pub log_file: String,
    /// 폴링 주기 (밀리초, 0 이하는 기본값으로 정규화)
    pub poll_interval_ms: i64,
    /// 일반 설정 (시작 시에만 적용)
    pub general: GeneralConfig,
    /// 싱크 선택
    pub sender: SenderConfig,
    /// 웹훅 싱크 자격 증명
    pub webhook: WebhookConfig,
    /// 레벨/정규식 필터
    pub filters: FiltersConfig,
    /// 출력 형식 토글
    pub format: FormatConfig,
    /// Prometheus 메트릭 설정
    pub metrics: MetricsConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            log_file: String::new(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            general: GeneralConfig::default(),
            sender: SenderConfig::default(),
            webhook: WebhookConfig::default(),
            filters: FiltersConfig::default(),
            format: FormatConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl WatchConfig {
    /// TOML 파일에서 설정을 로드합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 정규화 (레벨 대문자화, 싱크 별칭 해석, 폴링 주기 기본값)
    /// 4. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TailwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일을 읽어 파싱만 합니다 (오버라이드/정규화/검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TailwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TailwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TailwatchError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, TailwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            TailwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `TAILWATCH_{SECTION}_{FIELD}`
    /// 예: `TAILWATCH_WEBHOOK_BOT_TOKEN=123:abc`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.log_file, "TAILWATCH_LOG_FILE");
        override_i64(&mut self.poll_interval_ms, "TAILWATCH_POLL_INTERVAL_MS");

        // General
        override_string(&mut self.general.log_level, "TAILWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "TAILWATCH_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.pid_file, "TAILWATCH_GENERAL_PID_FILE");
        override_u64(
            &mut self.general.dedup_ttl_secs,
            "TAILWATCH_GENERAL_DEDUP_TTL_SECS",
        );
        override_u64(
            &mut self.general.reload_interval_ms,
            "TAILWATCH_GENERAL_RELOAD_INTERVAL_MS",
        );
        override_u64(
            &mut self.general.send_timeout_secs,
            "TAILWATCH_GENERAL_SEND_TIMEOUT_SECS",
        );

        // Sender / Webhook
        override_string(&mut self.sender.kind, "TAILWATCH_SENDER_TYPE");
        override_string(&mut self.webhook.bot_token, "TAILWATCH_WEBHOOK_BOT_TOKEN");
        override_string(&mut self.webhook.chat_id, "TAILWATCH_WEBHOOK_CHAT_ID");
        override_string(&mut self.webhook.base_url, "TAILWATCH_WEBHOOK_BASE_URL");

        // Filters
        override_csv(&mut self.filters.levels, "TAILWATCH_FILTERS_LEVELS");

        // Format
        override_bool(
            &mut self.format.include_raw,
            "TAILWATCH_FORMAT_INCLUDE_RAW",
        );
        override_bool(
            &mut self.format.include_fingerprint,
            "TAILWATCH_FORMAT_INCLUDE_FINGERPRINT",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "TAILWATCH_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "TAILWATCH_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "TAILWATCH_METRICS_PORT");
    }

    /// 검증 전에 값을 정규 형태로 맞춥니다.
    ///
    /// - `poll_interval_ms <= 0` → [`DEFAULT_POLL_INTERVAL_MS`]
    /// - `sender.type` 소문자화 및 별칭 해석 (`stdout` → `console`, `telegram` → `webhook`)
    /// - `filters.levels` 트리밍, 대문자화, 빈 값 제거, 별칭 해석 (`WARNING` → `WARN`)
    pub fn normalize(&mut self) {
        if self.poll_interval_ms <= 0 {
            self.poll_interval_ms = DEFAULT_POLL_INTERVAL_MS;
        }

        let kind = self.sender.kind.trim().to_lowercase();
        self.sender.kind = match kind.as_str() {
            "stdout" => SenderKind::Console.as_str().to_owned(),
            "telegram" => SenderKind::Webhook.as_str().to_owned(),
            _ => kind,
        };

        self.filters.levels = self
            .filters
            .levels
            .iter()
            .map(|lvl| match Level::from_str_loose(lvl) {
                Some(level) => level.as_str().to_owned(),
                None => lvl.trim().to_uppercase(),
            })
            .filter(|lvl| !lvl.is_empty())
            .collect();

        if self.webhook.base_url.trim().is_empty() {
            self.webhook.base_url = DEFAULT_WEBHOOK_BASE_URL.to_owned();
        }
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 정규식 컴파일과 싱크 생성은 여기서 하지 않습니다.
    /// 그 단계는 파이프라인 스냅샷 구성 시 별도로 검증됩니다.
    pub fn validate(&self) -> Result<(), TailwatchError> {
        if self.log_file.trim().is_empty() {
            return Err(invalid("log_file", "log file path must not be empty"));
        }

        if self.poll_interval_ms <= 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(invalid(
                "poll_interval_ms",
                &format!("must be 1-{}", MAX_POLL_INTERVAL_MS),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                &format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                &format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.general.dedup_ttl_secs == 0 {
            return Err(invalid("general.dedup_ttl_secs", "must be greater than 0"));
        }
        if self.general.reload_interval_ms == 0 {
            return Err(invalid(
                "general.reload_interval_ms",
                "must be greater than 0",
            ));
        }
        if self.general.send_timeout_secs == 0 {
            return Err(invalid("general.send_timeout_secs", "must be greater than 0"));
        }

        if self.sender_kind()? == SenderKind::Webhook
            && (self.webhook.bot_token.trim().is_empty() || self.webhook.chat_id.trim().is_empty())
        {
            return Err(invalid(
                "webhook",
                "bot_token and chat_id are required when sender.type is webhook",
            ));
        }

        if let Some(unknown) = self
            .filters
            .levels
            .iter()
            .find(|lvl| Level::from_str_loose(lvl).is_none())
        {
            return Err(invalid(
                "filters.levels",
                &format!("unknown level '{unknown}', expected DEBUG, INFO, WARN or ERROR"),
            ));
        }

        if self.filters.alert_regex.is_empty() {
            return Err(invalid(
                "filters.alert_regex",
                "at least one alert pattern is required",
            ));
        }
        if let Some(idx) = self
            .filters
            .alert_regex
            .iter()
            .position(|p| p.trim().is_empty())
        {
            return Err(invalid(
                "filters.alert_regex",
                &format!("pattern[{idx}] must not be empty"),
            ));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid("metrics.port", "must be greater than 0"));
        }

        Ok(())
    }

    /// 선택된 싱크 종류를 반환합니다.
    ///
    /// [`normalize`](Self::normalize) 이후에 호출해야 별칭이 해석된 값을 얻습니다.
    pub fn sender_kind(&self) -> Result<SenderKind, TailwatchError> {
        SenderKind::from_name(&self.sender.kind).ok_or_else(|| {
            invalid(
                "sender.type",
                &format!(
                    "unsupported sender '{}', expected 'console' or 'webhook'",
                    self.sender.kind
                ),
            )
        })
    }

    /// 정규화된 폴링 주기를 반환합니다.
    pub fn poll_interval(&self) -> Duration {
        let ms = if self.poll_interval_ms <= 0 {
            DEFAULT_POLL_INTERVAL_MS
        } else {
            self.poll_interval_ms
        };
        Duration::from_millis(ms.unsigned_abs())
    }
}

fn invalid(field: &str, reason: &str) -> TailwatchError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
    .into()
}

/// 일반 설정
///
/// 로깅, PID 파일, 중복 제거 TTL, 리로드 주기, 전송 타임아웃은
/// 프로세스 시작 시에만 읽습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로 (빈 문자열이면 사용 안 함)
    pub pid_file: String,
    /// 동일 라인 재알림 억제 기간 (초)
    pub dedup_ttl_secs: u64,
    /// 설정 파일 변경 확인 주기 (밀리초)
    pub reload_interval_ms: u64,
    /// 알림 1건당 전송 타임아웃 (초)
    pub send_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            pid_file: String::new(),
            dedup_ttl_secs: 300,
            reload_interval_ms: 1000,
            send_timeout_secs: 10,
        }
    }
}

impl GeneralConfig {
    /// 중복 제거 TTL
    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_secs(self.dedup_ttl_secs)
    }

    /// 리로드 확인 주기
    pub fn reload_interval(&self) -> Duration {
        Duration::from_millis(self.reload_interval_ms)
    }

    /// 전송 타임아웃
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

/// 싱크 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderKind {
    /// 표준 출력
    Console,
    /// HTTP 웹훅 (Telegram Bot API 호환)
    Webhook,
}

impl SenderKind {
    /// 설정 파일에 쓰이는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Webhook => "webhook",
        }
    }

    /// 정규화된 이름에서 종류를 찾습니다.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "console" => Some(Self::Console),
            "webhook" => Some(Self::Webhook),
            _ => None,
        }
    }
}

/// 싱크 선택 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// 싱크 종류 (console | webhook)
    #[serde(rename = "type")]
    pub kind: String,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            kind: SenderKind::Console.as_str().to_owned(),
        }
    }
}

/// 웹훅 싱크 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// 봇 토큰
    pub bot_token: String,
    /// 대상 채팅 ID
    pub chat_id: String,
    /// API 기본 주소
    pub base_url: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            base_url: DEFAULT_WEBHOOK_BASE_URL.to_owned(),
        }
    }
}

/// 필터 설정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    /// 허용 레벨 (비어 있으면 모든 레벨)
    pub levels: Vec<String>,
    /// 알림 대상 메시지 정규식 (하나 이상 필수)
    pub alert_regex: Vec<String>,
}

/// 출력 형식 토글
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// 원본 라인 포함 여부
    pub include_raw: bool,
    /// 지문 포함 여부
    pub include_fingerprint: bool,
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9464,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_i64(target: &mut i64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<i64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse i64 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split(',').map(|s| s.trim().to_owned()).collect();
    }
}
