//! 에러 타입 -- 도메인별 에러 정의

/// Tailwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TailwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 알림 전송 에러
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// 파이프라인 구성/실행 에러
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 로그 라인 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// 공백뿐인 라인
    #[error("empty line")]
    Empty,

    /// 정해진 문법과 일치하지 않음
    #[error("line does not match log grammar")]
    InvalidFormat,

    /// 타임스탬프가 RFC 3339 형식이 아님
    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },
}

/// 알림 싱크 전송 에러
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 요청 본문 인코딩 실패
    #[error("failed to encode request: {0}")]
    Encode(String),

    /// 네트워크/전송 계층 실패
    #[error("transport failed: {0}")]
    Transport(String),

    /// 응답 본문 디코딩 실패
    #[error("failed to decode response (status {status}): {reason}")]
    Decode { status: u16, reason: String },

    /// 원격 API가 실패를 보고함 (non-2xx 또는 `ok=false`)
    #[error("remote api rejected message: status={status} ok={ok} description={description}")]
    Api {
        status: u16,
        ok: bool,
        description: String,
    },

    /// 출력 대상 쓰기 실패
    #[error("write failed: {0}")]
    Write(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_top_level() {
        let err: TailwatchError = ConfigError::InvalidValue {
            field: "log_file".to_owned(),
            reason: "must not be empty".to_owned(),
        }
        .into();
        assert!(matches!(err, TailwatchError::Config(_)));
        assert!(err.to_string().contains("log_file"));
    }

    #[test]
    fn api_error_display_includes_status_and_description() {
        let err = SinkError::Api {
            status: 400,
            ok: false,
            description: "chat not found".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("chat not found"));
    }

    #[test]
    fn timestamp_error_display() {
        let err = ParseError::InvalidTimestamp {
            value: "yesterday".to_owned(),
            reason: "input contains invalid characters".to_owned(),
        };
        assert!(err.to_string().contains("yesterday"));
    }
}
