//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for TailwatchError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use tailwatch_core::error::{SinkError, TailwatchError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 감시 대상 파일 열기/조회/읽기 실패
    #[error("reader error: {path}: {source}")]
    Reader {
        /// 감시 대상 파일 경로
        path: String,
        /// 원인 I/O 에러
        #[source]
        source: std::io::Error,
    },

    /// 설정 파일 메타데이터 조회 실패
    #[error("config source error: {path}: {source}")]
    ConfigSource {
        /// 설정 파일 경로
        path: String,
        /// 원인 I/O 에러
        #[source]
        source: std::io::Error,
    },

    /// 알림 정규식 컴파일 실패
    #[error("pattern compile error: pattern[{index}] '{pattern}': {reason}")]
    PatternCompile {
        /// 패턴 목록 내 위치
        index: usize,
        /// 문제가 된 패턴
        pattern: String,
        /// 컴파일 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 싱크 생성 실패
    #[error("sink construction failed: {sink}: {reason}")]
    SinkBuild {
        /// 싱크 종류
        sink: String,
        /// 실패 사유
        reason: String,
    },

    /// 싱크 전송 실패
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

impl From<LogPipelineError> for TailwatchError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Sink(e) => TailwatchError::Sink(e),
            other => TailwatchError::Pipeline(other.to_string()),
        }
    }
}
