//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 파서가 생성하고 매처, 중복 제거 윈도우, 포매터가 소비하는 데이터 구조를 정의합니다.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// 로그 심각도 레벨
///
/// 감시 대상 로그 문법이 허용하는 고정된 레벨 집합입니다.
/// `Ord` 구현으로 비교가 가능합니다 (`Debug < Info < Warn < Error`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// 디버그 출력
    Debug,
    /// 일반 정보
    #[default]
    Info,
    /// 경고
    Warn,
    /// 오류
    Error,
}

impl Level {
    /// 모든 레벨 (낮은 심각도부터)
    pub const ALL: [Level; 4] = [Level::Debug, Level::Info, Level::Warn, Level::Error];

    /// 로그 라인에 표기되는 대문자 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// 문자열에서 레벨을 파싱합니다.
    ///
    /// 대소문자와 앞뒤 공백을 무시합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARN" | "WARNING" => Some(Self::Warn),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 로그 엔트리
///
/// 한 줄의 원본 로그를 파싱한 불변 레코드입니다.
/// `raw`는 앞뒤 공백을 제거한 원본 라인으로, 지문 계산과 포맷팅에 그대로 쓰입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 로그에 기록된 시각 (원래 오프셋 유지)
    pub timestamp: DateTime<FixedOffset>,
    /// 심각도
    pub level: Level,
    /// 메시지 본문
    pub message: String,
    /// 원본 라인
    pub raw: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.to_rfc3339(),
            self.level,
            self.message
        )
    }
}
