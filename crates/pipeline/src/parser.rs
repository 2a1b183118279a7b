//! 고정 문법 라인 파서
//!
//! 지원 문법:
//!
//! ```text
//! <RFC3339 타임스탬프> <공백>+ [<LEVEL>] <공백>+ <메시지>
//! 2026-01-01T00:00:00Z [ERROR] Database connection failed
//! ```
//!
//! `LEVEL`은 대문자 `DEBUG`, `INFO`, `WARN`, `ERROR` 중 하나입니다.
//! 정규식 대신 바이트 단위로 직접 분해합니다.

use chrono::DateTime;

use tailwatch_core::error::ParseError;
use tailwatch_core::pipeline::LogParser;
use tailwatch_core::types::{Level, LogEntry};

/// 라인 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct LineParser;

impl LineParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

impl LogParser for LineParser {
    fn format_name(&self) -> &str {
        "tailwatch-line"
    }

    fn parse(&self, raw: &str) -> Result<LogEntry, ParseError> {
        let line = raw.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let (timestamp, rest) = split_token(line).ok_or(ParseError::InvalidFormat)?;

        let rest = rest.strip_prefix('[').ok_or(ParseError::InvalidFormat)?;
        let (level, rest) = rest.split_once(']').ok_or(ParseError::InvalidFormat)?;
        let level = strict_level(level).ok_or(ParseError::InvalidFormat)?;

        // `]` 뒤에는 최소 한 칸의 공백이 필요
        if !rest.starts_with(char::is_whitespace) {
            return Err(ParseError::InvalidFormat);
        }
        let message = rest.trim_start();
        if message.is_empty() {
            return Err(ParseError::InvalidFormat);
        }

        let timestamp =
            DateTime::parse_from_rfc3339(timestamp).map_err(|e| ParseError::InvalidTimestamp {
                value: timestamp.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(LogEntry {
            timestamp,
            level,
            message: message.to_owned(),
            raw: line.to_owned(),
        })
    }
}

/// 첫 공백 이전 토큰과, 공백을 건너뛴 나머지를 반환합니다.
fn split_token(s: &str) -> Option<(&str, &str)> {
    let idx = s.find(char::is_whitespace)?;
    let (head, tail) = s.split_at(idx);
    Some((head, tail.trim_start()))
}

fn strict_level(s: &str) -> Option<Level> {
    match s {
        "DEBUG" => Some(Level::Debug),
        "INFO" => Some(Level::Info),
        "WARN" => Some(Level::Warn),
        "ERROR" => Some(Level::Error),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<LogEntry, ParseError> {
        LineParser::new().parse(s)
    }

    #[test]
    fn parses_well_formed_line() {
        let raw = "2026-01-01T00:00:00Z [ERROR] Database connection failed";
        let entry = parse(raw).unwrap();
        assert_eq!(entry.level, Level::Error);
        assert_eq!(entry.message, "Database connection failed");
        assert_eq!(entry.raw, raw);
        assert_eq!(entry.timestamp.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn raw_is_trimmed_line() {
        let line = "2026-01-01T00:00:00Z [ERROR] Database connection failed";
        let padded = format!("  {line}  \r");
        let entry = parse(&padded).unwrap();
        assert_eq!(entry.raw, line);
        assert_eq!(entry.raw, parse(line).unwrap().raw);
    }

    #[test]
    fn keeps_offset_and_fraction() {
        let entry = parse("2026-03-04T05:06:07.250+09:00 [INFO] started").unwrap();
        assert_eq!(entry.timestamp.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(entry.timestamp.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn accepts_all_levels() {
        for level in Level::ALL {
            let line = format!("2026-01-01T00:00:00Z [{}] msg", level.as_str());
            assert_eq!(parse(&line).unwrap().level, level);
        }
    }

    #[test]
    fn tolerates_extra_whitespace() {
        let entry = parse("  2026-01-01T00:00:00Z \t [WARN]   disk  almost full  ").unwrap();
        assert_eq!(entry.level, Level::Warn);
        assert_eq!(entry.message, "disk  almost full");
    }

    #[test]
    fn message_may_contain_brackets() {
        let entry = parse("2026-01-01T00:00:00Z [INFO] [worker-3] job [42] done").unwrap();
        assert_eq!(entry.message, "[worker-3] job [42] done");
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("   \t"), Err(ParseError::Empty));
    }

    #[test]
    fn rejects_unknown_or_lowercase_level() {
        assert_eq!(
            parse("2026-01-01T00:00:00Z [FATAL] boom"),
            Err(ParseError::InvalidFormat)
        );
        assert_eq!(
            parse("2026-01-01T00:00:00Z [error] boom"),
            Err(ParseError::InvalidFormat)
        );
    }

    #[test]
    fn rejects_structural_errors() {
        for line in [
            "no-level-here",
            "2026-01-01T00:00:00Z ERROR boom",
            "2026-01-01T00:00:00Z [ERROR]",
            "2026-01-01T00:00:00Z [ERROR]boom",
            "2026-01-01T00:00:00Z [ERROR boom",
        ] {
            assert_eq!(parse(line), Err(ParseError::InvalidFormat), "line: {line}");
        }
    }

    #[test]
    fn rejects_bad_timestamp() {
        let err = parse("yesterday [ERROR] boom").unwrap_err();
        assert!(matches!(err, ParseError::InvalidTimestamp { ref value, .. } if value == "yesterday"));
    }

    #[test]
    fn format_name() {
        assert_eq!(LineParser::new().format_name(), "tailwatch-line");
    }
}
