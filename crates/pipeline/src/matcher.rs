//! 엔트리 매처 -- 레벨 집합 + 정규식 목록 필터
//!
//! [`EntryMatcher`]는 생성 시 모든 패턴을 한 번만 컴파일합니다.
//!
//! - 레벨 집합이 비어 있으면 모든 레벨을 허용합니다.
//! - 패턴 목록이 비어 있으면 아무것도 매칭하지 않습니다.
//! - 패턴 간에는 OR 결합이며 첫 번째 매칭에서 멈춥니다.

use std::collections::HashSet;

use regex::Regex;

use tailwatch_core::config::FiltersConfig;
use tailwatch_core::types::LogEntry;

use crate::error::LogPipelineError;

/// 레벨 + 정규식 매처
#[derive(Debug, Clone)]
pub struct EntryMatcher {
    /// 대문자로 정규화된 허용 레벨 (비어 있으면 전체 허용)
    levels: HashSet<String>,
    /// 컴파일된 알림 패턴
    patterns: Vec<Regex>,
}

impl EntryMatcher {
    /// 레벨 목록과 패턴 목록으로 매처를 만듭니다.
    ///
    /// 레벨은 앞뒤 공백 제거 후 대문자로 비교하며, 빈 문자열은 무시합니다.
    ///
    /// # Errors
    ///
    /// 패턴 중 하나라도 컴파일에 실패하면 [`LogPipelineError::PatternCompile`]을 반환합니다.
    pub fn new<L, P>(levels: L, patterns: P) -> Result<Self, LogPipelineError>
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let levels = levels
            .into_iter()
            .map(|l| l.as_ref().trim().to_uppercase())
            .filter(|l| !l.is_empty())
            .collect();

        let patterns = patterns
            .into_iter()
            .enumerate()
            .map(|(index, p)| {
                let p = p.as_ref();
                Regex::new(p).map_err(|e| LogPipelineError::PatternCompile {
                    index,
                    pattern: p.to_owned(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { levels, patterns })
    }

    /// `[filters]` 설정에서 매처를 만듭니다.
    pub fn from_config(filters: &FiltersConfig) -> Result<Self, LogPipelineError> {
        Self::new(&filters.levels, &filters.alert_regex)
    }

    /// 엔트리가 알림 대상인지 평가합니다.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if !self.levels.is_empty() && !self.levels.contains(entry.level.as_str()) {
            return false;
        }
        self.patterns.iter().any(|re| re.is_match(&entry.message))
    }

    /// 레벨 필터가 비활성(전체 허용)인지
    pub fn allows_all_levels(&self) -> bool {
        self.levels.is_empty()
    }

    /// 컴파일된 패턴 수
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tailwatch_core::types::Level;

    fn entry(level: Level, message: &str) -> LogEntry {
        LogEntry {
            timestamp: DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap(),
            level,
            message: message.to_owned(),
            raw: format!("2026-01-01T00:00:00Z [{}] {message}", level.as_str()),
        }
    }

    const NO_LEVELS: [&str; 0] = [];

    #[test]
    fn empty_level_set_admits_any_level() {
        let m = EntryMatcher::new(NO_LEVELS, ["failed"]).unwrap();
        assert!(m.allows_all_levels());
        for level in Level::ALL {
            assert!(m.matches(&entry(level, "job failed")));
        }
    }

    #[test]
    fn level_outside_set_is_rejected() {
        let m = EntryMatcher::new(["ERROR"], ["failed"]).unwrap();
        assert!(m.matches(&entry(Level::Error, "job failed")));
        assert!(!m.matches(&entry(Level::Info, "job failed")));
    }

    #[test]
    fn levels_are_trimmed_and_case_insensitive() {
        let m = EntryMatcher::new(["  error ", "Warn", ""], [".*"]).unwrap();
        assert!(m.matches(&entry(Level::Error, "x")));
        assert!(m.matches(&entry(Level::Warn, "x")));
        assert!(!m.matches(&entry(Level::Debug, "x")));
    }

    #[test]
    fn empty_pattern_list_matches_nothing() {
        let m = EntryMatcher::new(NO_LEVELS, NO_LEVELS).unwrap();
        assert_eq!(m.pattern_count(), 0);
        assert!(!m.matches(&entry(Level::Error, "anything")));
    }

    #[test]
    fn any_pattern_admits_entry() {
        let m = EntryMatcher::new(NO_LEVELS, ["^never$", "Database.*failed", "Invalid input"]).unwrap();
        assert!(m.matches(&entry(Level::Error, "Database connection failed")));
        assert!(m.matches(&entry(Level::Error, "Invalid input from client")));
        assert!(!m.matches(&entry(Level::Error, "all good")));
    }

    #[test]
    fn pattern_is_applied_to_message_only() {
        let m = EntryMatcher::new(NO_LEVELS, ["ERROR"]).unwrap();
        assert!(!m.matches(&entry(Level::Error, "disk full")));
    }

    #[test]
    fn invalid_pattern_fails_construction() {
        let err = EntryMatcher::new(NO_LEVELS, ["ok", "(unclosed"]).unwrap_err();
        match err {
            LogPipelineError::PatternCompile { index, pattern, .. } => {
                assert_eq!(index, 1);
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn builds_from_filters_config() {
        let filters = FiltersConfig {
            levels: vec!["ERROR".to_owned()],
            alert_regex: vec!["timeout".to_owned()],
        };
        let m = EntryMatcher::from_config(&filters).unwrap();
        assert!(m.matches(&entry(Level::Error, "upstream timeout")));
        assert!(!m.matches(&entry(Level::Warn, "upstream timeout")));
    }
}
