//! 싱크별 메시지 포맷팅
//!
//! 싱크가 알리는 [`Markup`]에 따라 엔트리를 사람이 읽을 텍스트로 바꿉니다.
//! 시각은 로그에 기록된 오프셋 그대로 `%Y-%m-%d %H:%M:%S`로 출력합니다.

use std::fmt::Write as _;

use tailwatch_core::config::FormatConfig;
use tailwatch_core::pipeline::Markup;
use tailwatch_core::types::{Level, LogEntry};

use crate::fingerprint::fingerprint;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 엔트리를 주어진 마크업으로 포맷팅합니다.
pub fn format_entry(entry: &LogEntry, markup: Markup, options: FormatConfig) -> String {
    match markup {
        Markup::Plain => format_plain(entry, options),
        Markup::Html => format_html(entry, options),
    }
}

/// 장식 없는 텍스트 (콘솔용)
pub fn format_plain(entry: &LogEntry, options: FormatConfig) -> String {
    let mut text = String::with_capacity(entry.raw.len() * 2 + 64);
    // String에 대한 write!는 실패하지 않음
    let _ = writeln!(text, "Level: {}", entry.level);
    let _ = writeln!(text, "Time: {}", entry.timestamp.format(TIME_FORMAT));
    let _ = writeln!(text, "Message: {}", entry.message);
    if options.include_fingerprint {
        let _ = writeln!(text, "Fingerprint: {}", fingerprint(&entry.raw));
    }
    if options.include_raw {
        let _ = writeln!(text, "Raw: {}", entry.raw);
    }
    text
}

/// HTML 마크업 (웹훅 메신저용)
pub fn format_html(entry: &LogEntry, options: FormatConfig) -> String {
    let mut text = String::with_capacity(entry.raw.len() * 3 + 128);
    let _ = write!(
        text,
        "{} <b>Level:</b> {}\n\n<b>Time:</b> {}\n\n<b>Message:</b> {}\n\n",
        level_badge(entry.level),
        entry.level,
        entry.timestamp.format(TIME_FORMAT),
        escape_html(&entry.message),
    );
    if options.include_fingerprint {
        let _ = write!(
            text,
            "<b>Fingerprint:</b> <code>{}</code>\n\n",
            fingerprint(&entry.raw)
        );
    }
    if options.include_raw {
        let _ = write!(
            text,
            "<b>Raw:</b>\n<code>{}</code>\n\n",
            escape_html(&entry.raw)
        );
    }
    text
}

/// 레벨 배지 이모지
pub fn level_badge(level: Level) -> &'static str {
    match level {
        Level::Debug => "🟡",
        Level::Info => "🟢",
        Level::Warn => "🟠",
        Level::Error => "🔴",
    }
}

/// HTML 특수문자 이스케이프 (`& < > " '`)
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn sample(message: &str) -> LogEntry {
        let raw = format!("2026-01-01T10:20:30+03:00 [ERROR] {message}");
        LogEntry {
            timestamp: DateTime::parse_from_rfc3339("2026-01-01T10:20:30+03:00").unwrap(),
            level: Level::Error,
            message: message.to_owned(),
            raw,
        }
    }

    const BARE: FormatConfig = FormatConfig {
        include_raw: false,
        include_fingerprint: false,
    };
    const FULL: FormatConfig = FormatConfig {
        include_raw: true,
        include_fingerprint: true,
    };

    #[test]
    fn plain_contains_level_time_message() {
        let text = format_plain(&sample("Database connection failed"), BARE);
        assert_eq!(
            text,
            "Level: ERROR\nTime: 2026-01-01 10:20:30\nMessage: Database connection failed\n"
        );
    }

    #[test]
    fn plain_optional_lines() {
        let entry = sample("boom");
        let text = format_plain(&entry, FULL);
        assert!(text.contains(&format!("Fingerprint: {}\n", fingerprint(&entry.raw))));
        assert!(text.ends_with(&format!("Raw: {}\n", entry.raw)));
    }

    #[test]
    fn html_escapes_user_content() {
        let text = format_html(&sample("<script>alert(\"x\")</script> & more"), FULL);
        assert!(text.starts_with("🔴 <b>Level:</b> ERROR"));
        assert!(text.contains("&lt;script&gt;alert(&#34;x&#34;)&lt;/script&gt; &amp; more"));
        assert!(!text.contains("<script>"));
        assert!(text.contains("<code>"));
    }

    #[test]
    fn html_without_options_has_no_code_blocks() {
        let text = format_html(&sample("boom"), BARE);
        assert!(!text.contains("<code>"));
        assert!(text.contains("<b>Time:</b> 2026-01-01 10:20:30"));
    }

    #[test]
    fn badges_are_distinct() {
        let badges: std::collections::HashSet<_> = Level::ALL.iter().map(|l| level_badge(*l)).collect();
        assert_eq!(badges.len(), Level::ALL.len());
    }

    #[test]
    fn dispatches_on_markup() {
        let entry = sample("boom");
        assert_eq!(format_entry(&entry, Markup::Plain, BARE), format_plain(&entry, BARE));
        assert_eq!(format_entry(&entry, Markup::Html, BARE), format_html(&entry, BARE));
    }
}
