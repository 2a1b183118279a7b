#![no_main]

use arbitrary::Arbitrary;
use chrono::{DateTime, FixedOffset};
use libfuzzer_sys::fuzz_target;

use tailwatch_core::config::FormatConfig;
use tailwatch_core::pipeline::Markup;
use tailwatch_core::types::{Level, LogEntry};
use tailwatch_pipeline::format::format_entry;
use tailwatch_pipeline::{EntryMatcher, FINGERPRINT_LEN, fingerprint};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    levels: Vec<String>,
    /// 정규식 후보 (최대 4개로 제한)
    patterns: Vec<String>,
    level: u8,
    message: String,
    raw: String,
    html: bool,
    include_raw: bool,
    include_fingerprint: bool,
}

fuzz_target!(|input: FuzzInput| {
    if input.patterns.len() > 4 || input.patterns.iter().any(|p| p.len() > 256) {
        return;
    }

    // 잘못된 정규식은 Err이어야 하고 패닉하면 안 된다
    let Ok(matcher) = EntryMatcher::new(&input.levels, &input.patterns) else {
        return;
    };

    let timestamp: DateTime<FixedOffset> = DateTime::from_timestamp(0, 0)
        .map(|t| t.fixed_offset())
        .unwrap_or_default();
    let entry = LogEntry {
        timestamp,
        level: Level::ALL[usize::from(input.level) % Level::ALL.len()],
        message: input.message,
        raw: input.raw,
    };

    let _ = matcher.matches(&entry);
    assert_eq!(fingerprint(&entry.raw).len(), FINGERPRINT_LEN);

    let markup = if input.html { Markup::Html } else { Markup::Plain };
    let format = FormatConfig {
        include_raw: input.include_raw,
        include_fingerprint: input.include_fingerprint,
    };
    let text = format_entry(&entry, markup, format);
    if input.html {
        assert!(!text.contains("<script"));
    }
});
