#![no_main]

use libfuzzer_sys::fuzz_target;
use tailwatch_core::pipeline::LogParser;
use tailwatch_pipeline::LineParser;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    let parser = LineParser::new();

    // 크래시나 패닉 없이 Ok 또는 Err을 반환해야 한다
    if let Ok(entry) = parser.parse(line) {
        assert_eq!(entry.raw, line.trim());
        assert!(!entry.message.trim().is_empty());
    }
});
