#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tailwatch_pipeline::DedupWindow;

#[derive(Arbitrary, Debug)]
struct Step {
    key: u8,
    advance_ms: u16,
}

fuzz_target!(|input: (u16, Vec<Step>)| {
    let (ttl_ms, steps) = input;
    let ttl = Duration::from_millis(u64::from(ttl_ms));
    let mut window = DedupWindow::new(ttl);
    let start = Instant::now();
    let mut elapsed = Duration::ZERO;
    let mut last_admitted: [Option<Duration>; 256] = [None; 256];

    for step in steps {
        elapsed += Duration::from_millis(u64::from(step.advance_ms));
        let key = format!("line-{}", step.key);
        let allowed = window.allow_at(&key, start + elapsed);

        // 마지막으로 허용된 뒤 TTL을 초과했을 때만 다시 허용된다
        let expected = match last_admitted[usize::from(step.key)] {
            Some(at) => elapsed - at > ttl,
            None => true,
        };
        assert_eq!(allowed, expected);
        if allowed {
            last_admitted[usize::from(step.key)] = Some(elapsed);
        }
        assert!(window.len() <= 256);
    }
});
