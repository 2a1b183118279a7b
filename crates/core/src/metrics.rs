//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 파이프라인 크레이트는 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::gauge!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `tailwatch_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(tailwatch_core::metrics::LINES_READ_TOTAL).increment(3);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (applied, rejected, unchanged)
pub const LABEL_RESULT: &str = "result";

/// 싱크 레이블 키 (console, webhook)
pub const LABEL_SINK: &str = "sink";

// ─── 리더 ──────────────────────────────────────────────────────────

/// 리더: 완성된 라인 수 (counter)
pub const LINES_READ_TOTAL: &str = "tailwatch_lines_read_total";

/// 리더: 파일 축소로 커서를 0으로 되돌린 횟수 (counter)
pub const READER_RESETS_TOTAL: &str = "tailwatch_reader_resets_total";

/// 리더: 읽기 실패로 건너뛴 틱 수 (counter)
pub const READ_ERRORS_TOTAL: &str = "tailwatch_read_errors_total";

// ─── 처리 단계 ─────────────────────────────────────────────────────

/// 파싱 실패로 건너뛴 라인 수 (counter)
pub const PARSE_SKIPPED_TOTAL: &str = "tailwatch_parse_skipped_total";

/// 매처를 통과한 엔트리 수 (counter)
pub const ENTRIES_MATCHED_TOTAL: &str = "tailwatch_entries_matched_total";

/// 중복 제거 윈도우에서 억제된 엔트리 수 (counter)
pub const DEDUP_SUPPRESSED_TOTAL: &str = "tailwatch_dedup_suppressed_total";

/// 중복 제거 윈도우에 살아 있는 지문 수 (gauge)
pub const DEDUP_LIVE_RECORDS: &str = "tailwatch_dedup_live_records";

// ─── 전송 ──────────────────────────────────────────────────────────

/// 전송 성공 알림 수 (counter, label: sink)
pub const NOTIFICATIONS_SENT_TOTAL: &str = "tailwatch_notifications_sent_total";

/// 전송 실패/타임아웃 수 (counter, label: sink)
pub const SEND_FAILURES_TOTAL: &str = "tailwatch_send_failures_total";

/// 전송 지연 시간 (histogram, 초)
pub const SEND_DURATION_SECONDS: &str = "tailwatch_send_duration_seconds";

// ─── 리로드 ────────────────────────────────────────────────────────

/// 리로드 시도 결과 수 (counter, label: result)
pub const RELOADS_TOTAL: &str = "tailwatch_reloads_total";

// ─── 데몬 ──────────────────────────────────────────────────────────

/// 빌드 정보 (gauge, label: version, 항상 1)
pub const DAEMON_BUILD_INFO: &str = "tailwatch_daemon_build_info";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        LINES_READ_TOTAL,
        "Total number of completed lines read from the watched file"
    );
    describe_counter!(
        READER_RESETS_TOTAL,
        "Number of times the read cursor was reset after truncation or rotation"
    );
    describe_counter!(
        READ_ERRORS_TOTAL,
        "Number of poll ticks skipped because the watched file could not be read"
    );
    describe_counter!(
        PARSE_SKIPPED_TOTAL,
        "Lines skipped because they did not match the log grammar"
    );
    describe_counter!(
        ENTRIES_MATCHED_TOTAL,
        "Entries accepted by the level and pattern filter"
    );
    describe_counter!(
        DEDUP_SUPPRESSED_TOTAL,
        "Entries suppressed by the deduplication window"
    );
    describe_gauge!(
        DEDUP_LIVE_RECORDS,
        "Fingerprints currently held by the deduplication window"
    );
    describe_counter!(
        NOTIFICATIONS_SENT_TOTAL,
        "Notifications delivered to the sink"
    );
    describe_counter!(
        SEND_FAILURES_TOTAL,
        "Notifications that failed or timed out"
    );
    describe_histogram!(SEND_DURATION_SECONDS, "Sink send latency in seconds");
    describe_counter!(
        RELOADS_TOTAL,
        "Configuration reload attempts by result (applied, rejected, unchanged)"
    );
    describe_gauge!(DAEMON_BUILD_INFO, "Build information, always 1");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_all_does_not_panic() {
        // 레코더가 없어도 패닉하지 않아야 함
        describe_all();
    }

    #[test]
    fn metric_names_use_prefix() {
        let names = [
            LINES_READ_TOTAL,
            READER_RESETS_TOTAL,
            READ_ERRORS_TOTAL,
            PARSE_SKIPPED_TOTAL,
            ENTRIES_MATCHED_TOTAL,
            DEDUP_SUPPRESSED_TOTAL,
            DEDUP_LIVE_RECORDS,
            NOTIFICATIONS_SENT_TOTAL,
            SEND_FAILURES_TOTAL,
            SEND_DURATION_SECONDS,
            RELOADS_TOTAL,
            DAEMON_BUILD_INFO,
        ];
        for name in names {
            assert!(name.starts_with("tailwatch_"), "{name} lacks prefix");
        }
    }

    #[test]
    fn counters_end_with_total() {
        for name in [
            LINES_READ_TOTAL,
            PARSE_SKIPPED_TOTAL,
            DEDUP_SUPPRESSED_TOTAL,
            RELOADS_TOTAL,
        ] {
            assert!(name.ends_with("_total"));
        }
    }
}
