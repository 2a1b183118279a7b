//! 폴 루프 -- 폴링/리로드/종료를 하나의 루프로 다중화
//!
//! ```text
//!              +-- cancel.cancelled() --> 종료
//! select! ─────+-- poll.tick()        --> poll_once: read -> parse -> match -> dedup -> format -> send
//!              +-- reload.tick()      --> ReloadCoordinator::try_reload (주기 변경 시 타이머 교체)
//! ```
//!
//! 한 번에 하나의 이벤트만 끝까지 처리하므로 리더와 중복 제거 윈도우는
//! 동시 접근을 받지 않습니다. 전송은 틱 안에서 파일 순서대로 하나씩 수행합니다.

use std::time::{Duration, Instant};

use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use tailwatch_core::config::GeneralConfig;
use tailwatch_core::error::SinkError;
use tailwatch_core::metrics as m;
use tailwatch_core::pipeline::{DynSink, LogParser};

use crate::dedup::DedupWindow;
use crate::format::format_entry;
use crate::parser::LineParser;
use crate::reader::TailReader;
use crate::reload::{ReloadCoordinator, ReloadOutcome};
use crate::snapshot::PipelineSnapshot;

/// 시작 시에만 적용되는 루프 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherSettings {
    /// 중복 제거 TTL
    pub dedup_ttl: Duration,
    /// 설정 변경 확인 주기
    pub reload_interval: Duration,
    /// 전송 1건당 타임아웃
    pub send_timeout: Duration,
}

impl WatcherSettings {
    pub fn from_general(general: &GeneralConfig) -> Self {
        Self {
            dedup_ttl: general.dedup_ttl(),
            reload_interval: general.reload_interval(),
            send_timeout: general.send_timeout(),
        }
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self::from_general(&GeneralConfig::default())
    }
}

/// 한 틱의 처리 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 리더가 내보낸 완성 라인 수
    pub lines_read: usize,
    /// 문법 불일치로 건너뛴 라인 수
    pub parse_skipped: usize,
    /// 매처에서 걸러진 엔트리 수
    pub filtered: usize,
    /// 중복으로 억제된 엔트리 수
    pub deduplicated: usize,
    /// 싱크 전송에 성공한 수
    pub dispatched: usize,
    /// 전송 실패 또는 타임아웃 수
    pub send_failures: usize,
    /// 파일 읽기에 실패해 틱을 건너뜀
    pub read_failed: bool,
    /// 종료 신호로 전송이 중단됨
    pub cancelled: bool,
}

impl TickReport {
    fn is_idle(&self) -> bool {
        self.lines_read == 0 && !self.read_failed
    }
}

enum SendResult {
    Sent,
    Failed(SinkError),
    TimedOut,
    Cancelled,
}

/// 단일 파일 감시 루프
pub struct LogWatcher {
    coordinator: ReloadCoordinator,
    reader: TailReader,
    dedup: DedupWindow,
    parser: LineParser,
    settings: WatcherSettings,
}

impl LogWatcher {
    /// 현재 스냅샷의 파일을 처음부터 읽는 감시 루프를 만듭니다.
    pub fn new(coordinator: ReloadCoordinator, settings: WatcherSettings) -> Self {
        let reader = TailReader::new(coordinator.cell().load().log_file());
        Self {
            coordinator,
            reader,
            dedup: DedupWindow::new(settings.dedup_ttl),
            parser: LineParser::new(),
            settings,
        }
    }

    /// 종료 신호가 올 때까지 폴링과 리로드 확인을 반복합니다.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut poll = ticker(self.coordinator.cell().load().poll_interval());
        let mut reload = ticker(self.settings.reload_interval);

        tracing::info!(
            log_file = %self.reader.path().display(),
            "log watcher started"
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!("shutdown requested, stopping log watcher");
                    break;
                }
                _ = reload.tick() => {
                    match self.coordinator.try_reload().await {
                        Ok(ReloadOutcome::Applied(applied)) if applied.poll_interval_changed => {
                            let period = self.coordinator.cell().load().poll_interval();
                            tracing::info!(poll_interval_ms = period.as_millis() as u64, "poll timer replaced");
                            poll = ticker(period);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to check config for changes");
                        }
                    }
                }
                _ = poll.tick() => {
                    let report = self.poll_once(&cancel).await;
                    if !report.is_idle() {
                        tracing::debug!(?report, "poll tick finished");
                    }
                }
            }
        }
    }

    /// 한 번의 폴링 틱을 수행합니다.
    ///
    /// 틱 동안 스냅샷 하나를 고정해 사용합니다. 읽기 실패는 틱을 건너뛰고,
    /// 라인 단위 실패(파싱/전송)는 다음 라인으로 넘어갑니다.
    pub async fn poll_once(&mut self, cancel: &CancellationToken) -> TickReport {
        let snapshot = self.coordinator.cell().load();
        self.follow_log_file(&snapshot);

        let mut report = TickReport::default();

        let lines = match self.reader.read_new_lines().await {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read log file, skipping tick");
                metrics::counter!(m::READ_ERRORS_TOTAL).increment(1);
                report.read_failed = true;
                return report;
            }
        };
        report.lines_read = lines.len();
        metrics::counter!(m::LINES_READ_TOTAL).increment(lines.len() as u64);

        let sink = snapshot.sink();
        for line in lines {
            let entry = match self.parser.parse(&line) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unparseable line");
                    metrics::counter!(m::PARSE_SKIPPED_TOTAL).increment(1);
                    report.parse_skipped += 1;
                    continue;
                }
            };

            if !snapshot.matcher().matches(&entry) {
                report.filtered += 1;
                continue;
            }
            metrics::counter!(m::ENTRIES_MATCHED_TOTAL).increment(1);

            if !self.dedup.allow(&entry.raw) {
                metrics::counter!(m::DEDUP_SUPPRESSED_TOTAL).increment(1);
                report.deduplicated += 1;
                continue;
            }

            let text = format_entry(&entry, sink.markup(), snapshot.format());
            match self.dispatch(sink.as_ref(), &text, cancel).await {
                SendResult::Sent => report.dispatched += 1,
                SendResult::Failed(e) => {
                    tracing::warn!(sink = sink.name(), error = %e, "failed to send notification");
                    metrics::counter!(m::SEND_FAILURES_TOTAL, m::LABEL_SINK => sink.name().to_owned())
                        .increment(1);
                    report.send_failures += 1;
                }
                SendResult::TimedOut => {
                    tracing::warn!(
                        sink = sink.name(),
                        timeout_ms = self.settings.send_timeout.as_millis() as u64,
                        "notification send timed out"
                    );
                    metrics::counter!(m::SEND_FAILURES_TOTAL, m::LABEL_SINK => sink.name().to_owned())
                        .increment(1);
                    report.send_failures += 1;
                }
                SendResult::Cancelled => {
                    tracing::debug!("send aborted by shutdown");
                    report.cancelled = true;
                    break;
                }
            }
        }

        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!(m::DEDUP_LIVE_RECORDS).set(self.dedup.len() as f64);
        report
    }

    async fn dispatch(&self, sink: &dyn DynSink, text: &str, cancel: &CancellationToken) -> SendResult {
        let started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return SendResult::Cancelled,
            result = tokio::time::timeout(self.settings.send_timeout, sink.send(text)) => result,
        };

        match result {
            Ok(Ok(())) => {
                metrics::counter!(m::NOTIFICATIONS_SENT_TOTAL, m::LABEL_SINK => sink.name().to_owned())
                    .increment(1);
                metrics::histogram!(m::SEND_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
                SendResult::Sent
            }
            Ok(Err(e)) => SendResult::Failed(e),
            Err(_) => SendResult::TimedOut,
        }
    }

    /// 스냅샷의 감시 경로가 바뀌었으면 리더를 새로 만듭니다.
    fn follow_log_file(&mut self, snapshot: &PipelineSnapshot) {
        if self.reader.path() != snapshot.log_file() {
            tracing::info!(
                from = %self.reader.path().display(),
                to = %snapshot.log_file().display(),
                "watched file changed, starting new reader"
            );
            self.reader = TailReader::new(snapshot.log_file());
        }
    }

    pub fn coordinator(&self) -> &ReloadCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut ReloadCoordinator {
        &mut self.coordinator
    }

    pub fn reader(&self) -> &TailReader {
        &self.reader
    }

    pub fn dedup(&self) -> &DedupWindow {
        &self.dedup
    }

    pub fn settings(&self) -> WatcherSettings {
        self.settings
    }
}

fn ticker(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
