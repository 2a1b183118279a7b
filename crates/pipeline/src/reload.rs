//! 설정 핫 리로드 조정자
//!
//! [`ReloadCoordinator::try_reload`]는 한 번의 리로드 시도를 수행합니다.
//!
//! 1. 설정 파일 수정 시각 조회. 게시된 스냅샷의 시각보다 새롭지 않으면 `Unchanged`
//! 2. 설정 로드 및 검증. 실패 시 `Rejected(InvalidConfig)`
//! 3. 내용이 현재 설정과 같으면 (touch만 한 경우) `Unchanged`
//! 4. 매처 컴파일. 실패 시 `Rejected(InvalidPattern)`
//! 5. 싱크 생성. 실패 시 `Rejected(SinkConstruction)`
//! 6. 완성된 스냅샷을 원자적으로 게시하고 `Applied`
//!
//! 거부된 후보는 아무것도 게시하지 않으므로 실행 중인 파이프라인은 항상
//! 마지막으로 검증된 설정이거나 완전히 검증된 새 설정입니다.
//! 게시되지 않은 후보는 (수정 시각, 내용 해시)로 기억해 같은 깨진 파일을 매 틱마다
//! 다시 파싱하지 않습니다. 수정 시각이 같아도 내용이 바뀌면 다시 평가합니다.
//! 설정 파일 조회(stat) 실패만 에러로 전파됩니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use tailwatch_core::config::WatchConfig;
use tailwatch_core::error::TailwatchError;
use tailwatch_core::metrics as m;
use tailwatch_core::pipeline::DynSink;

use crate::error::LogPipelineError;
use crate::matcher::EntryMatcher;
use crate::sink::build_sink;
use crate::snapshot::{PipelineSnapshot, SnapshotCell};

/// 설정으로부터 싱크를 만드는 함수
pub type SinkFactory =
    Arc<dyn Fn(&WatchConfig) -> Result<Arc<dyn DynSink>, LogPipelineError> + Send + Sync>;

/// 리로드 시도 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// 새 수정이 없거나 내용이 같음
    Unchanged,
    /// 새 스냅샷이 게시됨
    Applied(AppliedReload),
    /// 후보가 거부되어 기존 스냅샷이 유지됨
    Rejected(ReloadRejection),
}

impl ReloadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// 메트릭 `result` 레이블 값
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Applied(_) => "applied",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// 게시된 리로드의 변경 요약
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppliedReload {
    /// 감시 대상 파일 경로가 바뀜 (리더 교체 필요)
    pub log_file_changed: bool,
    /// 폴링 주기가 바뀜 (타이머 교체 필요)
    pub poll_interval_changed: bool,
    /// `[general]` 섹션이 바뀜 (재시작해야 반영)
    pub general_changed: bool,
}

/// 리로드 거부 사유
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReloadRejection {
    /// 설정 파싱/검증 실패
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// 알림 패턴 컴파일 실패
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    /// 싱크 생성 실패
    #[error("sink construction failed: {0}")]
    SinkConstruction(String),
}

/// 핫 리로드 조정자
///
/// 현재 스냅샷의 유일한 쓰기 주체입니다.
pub struct ReloadCoordinator {
    config_path: PathBuf,
    cell: Arc<SnapshotCell>,
    sink_factory: SinkFactory,
    /// 마지막으로 평가했지만 게시하지 않은 후보의 (수정 시각, 내용 해시)
    skipped: Option<(SystemTime, String)>,
}

impl ReloadCoordinator {
    /// 설정 파일을 처음 로드해 초기 스냅샷을 게시합니다.
    ///
    /// # Errors
    ///
    /// 초기 설정을 읽을 수 없거나 유효하지 않거나, 매처/싱크 생성에 실패하면
    /// 에러를 반환합니다. 시작 시점의 실패는 치명적입니다.
    pub async fn bootstrap(config_path: impl Into<PathBuf>) -> Result<Self, TailwatchError> {
        Self::bootstrap_with(config_path, Arc::new(build_sink)).await
    }

    /// 싱크 생성 함수를 지정해 초기 스냅샷을 게시합니다.
    pub async fn bootstrap_with(
        config_path: impl Into<PathBuf>,
        sink_factory: SinkFactory,
    ) -> Result<Self, TailwatchError> {
        let config_path = config_path.into();
        // 로드 전에 조회해야 로드 도중의 수정을 다음 틱에서 놓치지 않음
        let mtime = config_mtime(&config_path).await?;
        let config = WatchConfig::load(&config_path).await?;
        let matcher = EntryMatcher::from_config(&config.filters)?;
        let sink = sink_factory(&config)?;

        tracing::info!(
            config = %config_path.display(),
            log_file = %config.log_file,
            sink = sink.name(),
            poll_interval_ms = config.poll_interval().as_millis() as u64,
            levels = ?config.filters.levels,
            patterns = config.filters.alert_regex.len(),
            "configuration loaded"
        );

        let snapshot = PipelineSnapshot::from_parts(config, matcher, sink, mtime);
        Ok(Self::new(config_path, Arc::new(SnapshotCell::new(snapshot)), sink_factory))
    }

    /// 이미 게시된 스냅샷 셀로 조정자를 만듭니다.
    pub fn new(
        config_path: impl Into<PathBuf>,
        cell: Arc<SnapshotCell>,
        sink_factory: SinkFactory,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            cell,
            sink_factory,
            skipped: None,
        }
    }

    /// 현재 스냅샷 셀
    pub fn cell(&self) -> &Arc<SnapshotCell> {
        &self.cell
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 한 번의 리로드를 시도합니다.
    ///
    /// # Errors
    ///
    /// 설정 파일 메타데이터 조회에 실패한 경우에만
    /// [`LogPipelineError::ConfigSource`]를 반환합니다.
    pub async fn try_reload(&mut self) -> Result<ReloadOutcome, LogPipelineError> {
        let mtime = config_mtime(&self.config_path).await?;
        if mtime <= self.cell.load().config_mtime() {
            return Ok(ReloadOutcome::Unchanged);
        }

        let candidate = (mtime, content_digest(&self.config_path).await);
        if self.skipped.as_ref() == Some(&candidate) {
            return Ok(ReloadOutcome::Unchanged);
        }

        tracing::info!(config = %self.config_path.display(), "config change detected, validating");

        let outcome = self.evaluate(mtime).await;
        self.skipped = (!outcome.is_applied()).then_some(candidate);
        metrics::counter!(m::RELOADS_TOTAL, m::LABEL_RESULT => outcome.as_label()).increment(1);
        Ok(outcome)
    }

    async fn evaluate(&self, mtime: SystemTime) -> ReloadOutcome {
        let current = self.cell.load();

        let candidate = match WatchConfig::load(&self.config_path).await {
            Ok(config) => config,
            Err(e) => return reject(ReloadRejection::InvalidConfig(e.to_string())),
        };

        if candidate == *current.config() {
            tracing::debug!("config content unchanged, keeping current pipeline");
            return ReloadOutcome::Unchanged;
        }

        let matcher = match EntryMatcher::from_config(&candidate.filters) {
            Ok(matcher) => matcher,
            Err(e) => return reject(ReloadRejection::InvalidPattern(e.to_string())),
        };

        let sink = match (self.sink_factory)(&candidate) {
            Ok(sink) => sink,
            Err(e) => return reject(ReloadRejection::SinkConstruction(e.to_string())),
        };

        let next = PipelineSnapshot::from_parts(candidate, matcher, sink, mtime);
        let applied = AppliedReload {
            log_file_changed: next.log_file() != current.log_file(),
            poll_interval_changed: next.poll_interval() != current.poll_interval(),
            general_changed: next.config().general != current.config().general,
        };

        tracing::info!(
            log_file = %next.log_file().display(),
            sink = next.sink().name(),
            poll_interval_ms = next.poll_interval().as_millis() as u64,
            log_file_changed = applied.log_file_changed,
            poll_interval_changed = applied.poll_interval_changed,
            "new configuration applied"
        );
        if applied.general_changed {
            tracing::warn!("[general] settings changed; restart the daemon to apply them");
        }

        self.cell.publish(next);
        ReloadOutcome::Applied(applied)
    }
}

fn reject(reason: ReloadRejection) -> ReloadOutcome {
    tracing::warn!(reason = %reason, "config reload rejected, keeping current pipeline");
    ReloadOutcome::Rejected(reason)
}

/// 설정 파일 내용의 SHA-256. 읽기 실패 시 빈 문자열 (로드 단계에서 거부됨)
async fn content_digest(path: &Path) -> String {
    match tokio::fs::read(path).await {
        Ok(bytes) => hex::encode(Sha256::digest(&bytes)),
        Err(_) => String::new(),
    }
}

async fn config_mtime(path: &Path) -> Result<SystemTime, LogPipelineError> {
    let source_err = |source| LogPipelineError::ConfigSource {
        path: path.display().to_string(),
        source,
    };
    let meta = tokio::fs::metadata(path).await.map_err(source_err)?;
    meta.modified().map_err(source_err)
}
