//! 불변 파이프라인 스냅샷과 원자적 게시 셀
//!
//! ```text
//! [ReloadCoordinator] --build/validate--> PipelineSnapshot
//!                                              | publish (ArcSwap::swap)
//!                                              v
//! [LogWatcher::poll_once] --load()--> Arc<PipelineSnapshot> (틱 동안 고정)
//! ```
//!
//! 스냅샷은 생성 후 바뀌지 않습니다. 교체된 스냅샷은 마지막 `Arc`가
//! 해제될 때 함께 해제되므로 진행 중인 틱은 끝까지 이전 스냅샷을 씁니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use arc_swap::ArcSwap;

use tailwatch_core::config::{FormatConfig, WatchConfig};
use tailwatch_core::pipeline::DynSink;

use crate::error::LogPipelineError;
use crate::matcher::EntryMatcher;
use crate::sink::build_sink;

/// 한 번의 틱을 실행하는 데 필요한 모든 구성 요소
pub struct PipelineSnapshot {
    config: WatchConfig,
    matcher: EntryMatcher,
    sink: Arc<dyn DynSink>,
    poll_interval: Duration,
    log_file: PathBuf,
    config_mtime: SystemTime,
}

impl PipelineSnapshot {
    /// 검증된 설정으로 매처와 싱크를 만들어 스냅샷을 구성합니다.
    ///
    /// # Errors
    ///
    /// 패턴 컴파일 또는 싱크 생성 실패 시 에러를 반환하며, 부분 구성은 남지 않습니다.
    pub fn build(config: WatchConfig, config_mtime: SystemTime) -> Result<Self, LogPipelineError> {
        let matcher = EntryMatcher::from_config(&config.filters)?;
        let sink = build_sink(&config)?;
        Ok(Self::from_parts(config, matcher, sink, config_mtime))
    }

    /// 이미 만들어진 구성 요소로 스냅샷을 조립합니다.
    pub fn from_parts(
        config: WatchConfig,
        matcher: EntryMatcher,
        sink: Arc<dyn DynSink>,
        config_mtime: SystemTime,
    ) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            log_file: PathBuf::from(&config.log_file),
            config,
            matcher,
            sink,
            config_mtime,
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn matcher(&self) -> &EntryMatcher {
        &self.matcher
    }

    pub fn sink(&self) -> &Arc<dyn DynSink> {
        &self.sink
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// 이 스냅샷을 만든 설정 파일의 수정 시각
    pub fn config_mtime(&self) -> SystemTime {
        self.config_mtime
    }

    pub fn format(&self) -> FormatConfig {
        self.config.format
    }
}

impl std::fmt::Debug for PipelineSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineSnapshot")
            .field("log_file", &self.log_file)
            .field("poll_interval", &self.poll_interval)
            .field("sink", &self.sink.name())
            .field("patterns", &self.matcher.pattern_count())
            .field("config_mtime", &self.config_mtime)
            .finish_non_exhaustive()
    }
}

/// 현재 스냅샷을 담는 단일 쓰기/다중 읽기 셀
///
/// 읽기는 잠금 없이 `Arc`를 복제하고, 쓰기는 포인터를 원자적으로 교체합니다.
pub struct SnapshotCell {
    current: ArcSwap<PipelineSnapshot>,
}

impl SnapshotCell {
    pub fn new(initial: PipelineSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// 현재 게시된 스냅샷
    pub fn load(&self) -> Arc<PipelineSnapshot> {
        self.current.load_full()
    }

    /// 새 스냅샷을 게시하고 이전 스냅샷을 돌려줍니다.
    pub fn publish(&self, next: PipelineSnapshot) -> Arc<PipelineSnapshot> {
        self.current.swap(Arc::new(next))
    }
}

impl std::fmt::Debug for SnapshotCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SnapshotCell").field(&*self.current.load()).finish()
    }
}
