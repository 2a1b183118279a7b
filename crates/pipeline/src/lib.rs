#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`reader`]: 단일 파일 꼬리 읽기 커서 (부분 라인 보관, 축소 감지)
//! - [`parser`]: 고정 문법 라인 파서
//! - [`matcher`]: 레벨 + 정규식 필터
//! - [`fingerprint`]: 원본 라인 지문
//! - [`dedup`]: TTL 기반 중복 제거 윈도우
//! - [`format`]: 싱크별 메시지 포맷팅
//! - [`sink`]: 콘솔/웹훅 싱크 구현
//! - [`snapshot`]: 불변 파이프라인 스냅샷과 원자적 게시 셀
//! - [`reload`]: 설정 변경 감지, 후보 검증, 게시
//! - [`watcher`]: 폴/리로드/종료를 다중화하는 단일 이벤트 루프
//! - [`error`]: 도메인 에러 타입

pub mod dedup;
pub mod error;
pub mod fingerprint;
pub mod format;
pub mod matcher;
pub mod parser;
pub mod reader;
pub mod reload;
pub mod sink;
pub mod snapshot;
pub mod watcher;

// --- 주요 타입 re-export ---

pub use dedup::DedupWindow;
pub use error::LogPipelineError;
pub use fingerprint::{FINGERPRINT_LEN, fingerprint};
pub use matcher::EntryMatcher;
pub use parser::LineParser;
pub use reader::{ReaderState, TailReader};
pub use reload::{AppliedReload, ReloadCoordinator, ReloadOutcome, ReloadRejection, SinkFactory};
pub use sink::{ConsoleSink, WebhookSink, build_sink};
pub use snapshot::{PipelineSnapshot, SnapshotCell};
pub use watcher::{LogWatcher, TickReport, WatcherSettings};
