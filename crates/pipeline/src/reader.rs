//! 단일 파일 꼬리 읽기 커서
//!
//! [`TailReader`]는 호출 사이에 읽은 위치를 기억하며, 개행으로 끝난 라인만 내보냅니다.
//! 매 호출마다 파일을 새로 열기 때문에 외부에서 교체(rotation)된 파일도 따라갑니다.
//!
//! # 상태 전이
//!
//! 각 호출이 끝날 때 상태가 결정됩니다.
//!
//! | 조건 | 다음 상태 |
//! |---|---|
//! | 개행 없는 나머지가 남음 | `PendingTail` |
//! | 파일 크기 < 오프셋 이었고 나머지 없음 | `TruncatedReset` |
//! | 그 외 | `Normal` |
//!
//! - [`ReaderState::Normal`]: 오프셋이 마지막 개행 바로 뒤를 가리킴
//! - [`ReaderState::TruncatedReset`]: 이번 호출에서 파일 축소를 감지해 0부터 다시 읽음
//! - [`ReaderState::PendingTail`]: 개행 없는 나머지가 있어 오프셋이 그 시작을 가리킴
//!
//! 미완성 꼬리는 내보내지 않습니다. 오프셋을 꼬리 시작 지점에 두므로 다음 호출에서
//! 꼬리 바이트를 다시 읽어 뒤에 붙은 내용과 함께 하나의 라인으로 완성합니다.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

use tailwatch_core::metrics as m;

use crate::error::LogPipelineError;

/// 리더 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReaderState {
    /// 모든 바이트가 완성된 라인으로 소비됨
    #[default]
    Normal,
    /// 직전 호출에서 축소를 감지해 오프셋을 0으로 되돌림
    TruncatedReset,
    /// 개행 없는 꼬리가 남아 있음
    PendingTail,
}

/// 단일 파일 꼬리 읽기 커서
#[derive(Debug)]
pub struct TailReader {
    path: PathBuf,
    /// 완성된 라인으로 소비한 바이트 오프셋
    offset: u64,
    /// 개행 없는 마지막 조각 (다음 호출에서 다시 읽힘)
    pending_tail: Vec<u8>,
    state: ReaderState,
    resets: u64,
}

impl TailReader {
    /// 파일 처음부터 읽는 리더를 만듭니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            pending_tail: Vec::new(),
            state: ReaderState::Normal,
            resets: 0,
        }
    }

    /// 지정한 오프셋부터 읽는 리더를 만듭니다.
    pub fn with_offset(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            offset,
            ..Self::new(path)
        }
    }

    /// 지난 호출 이후 새로 완성된 라인을 파일 순서대로 반환합니다.
    ///
    /// 후행 `\n`/`\r\n`은 제거하고 빈 라인은 건너뜁니다.
    /// 잘못된 UTF-8 바이트는 U+FFFD로 대체합니다.
    ///
    /// # Errors
    ///
    /// 열기/메타데이터 조회/seek/읽기 실패 시 [`LogPipelineError::Reader`]를 반환합니다.
    /// 실패한 호출은 오프셋을 바꾸지 않으므로 다음 호출에서 같은 위치부터 재시도합니다.
    pub async fn read_new_lines(&mut self) -> Result<Vec<String>, LogPipelineError> {
        let file = File::open(&self.path).await.map_err(|e| self.io_err(e))?;
        let size = file.metadata().await.map_err(|e| self.io_err(e))?.len();

        let mut offset = self.offset;
        let truncated = size < offset;
        if truncated {
            tracing::warn!(
                path = %self.path.display(),
                size,
                offset,
                "log file shrank, restarting from beginning"
            );
            offset = 0;
            self.pending_tail.clear();
            self.resets += 1;
            metrics::counter!(m::READER_RESETS_TOTAL).increment(1);
        }

        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| self.io_err(e))?;

        let mut lines = Vec::new();
        let mut tail = Vec::new();
        let mut position = offset;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| self.io_err(e))?;
            if n == 0 {
                break;
            }
            position += n as u64;

            if buf.last() != Some(&b'\n') {
                tail = std::mem::take(&mut buf);
                break;
            }

            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            if !buf.is_empty() {
                lines.push(String::from_utf8_lossy(&buf).into_owned());
            }
        }

        self.offset = position - tail.len() as u64;
        self.pending_tail = tail;
        self.state = if !self.pending_tail.is_empty() {
            ReaderState::PendingTail
        } else if truncated {
            ReaderState::TruncatedReset
        } else {
            ReaderState::Normal
        };

        if !lines.is_empty() {
            tracing::trace!(
                path = %self.path.display(),
                count = lines.len(),
                offset = self.offset,
                "read new lines"
            );
        }
        Ok(lines)
    }

    fn io_err(&self, source: std::io::Error) -> LogPipelineError {
        LogPipelineError::Reader {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// 감시 대상 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 완성된 라인까지 소비한 바이트 오프셋
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 아직 개행을 받지 못한 꼬리
    pub fn pending_tail(&self) -> &[u8] {
        &self.pending_tail
    }

    /// 마지막 호출 이후의 상태
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// 축소 감지로 0부터 다시 읽은 횟수
    pub fn resets(&self) -> u64 {
        self.resets
    }
}
