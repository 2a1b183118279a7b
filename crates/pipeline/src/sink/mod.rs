//! 알림 싱크 구현
//!
//! - [`ConsoleSink`]: 표준 출력, [`Markup::Plain`](tailwatch_core::pipeline::Markup::Plain)
//! - [`WebhookSink`]: 메신저 봇 API, [`Markup::Html`](tailwatch_core::pipeline::Markup::Html)
//!
//! [`build_sink`]가 `[sender] type`에 따라 하나를 골라 `Arc<dyn DynSink>`로 돌려줍니다.

mod console;
mod webhook;

use std::sync::Arc;

use tailwatch_core::config::{SenderKind, WatchConfig};
use tailwatch_core::pipeline::DynSink;

use crate::error::LogPipelineError;

pub use console::ConsoleSink;
pub use webhook::{REQUEST_TIMEOUT, WebhookSink};

/// 설정에 맞는 싱크를 생성합니다.
///
/// # Errors
///
/// 알 수 없는 싱크 종류이거나 싱크 생성에 실패하면
/// [`LogPipelineError::SinkBuild`]를 반환합니다.
pub fn build_sink(config: &WatchConfig) -> Result<Arc<dyn DynSink>, LogPipelineError> {
    let kind = config
        .sender_kind()
        .map_err(|e| LogPipelineError::SinkBuild {
            sink: config.sender.kind.clone(),
            reason: e.to_string(),
        })?;

    let sink: Arc<dyn DynSink> = match kind {
        SenderKind::Console => Arc::new(ConsoleSink::stdout()),
        SenderKind::Webhook => Arc::new(WebhookSink::new(&config.webhook)?),
    };

    tracing::debug!(sink = sink.name(), "sink constructed");
    Ok(sink)
}
