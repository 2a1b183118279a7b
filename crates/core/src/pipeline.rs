//! 파이프라인 trait -- 모듈 확장 포인트 정의
//!
//! - [`LogParser`]: 원본 라인 → [`LogEntry`]
//! - [`Sink`]: 포맷팅된 알림 텍스트를 외부로 전달
//!
//! `Sink`는 RPITIT를 사용하므로 `dyn Sink`가 불가합니다.
//! 런타임 교체가 필요한 곳에서는 [`DynSink`]를 사용합니다.

use std::future::Future;
use std::pin::Pin;

use crate::error::{ParseError, SinkError};
use crate::types::LogEntry;

/// `Send` 가능한 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 싱크가 기대하는 메시지 표현 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    /// 장식 없는 텍스트 (콘솔)
    Plain,
    /// HTML 마크업 (웹훅 메신저)
    Html,
}

/// 로그 파서 trait
///
/// 새로운 라인 문법을 지원하려면 이 trait을 구현합니다.
pub trait LogParser: Send + Sync {
    /// 지원하는 문법 이름
    fn format_name(&self) -> &str;

    /// 원본 라인을 로그 엔트리로 파싱
    fn parse(&self, raw: &str) -> Result<LogEntry, ParseError>;
}

/// 알림 싱크 trait
///
/// 전송 future는 호출자가 타임아웃이나 종료 신호로 drop할 수 있으며,
/// 구현체는 drop 시점에 진행 중인 I/O를 정리해야 합니다.
///
/// # 구현 예시
/// ```ignore
/// struct DiscardSink;
///
/// impl Sink for DiscardSink {
///     fn name(&self) -> &str { "discard" }
///     fn markup(&self) -> Markup { Markup::Plain }
///     async fn send(&self, _text: &str) -> Result<(), SinkError> { Ok(()) }
/// }
/// ```
pub trait Sink: Send + Sync {
    /// 싱크 이름 (로그/메트릭 레이블용)
    fn name(&self) -> &str;

    /// 이 싱크가 기대하는 메시지 형식
    fn markup(&self) -> Markup;

    /// 메시지 하나를 전송합니다.
    fn send(&self, text: &str) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// dyn-compatible 싱크 trait
///
/// `PipelineSnapshot`이 `Arc<dyn DynSink>`로 싱크를 보관할 수 있게 합니다.
pub trait DynSink: Send + Sync {
    /// 싱크 이름
    fn name(&self) -> &str;

    /// 메시지 형식
    fn markup(&self) -> Markup;

    /// 메시지 하나를 전송합니다.
    fn send<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), SinkError>>;
}

/// Sink를 구현한 타입은 자동으로 DynSink도 구현됩니다.
impl<T: Sink> DynSink for T {
    fn name(&self) -> &str {
        Sink::name(self)
    }

    fn markup(&self) -> Markup {
        Sink::markup(self)
    }

    fn send<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(Sink::send(self, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink {
        sent: AtomicUsize,
    }

    impl Sink for CountingSink {
        fn name(&self) -> &str {
            "counting"
        }

        fn markup(&self) -> Markup {
            Markup::Plain
        }

        async fn send(&self, _text: &str) -> Result<(), SinkError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn sink_is_usable_as_trait_object() {
        let sink = Arc::new(CountingSink {
            sent: AtomicUsize::new(0),
        });
        let dyn_sink: Arc<dyn DynSink> = sink.clone();

        dyn_sink.send("hello").await.unwrap();
        dyn_sink.send("world").await.unwrap();

        assert_eq!(dyn_sink.name(), "counting");
        assert_eq!(dyn_sink.markup(), Markup::Plain);
        assert_eq!(sink.sent.load(Ordering::SeqCst), 2);
    }
}
