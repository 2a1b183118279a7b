//! 콘솔 싱크
//!
//! 구분선으로 감싼 블록을 표준 출력(또는 주입된 writer)에 씁니다.

use std::io::Write;
use std::sync::Mutex;

use tailwatch_core::error::SinkError;
use tailwatch_core::pipeline::{Markup, Sink};

const SEPARATOR: &str = "================================";

/// 표준 출력 싱크
///
/// 쓰기 자체가 실패하지 않는 한 항상 성공합니다.
pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    /// 표준 출력에 쓰는 싱크를 만듭니다.
    pub fn stdout() -> Self {
        Self::with_writer(std::io::stdout())
    }

    /// 임의의 writer에 쓰는 싱크를 만듭니다.
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }

    fn write_block(&self, text: &str) -> std::io::Result<()> {
        // 다른 스레드의 패닉으로 오염되어도 writer 자체는 계속 쓸 수 있음
        let mut out = self.out.lock().unwrap_or_else(|p| p.into_inner());
        writeln!(out, "{SEPARATOR}")?;
        out.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            out.write_all(b"\n")?;
        }
        writeln!(out, "{SEPARATOR}")?;
        out.flush()
    }
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink").finish_non_exhaustive()
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn markup(&self) -> Markup {
        Markup::Plain
    }

    async fn send(&self, text: &str) -> Result<(), SinkError> {
        self.write_block(text)
            .map_err(|e| SinkError::Write(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn writes_framed_block() {
        let buf = SharedBuf::default();
        let sink = ConsoleSink::with_writer(buf.clone());

        sink.send("Level: ERROR\n").await.unwrap();

        let written = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(written, format!("{SEPARATOR}\nLevel: ERROR\n{SEPARATOR}\n"));
    }

    #[tokio::test]
    async fn adds_missing_newline() {
        let buf = SharedBuf::default();
        let sink = ConsoleSink::with_writer(buf.clone());
        sink.send("no newline").await.unwrap();
        let written = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(written.contains("no newline\n"));
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let sink = ConsoleSink::with_writer(Broken);
        assert!(matches!(sink.send("x").await, Err(SinkError::Write(_))));
    }

    #[test]
    fn advertises_plain_markup() {
        let sink = ConsoleSink::stdout();
        assert_eq!(Sink::markup(&sink), Markup::Plain);
        assert_eq!(Sink::name(&sink), "console");
    }
}
