//! Orchestrator integration tests.
//!
//! Tests the daemon lifecycle: bootstrap, PID file handling, the watcher
//! loop, and cancellation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use tailwatch_core::config::{GeneralConfig, WatchConfig};
use tailwatch_core::pipeline::DynSink;
use tailwatch_daemon::orchestrator::Orchestrator;
use tailwatch_pipeline::{ConsoleSink, LogPipelineError, SinkFactory};

/// Shared buffer that collects console sink output.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capturing_factory(captured: &Captured) -> SinkFactory {
    let captured = captured.clone();
    Arc::new(move |_: &WatchConfig| {
        Ok::<Arc<dyn DynSink>, LogPipelineError>(Arc::new(ConsoleSink::with_writer(
            captured.clone(),
        )))
    })
}

fn write_config(dir: &TempDir, log_file: &Path, alert_regex: &str) -> PathBuf {
    let path = dir.path().join("tailwatch.toml");
    let body = format!(
        r#"
log_file = "{}"
poll_interval_ms = 50

[sender]
type = "stdout"

[filters]
levels = ["ERROR"]
alert_regex = ["{alert_regex}"]
"#,
        log_file.display()
    );
    std::fs::write(&path, body).unwrap();
    path
}

fn general_with_pid(dir: &TempDir) -> (GeneralConfig, PathBuf) {
    let pid_path = dir.path().join("run").join("tailwatch.pid");
    let general = GeneralConfig {
        pid_file: pid_path.display().to_string(),
        ..Default::default()
    };
    (general, pid_path)
}

#[tokio::test]
async fn test_build_rejects_missing_config_file() {
    // Given
    let dir = TempDir::new().unwrap();

    // When
    let missing = dir.path().join("absent.toml");
    let result = Orchestrator::build(missing, GeneralConfig::default()).await;

    // Then
    let err = result.err().expect("missing config must fail");
    assert!(format!("{err:#}").contains("absent.toml"));
}

#[tokio::test]
async fn test_build_rejects_invalid_pattern() {
    // Given
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &dir.path().join("app.log"), "(unclosed");

    // When
    let result = Orchestrator::build(&config, GeneralConfig::default()).await;

    // Then
    assert!(result.is_err());
}

#[tokio::test]
async fn test_build_keeps_cli_general_settings() {
    // Given
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &dir.path().join("app.log"), "failed");
    let general = GeneralConfig {
        dedup_ttl_secs: 42,
        ..Default::default()
    };

    // When
    let orchestrator = Orchestrator::build(&config, general).await.unwrap();

    // Then
    assert_eq!(orchestrator.general().dedup_ttl_secs, 42);
    assert_eq!(
        orchestrator.watcher().settings().dedup_ttl,
        Duration::from_secs(42)
    );
}

#[tokio::test]
async fn test_run_dispatches_and_stops_on_cancel() {
    // Given
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("app.log");
    std::fs::write(
        &log,
        "2026-01-01T00:00:00Z [ERROR] Database connection failed\n\
         2026-01-01T00:00:01Z [INFO] Database connection failed\n\
         2026-01-01T00:00:02Z [ERROR] Database connection failed\n",
    )
    .unwrap();
    let config = write_config(&dir, &log, "connection failed");
    let (general, pid_path) = general_with_pid(&dir);
    let captured = Captured::default();
    let mut orchestrator = Orchestrator::build_with(&config, general, capturing_factory(&captured))
        .await
        .unwrap();
    let cancel = orchestrator.cancel_token();

    // When
    let observed = captured.clone();
    let pid_seen = pid_path.clone();
    let stopper = async move {
        let mut pid_existed = false;
        for _ in 0..250 {
            pid_existed |= pid_seen.exists();
            if observed.text().contains("Database connection failed") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        // one more poll tick to let the remaining lines through
        tokio::time::sleep(Duration::from_millis(150)).await;
        cancel.cancel();
        pid_existed
    };
    let (result, pid_existed) = tokio::join!(orchestrator.run(), stopper);

    // Then
    result.unwrap();
    assert!(pid_existed, "PID file should exist while running");
    assert!(!pid_path.exists(), "PID file should be removed on shutdown");
    let text = captured.text();
    assert_eq!(text.matches("Message: Database connection failed").count(), 2);
    assert!(!text.contains("Level: INFO"));
}

#[tokio::test]
async fn test_run_refuses_existing_pid_file() {
    // Given
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &dir.path().join("app.log"), "failed");
    let (general, pid_path) = general_with_pid(&dir);
    std::fs::create_dir_all(pid_path.parent().unwrap()).unwrap();
    std::fs::write(&pid_path, "31337\n").unwrap();
    let mut orchestrator = Orchestrator::build(&config, general).await.unwrap();

    // When
    let err = orchestrator.run().await.unwrap_err();

    // Then
    assert!(err.to_string().contains("31337"));
    assert_eq!(std::fs::read_to_string(&pid_path).unwrap(), "31337\n");
}

#[tokio::test]
async fn test_run_without_pid_file_returns_after_cancel() {
    // Given
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &dir.path().join("missing.log"), "failed");
    let mut orchestrator = Orchestrator::build(&config, GeneralConfig::default())
        .await
        .unwrap();
    orchestrator.cancel_token().cancel();

    // When
    let result = tokio::time::timeout(Duration::from_secs(5), orchestrator.run()).await;

    // Then
    assert!(result.expect("run should return promptly").is_ok());
}
