//! Daemon assembly and lifecycle management.
//!
//! The [`Orchestrator`] wires the pieces of `tailwatch-daemon` together:
//!
//! 1. Bootstrap the reload coordinator (initial config, matcher, sink). Failure is fatal.
//! 2. Install the Prometheus recorder when `[metrics]` is enabled.
//! 3. Write the PID file.
//! 4. Run the single [`LogWatcher`] loop until SIGTERM/SIGINT cancels it.
//! 5. Remove the PID file.
//!
//! `[general]` settings (timers, PID file, logging) are fixed for the
//! lifetime of the process; everything else is hot-reloaded by the watcher.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use tailwatch_core::config::GeneralConfig;
use tailwatch_pipeline::{LogWatcher, ReloadCoordinator, SinkFactory, WatcherSettings};

use crate::metrics_server;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Startup-only settings, after CLI overrides.
    general: GeneralConfig,
    /// The poll/reload loop.
    watcher: LogWatcher,
    /// Cancelled by the signal task or by [`Orchestrator::cancel_token`] holders.
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// `general` is the `[general]` section with CLI overrides already applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial configuration cannot be loaded or
    /// validated, if a pattern or the sink cannot be built, or if the metrics
    /// recorder cannot be installed.
    pub async fn build(config_path: impl Into<PathBuf>, general: GeneralConfig) -> Result<Self> {
        let config_path = config_path.into();
        let coordinator = ReloadCoordinator::bootstrap(&config_path)
            .await
            .with_context(|| format!("failed to load {}", config_path.display()))?;
        Self::assemble(coordinator, general)
    }

    /// Build with a custom sink factory (used by integration tests).
    pub async fn build_with(
        config_path: impl Into<PathBuf>,
        general: GeneralConfig,
        sink_factory: SinkFactory,
    ) -> Result<Self> {
        let config_path = config_path.into();
        let coordinator = ReloadCoordinator::bootstrap_with(&config_path, sink_factory)
            .await
            .with_context(|| format!("failed to load {}", config_path.display()))?;
        Self::assemble(coordinator, general)
    }

    fn assemble(coordinator: ReloadCoordinator, general: GeneralConfig) -> Result<Self> {
        let metrics = coordinator.cell().load().config().metrics.clone();
        if metrics.enabled {
            metrics_server::install_metrics_recorder(&metrics)?;
        }

        let settings = WatcherSettings::from_general(&general);
        tracing::info!(
            dedup_ttl_secs = settings.dedup_ttl.as_secs(),
            reload_interval_ms = settings.reload_interval.as_millis() as u64,
            send_timeout_secs = settings.send_timeout.as_secs(),
            "watcher settings fixed for this process"
        );

        Ok(Self {
            general,
            watcher: LogWatcher::new(coordinator, settings),
            cancel: CancellationToken::new(),
        })
    }

    /// Token that stops [`Orchestrator::run`] when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Startup-only settings in effect.
    pub fn general(&self) -> &GeneralConfig {
        &self.general
    }

    /// The watcher driven by this orchestrator.
    pub fn watcher(&self) -> &LogWatcher {
        &self.watcher
    }

    /// Run until a shutdown signal arrives or the cancel token is cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the PID file cannot be written or signal handlers
    /// cannot be installed.
    pub async fn run(&mut self) -> Result<()> {
        let pid_path =
            (!self.general.pid_file.is_empty()).then(|| PathBuf::from(&self.general.pid_file));
        if let Some(path) = &pid_path {
            write_pid_file(path)?;
        }

        let signals = match ShutdownSignals::install() {
            Ok(signals) => signals,
            Err(e) => {
                if let Some(path) = &pid_path {
                    remove_pid_file(path);
                }
                return Err(e);
            }
        };

        let cancel = self.cancel.clone();
        let signal_task = tokio::spawn(async move {
            tokio::select! {
                signal = signals.wait() => {
                    tracing::info!(signal = signal, "shutdown signal received");
                    cancel.cancel();
                }
                _ = cancel.cancelled() => {}
            }
        });

        tracing::info!(
            config = %self.watcher.coordinator().config_path().display(),
            "entering main event loop"
        );
        self.watcher.run(self.cancel.clone()).await;

        self.cancel.cancel();
        if let Err(e) = signal_task.await {
            tracing::warn!(error = %e, "signal task ended abnormally");
        }

        if let Some(path) = &pid_path {
            remove_pid_file(path);
        }

        tracing::info!("tailwatch-daemon stopped");
        Ok(())
    }
}

/// SIGTERM and SIGINT handlers, installed up front so failures surface before the loop starts.
struct ShutdownSignals {
    sigterm: tokio::signal::unix::Signal,
    sigint: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    fn install() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;
        Ok(Self { sigterm, sigint })
    }

    /// Wait for either signal and return its name.
    async fn wait(mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// Write the current process PID to a file.
///
/// # Security
///
/// - `create_new(true)` creates the file atomically, so a stale or foreign file is never overwritten
/// - The created file must be a regular file (symlinks are rejected)
/// - Parent directory is created with 0o700, the file with 0o600
///
/// # Errors
///
/// Returns an error if the file already exists or cannot be written.
pub(crate) fn write_pid_file(path: &Path) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            fs::DirBuilder::new().mode(0o700).recursive(true).create(parent)?;
        }
        #[cfg(not(unix))]
        {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let existing = fs::read_to_string(path).unwrap_or_else(|_| "unknown".to_owned());
            return Err(anyhow::anyhow!(
                "PID file {} already exists with PID: {}. Is another instance running?",
                path.display(),
                existing.trim()
            ));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to create PID file {}", path.display()));
        }
    };

    if !file.metadata()?.is_file() {
        let _ = fs::remove_file(path);
        return Err(anyhow::anyhow!(
            "PID file {} is not a regular file",
            path.display()
        ));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    let pid = std::process::id();
    writeln!(file, "{}", pid)?;

    tracing::info!(pid = pid, path = %path.display(), "PID file written");
    Ok(())
}

/// Remove the PID file on shutdown. Failures are logged, never returned.
pub(crate) fn remove_pid_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "PID file removed"),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove PID file"
        ),
    }
}
