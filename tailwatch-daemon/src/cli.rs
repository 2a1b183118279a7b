//! CLI argument definitions for tailwatch-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use tailwatch_core::config::GeneralConfig;

/// Tailwatch log alerting daemon.
///
/// Tails a single log file, filters and deduplicates entries, and forwards
/// matching ones to the console or a chat webhook. The configuration file is
/// re-read while running; invalid edits are rejected and the last good
/// configuration keeps running.
#[derive(Parser, Debug)]
#[command(name = "tailwatch-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to tailwatch.toml configuration file.
    #[arg(short, long, default_value = "/etc/tailwatch/tailwatch.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file (including patterns and sink) and exit.
    #[arg(long)]
    pub validate: bool,

    /// Override PID file path (takes precedence over config file).
    #[arg(long)]
    pub pid_file: Option<String>,
}

impl DaemonCli {
    /// Apply command-line overrides to the startup-only `[general]` section.
    pub fn apply_overrides(&self, general: &mut GeneralConfig) {
        if let Some(level) = &self.log_level {
            general.log_level = level.trim().to_lowercase();
        }
        if let Some(format) = &self.log_format {
            general.log_format = format.trim().to_lowercase();
        }
        if let Some(pid_file) = &self.pid_file {
            general.pid_file = pid_file.clone();
        }
    }
}
