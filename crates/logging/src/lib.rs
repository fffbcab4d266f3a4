//! This crate provides logging initialization for the classmap tools.
//!
//! It supports two modes:
//! - CLI mode: logs to STDERR, keeping STDOUT for command output.
//! - File mode: logs JSON lines to a rolling file in the cache root's `logs`
//!   directory, for embedding discovery in long-running processes.
//!
//! File logs are rolled over when they reach 5 MB. Rotated logs are
//! compressed. The maximum number of rotated logs is 20.

use anyhow::Result;
use class_cache::CacheDirectory;
use file_rotate::{ContentLimit, FileRotate, compression::Compression, suffix::AppendCount};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt::writer::MakeWriterExt};

const LOG_FILE_NAME: &str = "classmap.log";

pub enum LogMode {
    Cli,
    /// Log to `<cache_root>/logs`, or the default cache root when `None`.
    File { cache_root: Option<PathBuf> },
}

/// Guard that keeps background logging workers alive.
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

pub fn init(mode: LogMode, verbose: bool) -> Result<Option<LoggingGuards>> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    match mode {
        LogMode::Cli => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
        LogMode::File { cache_root } => {
            let cache_dir = match cache_root {
                Some(root) => CacheDirectory::new(root)?,
                None => CacheDirectory::new_system_default()?,
            };
            std::fs::create_dir_all(&cache_dir.logs_dir)?;

            let writer = FileRotate::new(
                cache_dir.logs_dir.join(LOG_FILE_NAME),
                AppendCount::new(20),
                ContentLimit::Bytes(5 * 1024 * 1024),
                Compression::OnRotate(1),
                None,
            );

            let (non_blocking, guard) = tracing_appender::non_blocking(writer);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(non_blocking.with_max_level(tracing::Level::INFO))
                .with_ansi(false)
                .json()
                .init();

            Ok(Some(LoggingGuards {
                _guards: vec![guard],
            }))
        }
    }
}
