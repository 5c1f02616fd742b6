//! Per-collection activity log.
//!
//! Every store operation reports one event. Events always go to `tracing`
//! (target `moonlight::activity`); events whose level is enabled for the
//! collection are also appended to its log file as
//! `[dd.mm.YYYY HH:MM:SS] <LEVEL> -> message`.
//!
//! Logging never fails the data operation: file errors are reported through
//! `tracing` and otherwise ignored.

use crate::lock::still_linked;
use chrono::Local;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Severity of an activity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Lifecycle events (connect, drop).
    Info,
    /// A completed operation.
    Success,
    /// A legal but noteworthy outcome, such as an empty query result.
    Warning,
    /// A rejected operation.
    Error,
}

impl LogLevel {
    /// Every level, in ascending severity.
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Info,
        LogLevel::Success,
        LogLevel::Warning,
        LogLevel::Error,
    ];

    /// Upper-case label used in log files.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(LogLevel::Info),
            "success" => Ok(LogLevel::Success),
            "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Append-only event sink for one collection.
#[derive(Debug)]
pub struct ActivityLog {
    collection: String,
    path: PathBuf,
    levels: Vec<LogLevel>,
    file: Mutex<Option<File>>,
}

impl ActivityLog {
    /// Creates a sink writing enabled levels to `path`.
    ///
    /// The file is opened lazily on the first enabled event.
    pub fn new(collection: impl Into<String>, path: impl Into<PathBuf>, levels: &[LogLevel]) -> Self {
        Self {
            collection: collection.into(),
            path: path.into(),
            levels: levels.to_vec(),
            file: Mutex::new(None),
        }
    }

    /// Returns the log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if `level` is written to the file.
    #[must_use]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.levels.contains(&level)
    }

    /// Records an event.
    pub fn write(&self, level: LogLevel, message: impl AsRef<str>) {
        let message = message.as_ref();
        let collection = self.collection.as_str();

        match level {
            LogLevel::Info | LogLevel::Success => {
                tracing::info!(target: "moonlight::activity", collection, level = level.label(), "{message}")
            }
            LogLevel::Warning => {
                tracing::warn!(target: "moonlight::activity", collection, level = level.label(), "{message}")
            }
            LogLevel::Error => {
                tracing::error!(target: "moonlight::activity", collection, level = level.label(), "{message}")
            }
        }

        if !self.is_enabled(level) {
            return;
        }

        if let Err(e) = self.append(level, message) {
            tracing::warn!(
                collection,
                path = %self.path.display(),
                error = %e,
                "failed to write activity log"
            );
        }
    }

    /// Closes the file handle. A later event reopens it.
    pub fn stop(&self) {
        self.file.lock().take();
    }

    fn append(&self, level: LogLevel, message: &str) -> std::io::Result<()> {
        let mut guard = self.file.lock();

        // Another handle may have dropped the collection and unlinked the file.
        if guard.as_ref().is_some_and(|file| !still_linked(file, &self.path)) {
            guard.take();
        }

        if guard.is_none() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            *guard = Some(file);
        }

        let line = format_line(level, message);
        match guard.as_mut() {
            Some(file) => file.write_all(line.as_bytes()),
            None => Ok(()),
        }
    }
}

/// Formats one log line with the current local time.
#[must_use]
pub fn format_line(level: LogLevel, message: &str) -> String {
    let now = Local::now().format("%d.%m.%Y %H:%M:%S");
    format!("[{now}] <{}> -> {message}\n", level.label())
}
