//! Logging init: append to a file under the XDG state dir, with a stderr
//! fallback when the state dir is unusable.

use anyhow::Result;
use std::fs;
use std::io;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Per-event writer handed to the subscriber: the cloned log file, or stderr
/// when cloning the handle fails.
enum LogWriter {
    File(fs::File),
    Stderr,
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogWriter::File(f) => f.write(buf),
            LogWriter::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogWriter::File(f) => f.flush(),
            LogWriter::Stderr => io::stderr().lock().flush(),
        }
    }
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hfd=debug"))
}

/// Initialize structured logging to `~/.local/state/hfd/hfd.log`.
/// Returns Err when the log file cannot be opened so the caller can fall
/// back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let log_dir = xdg::BaseDirectories::with_prefix("hfd")?.get_state_home();
    fs::create_dir_all(&log_dir)?;
    let log_file_path = log_dir.join("hfd.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    let writer = BoxMakeWriter::new(move || {
        file.try_clone()
            .map(LogWriter::File)
            .unwrap_or(LogWriter::Stderr)
    });

    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::info!("hfd logging initialized at {}", log_file_path.display());

    Ok(())
}

/// Initialize logging to stderr only (no file). Use when init_logging() fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
