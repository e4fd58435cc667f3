#[cfg(debug_assertions)]
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use simplelog::{CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, WriteLogger};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use dispeak_platform::AppPaths;

pub const DEFAULT_MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Appends to the log file, reopening it if it was deleted while running.
struct ReopeningLogFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl ReopeningLogFile {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = open_append(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    fn with_file<R>(&self, f: impl FnOnce(&mut File) -> io::Result<R>) -> io::Result<R> {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.path.exists() {
            *guard = open_append(&self.path)?;
        }
        f(&mut guard)
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for ReopeningLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(File::flush)
    }
}

/// Drop the older half of a log larger than `max_log_size`, starting the
/// kept part on a fresh line. A missing log is left alone.
fn trim_log_file(log_path: &Path, max_log_size: u64) -> io::Result<()> {
    let size = match std::fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(error),
    };
    if size <= max_log_size {
        return Ok(());
    }

    let contents = std::fs::read(log_path)?;
    let midpoint = contents.len() / 2;
    let tail = match contents[midpoint..].iter().position(|&byte| byte == b'\n') {
        Some(newline) => &contents[midpoint + newline + 1..],
        None => &contents[midpoint..],
    };
    std::fs::write(log_path, tail)
}

/// Install the global logger writing to the per-user log file (and to the
/// terminal in debug builds).
pub fn init_logging(paths: &AppPaths, debug_enabled: bool) {
    let log_path = paths.log_file();
    let trimmed = trim_log_file(&log_path, DEFAULT_MAX_LOG_SIZE);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("dispeak")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    #[cfg(debug_assertions)]
    loggers.push(TermLogger::new(
        LevelFilter::Debug,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));

    match ReopeningLogFile::open(log_path.clone()) {
        Ok(writer) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, writer)),
        Err(error) => eprintln!("Log file {} unavailable: {error}", log_path.display()),
    }

    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }

    set_logging_enabled(debug_enabled);
    log::info!("Logging initialized, log file: {}", log_path.display());
    if let Err(error) = trimmed {
        log::warn!("Could not trim oversized log {}: {error}", log_path.display());
    }
}

pub fn set_logging_enabled(enabled: bool) {
    if enabled {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }
}
