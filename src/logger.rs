//! File-backed sink for the `log` facade.
//!
//! The terminal belongs to the editor, so diagnostics go to an append-mode
//! file instead of stderr. Logging is best effort: a missing or unwritable
//! log file must never take the editor down.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};

struct FileLogger {
    file: Mutex<File>,
}

impl Log for FileLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "{} {:<5} {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

fn default_log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("rill.log"))
        .unwrap_or_else(|| PathBuf::from("rill.log"))
}

pub fn init() -> io::Result<()> {
    let path = default_log_path();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let logger = FileLogger {
        file: Mutex::new(file),
    };
    log::set_boxed_logger(Box::new(logger))
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
    log::set_max_level(LevelFilter::Info);
    Ok(())
}
