use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Diagnostics go to stderr; stdout is reserved for the report
pub struct Logger {
    min_level: LogLevel,
    log_file: Option<Arc<Mutex<std::fs::File>>>,
    console_output: bool,
}

impl Logger {
    /// Creates a new logger with console output only
    pub fn new(min_level: LogLevel) -> Self {
        Logger {
            min_level,
            log_file: None,
            console_output: true,
        }
    }

    /// Creates a new logger with both console and file output
    pub fn with_file(min_level: LogLevel, file_path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        Ok(Logger {
            min_level,
            log_file: Some(Arc::new(Mutex::new(file))),
            console_output: true,
        })
    }

    /// Sets whether console output is enabled
    pub fn set_console_output(&mut self, enabled: bool) {
        self.console_output = enabled;
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let formatted = format!("[{}] [{}] {}", timestamp, level.as_str(), message);

        if self.console_output {
            eprintln!("{}", formatted);
        }

        if let Some(file) = &self.log_file {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{}", formatted);
            }
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new(LogLevel::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_logger_default() {
        let logger = Logger::default();
        assert_eq!(logger.min_level, LogLevel::Warning);
        assert!(!logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Error));
    }

    #[test]
    fn test_file_logger_filters_by_level() {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("clubsim_log_test_{}.log", timestamp));

        let mut logger = Logger::with_file(LogLevel::Info, &path).unwrap();
        logger.set_console_output(false);
        logger.debug("hidden");
        logger.info("club opened");
        logger.warning("09:00 13 NotOpenYet");
        drop(logger);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[INFO] club opened"));
        assert!(lines[1].contains("[WARNING] 09:00 13 NotOpenYet"));
        assert!(!contents.contains("hidden"));

        let _ = std::fs::remove_file(path);
    }
}
