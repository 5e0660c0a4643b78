use simplelog::*;
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Default log directory: `~/.local/share/scorescribe/logs`.
pub fn default_log_dir() -> Result<PathBuf, Error> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("scorescribe")
        .join("logs"))
}

/// Starts the file logger once per process and returns the log file path.
/// Later calls return the path of the logger already running.
pub fn init_logger(level: &str, log_dir: Option<&Path>) -> Result<PathBuf, Error> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let level = LevelFilter::from_str(level).map_err(|_| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("unknown log level '{}'", level),
        )
    })?;

    let log_dir = match log_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_log_dir()?,
    };
    fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("app.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Debug)
        .build();

    CombinedLogger::init(vec![WriteLogger::new(level, config, log_file)])
        .map_err(|e| Error::new(ErrorKind::Other, format!("Logger initialization failed: {}", e)))?;

    Ok(LOG_PATH.get_or_init(|| log_path).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_level() {
        let dir = tempfile::tempdir().unwrap();
        let result = init_logger("loud", Some(dir.path()));
        if LOG_PATH.get().is_none() {
            assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidInput);
        }
    }
}
