use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "movie-rater.log";

/// Route `tracing` output to `log_dir/movie-rater.log`; the terminal belongs
/// to the UI. Returns the log file path.
///
/// `level` (from `--log-level`) wins over `RUST_LOG`; the fallback is `info`.
pub fn init(log_dir: &Path, level: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(level)?)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;

    Ok(path)
}

fn filter(level: Option<&str>) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    match level {
        Some(level) => EnvFilter::try_new(level),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}
