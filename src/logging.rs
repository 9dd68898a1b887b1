use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// Env var holding the log filter, e.g. `TYPOMETER_LOG=debug`
pub const LOG_ENV: &str = "TYPOMETER_LOG";
const DEFAULT_LEVEL: &str = "info";

/// Installs a file-backed subscriber. stdout belongs to the TUI, so logs
/// never go to the terminal.
pub fn init(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let _ = tracing_subscriber::fmt()
        // fall back to the default level if the variable is unset or invalid
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV)
                .or_else(|_| EnvFilter::try_new(DEFAULT_LEVEL))
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL)),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_log_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("typometer.log");

        init(&path).unwrap();
        // a second install is tolerated
        init(&path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn init_reports_unopenable_path() {
        let dir = tempdir().unwrap();

        // a directory cannot be opened as a log file
        assert!(init(dir.path()).is_err());
    }
}
