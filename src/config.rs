use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::{
    app_dirs::AppDirs,
    engine::EngineSettings,
    error::{Error, Result},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// how long the event loop waits for input before ticking
    pub tick_rate_ms: u64,
    /// period of the live stats update
    pub stats_interval_ms: u64,
    pub live_wpm_min_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_ms: 100,
            stats_interval_ms: 1000,
            live_wpm_min_secs: 6,
        }
    }
}

impl Config {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }
}

impl From<&Config> for EngineSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            stats_interval: Duration::from_millis(cfg.stats_interval_ms),
            live_wpm_min: Duration::from_secs(cfg.live_wpm_min_secs),
        }
    }
}

pub trait ConfigStore {
    /// Never fails; broken or missing config means defaults
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path =
            AppDirs::config_path().unwrap_or_else(|| PathBuf::from("typometer_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First run writes the defaults out so there is a file to edit.
    /// Failing to write them is logged, not fatal.
    pub fn load_or_init(&self) -> Config {
        if self.path.exists() {
            return self.load();
        }
        let cfg = Config::default();
        match self.save(&cfg) {
            Ok(()) => info!(path = %self.path.display(), "wrote default config"),
            Err(err) => warn!(path = %self.path.display(), %err, "could not write default config"),
        }
        cfg
    }

    fn try_load(&self) -> Result<Config> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice::<Config>(&bytes)?)
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match self.try_load() {
            Ok(cfg) => cfg,
            Err(Error::Io(err)) if err.kind() == io::ErrorKind::NotFound => Config::default(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "using default config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            tick_rate_ms: 50,
            stats_interval_ms: 500,
            live_wpm_min_secs: 3,
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "live_wpm_min_secs": 10 }"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.live_wpm_min_secs, 10);
        assert_eq!(cfg.tick_rate_ms, 100);
    }

    #[test]
    fn first_run_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("typometer").join("config.json");
        let store = FileConfigStore::with_path(&path);

        assert_eq!(store.load_or_init(), Config::default());
        assert!(path.exists());
        let written: Config = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(written, Config::default());
    }

    #[test]
    fn existing_config_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "tick_rate_ms": 40 }"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load_or_init();
        assert_eq!(cfg.tick_rate_ms, 40);
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{ "tick_rate_ms": 40 }"#);
    }

    #[test]
    fn engine_settings_from_config() {
        let settings = EngineSettings::from(&Config::default());
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn tick_rate_never_zero() {
        let cfg = Config {
            tick_rate_ms: 0,
            ..Config::default()
        };
        assert_eq!(cfg.tick_rate(), Duration::from_millis(1));
    }
}
