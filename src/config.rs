//! Application paths and calendar settings.
//!
//! Directory resolution priority:
//! 1. CLI `--config-dir` / `--data-dir`
//! 2. `DAYGRID_CONFIG_DIR` / `DAYGRID_DATA_DIR` environment variables
//! 3. Local folder IF any daygrid files exist there
//! 4. Platform directories from dirs-next
//!
//! Platform paths:
//! - Linux: ~/.config/daygrid, ~/.local/share/daygrid
//! - macOS: ~/Library/Application Support/daygrid
//! - Windows: %APPDATA%\daygrid

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file name inside the config directory.
pub const CONFIG_FILE: &str = "daygrid.json";

/// Overrides for the default application directories
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
    /// Custom data directory holding the JSON store (from CLI or ENV)
    pub data_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV vars → None (use defaults)
    pub fn from_env_and_cli(cli_config_dir: Option<PathBuf>, cli_data_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_config_dir.or_else(|| std::env::var("DAYGRID_CONFIG_DIR").ok().map(PathBuf::from));
        let data_dir = cli_data_dir.or_else(|| std::env::var("DAYGRID_DATA_DIR").ok().map(PathBuf::from));

        Self { config_dir, data_dir }
    }
}

/// Path to a configuration file
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

/// Path to a data file (store files, logs)
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    get_data_dir(config).join(name)
}

/// Directory holding the JSON store
pub fn data_dir(config: &PathConfig) -> PathBuf {
    get_data_dir(config)
}

/// Create config and data directories if missing
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = get_config_dir(config);
    let data_dir = get_data_dir(config);

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    }

    if data_dir != config_dir && !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }

    Ok(())
}

fn has_local_files(dir: &Path) -> bool {
    let files = [CONFIG_FILE, "tasks.json", "meta.json", "daygrid.log"];
    files.iter().any(|f| dir.join(f).exists())
}

fn get_config_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if has_local_files(&current_dir) {
            return current_dir;
        }
    }

    if let Some(dir) = dirs_next::config_dir() {
        return dir.join("daygrid");
    }

    PathBuf::from(".")
}

fn get_data_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.data_dir {
        return dir.clone();
    }
    // A custom config dir doubles as the data dir
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if has_local_files(&current_dir) {
            return current_dir;
        }
    }

    if let Some(dir) = dirs_next::data_dir() {
        return dir.join("daygrid");
    }

    PathBuf::from(".")
}

/// Calendar geometry and scheduling rules.
///
/// Persisted as `daygrid.json`; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Pixel height of one hour row
    pub hour_height: f32,
    /// Pixel height of a day column header
    pub header_height: f32,
    /// Snap granularity in minutes, must divide 60
    pub snap_minutes: u32,
    /// Minimum task duration before a timed drop is allowed
    pub task_min_duration_secs: i64,
    /// Minimum work session duration before creation is allowed
    pub work_session_min_duration_secs: i64,
    /// Click-vs-drag distance in pixels
    pub drag_threshold: f32,
    /// IANA zone used for every day boundary
    pub timezone: String,
    /// REST server port
    pub server_port: u16,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            hour_height: 100.0,
            header_height: 40.0,
            snap_minutes: 15,
            task_min_duration_secs: 15 * 60,
            work_session_min_duration_secs: 15 * 60,
            drag_threshold: 5.0,
            timezone: "UTC".to_string(),
            server_port: 8737,
        }
    }
}

impl CalendarConfig {
    /// Load from `path`, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&raw).with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config.sanitized())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw).with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Replace values the engine cannot work with by their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.snap_minutes == 0 || 60 % self.snap_minutes != 0 {
            log::warn!("snap_minutes={} does not divide 60, using {}", self.snap_minutes, defaults.snap_minutes);
            self.snap_minutes = defaults.snap_minutes;
        }
        if !(self.hour_height > 0.0) {
            log::warn!("hour_height={} is not positive, using {}", self.hour_height, defaults.hour_height);
            self.hour_height = defaults.hour_height;
        }
        if self.drag_threshold < 0.0 {
            self.drag_threshold = defaults.drag_threshold;
        }
        self
    }

    /// Pixel height of the full 24 hour content area.
    pub fn content_height(&self) -> f32 {
        self.hour_height * 24.0
    }
}
