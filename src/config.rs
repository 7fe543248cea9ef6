use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::items::{LoadOptions, DEFAULT_EXTENSIONS};
use crate::tracker::{ClearFilesPolicy, RunState, SessionClock};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tick_ms: u64,
    pub start_running: bool,
    pub session_clock: SessionClock,
    pub clear_files: ClearFilesPolicy,
    pub recursive: bool,
    pub shuffle: bool,
    pub extensions: Vec<String>,
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            start_running: true,
            session_clock: SessionClock::WallClock,
            clear_files: ClearFilesPolicy::FullReset,
            recursive: false,
            shuffle: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            export_dir: None,
        }
    }
}

impl Config {
    pub fn initial_run_state(&self) -> RunState {
        if self.start_running {
            RunState::Running
        } else {
            RunState::Paused
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            recursive: self.recursive,
            shuffle: self.shuffle,
            extensions: self.extensions.clone(),
        }
    }

    pub fn export_dir(&self) -> Option<PathBuf> {
        self.export_dir.clone().or_else(AppDirs::state_dir)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
