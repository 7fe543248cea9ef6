use chrono::{DateTime, Local};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "sketchtimer")
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("sketchtimer_config.json"))
    }

    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("sketchtimer"),
            )
        } else {
            ProjectDirs::from("", "", "sketchtimer")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("sketchtimer.log"))
    }

    pub fn export_file_name(at: DateTime<Local>) -> String {
        format!("records-{}.csv", at.format("%Y%m%d-%H%M%S"))
    }
}
