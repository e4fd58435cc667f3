use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR_NAME: &str = "DiSpeak";
const SETTING_FILE_NAME: &str = "setting.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppPathsError {
    #[error("Could not determine the running executable's directory")]
    InstallDirUnavailable,
    #[error("Could not determine data directory")]
    DataDirUnavailable,
}

/// Fixed on-disk locations used by the application shell.
///
/// The application settings live next to the installation so that portable
/// copies carry their configuration along; window geometry is per user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub install_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Build application paths for the current platform.
    ///
    /// # Errors
    /// Returns an error when the executable location or the per-user data
    /// directory cannot be determined.
    pub fn new() -> Result<Self, AppPathsError> {
        let exe = std::env::current_exe().map_err(|_| AppPathsError::InstallDirUnavailable)?;
        let install_dir = exe
            .parent()
            .map(Path::to_path_buf)
            .ok_or(AppPathsError::InstallDirUnavailable)?;

        #[cfg(target_os = "macos")]
        let data_dir = dirs::home_dir()
            .ok_or(AppPathsError::DataDirUnavailable)?
            .join("Library/Application Support")
            .join(APP_DIR_NAME);

        #[cfg(not(target_os = "macos"))]
        let data_dir = dirs::data_dir()
            .ok_or(AppPathsError::DataDirUnavailable)?
            .join(APP_DIR_NAME);

        Ok(Self::with_roots(install_dir, data_dir))
    }

    #[must_use]
    pub fn with_roots(install_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Application settings document, shared by every user of this install.
    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.install_dir.join(SETTING_FILE_NAME)
    }

    /// Window geometry document for the current user.
    #[must_use]
    pub fn window_state_file(&self) -> PathBuf {
        self.data_dir.join(SETTING_FILE_NAME)
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("debug.log")
    }

    /// Ensure the per-user data directory exists on disk.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}
