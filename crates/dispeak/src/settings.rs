//! Application settings and window-state documents.
//!
//! Both documents are plain JSON files. Reads never fail the caller: a missing
//! or unreadable file is reported as "no prior settings". Writes replace the
//! whole file through a temporary sibling so readers never observe a partial
//! document.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const DISPEAK_SECTION: &str = "dispeak";
const WINDOW_PERSIST_KEY: &str = "window";
const CLOSE_TO_QUIT_KEY: &str = "close";

#[derive(Debug, Error)]
pub enum SettingsReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SettingsReadError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsWriteError {
    #[error("failed to write settings ({kind}): {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(String),
}

impl SettingsWriteError {
    /// Stable identifier handed back to the presentation layer.
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::Io { kind, .. } => format!("{kind:?}"),
            Self::Serialize(_) => "InvalidData".to_string(),
        }
    }
}

impl From<std::io::Error> for SettingsWriteError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// The open-ended application settings object.
///
/// Only the `dispeak.window` and `dispeak.close` flags are interpreted here;
/// every other key is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppSettings(Map<String, Value>);

impl AppSettings {
    #[must_use]
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// `dispeak.window`: persist window geometry when the window closes.
    #[must_use]
    pub fn window_persist_enabled(&self) -> Option<bool> {
        self.dispeak_flag(WINDOW_PERSIST_KEY)
    }

    /// `dispeak.close`: the close button quits instead of hiding to the tray.
    #[must_use]
    pub fn close_to_quit(&self) -> Option<bool> {
        self.dispeak_flag(CLOSE_TO_QUIT_KEY)
    }

    fn dispeak_flag(&self, key: &str) -> Option<bool> {
        self.0.get(DISPEAK_SECTION)?.get(key)?.as_bool()
    }
}

impl From<Map<String, Value>> for AppSettings {
    fn from(values: Map<String, Value>) -> Self {
        Self(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Last known window geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub maximized: bool,
    #[serde(default)]
    pub minimized: bool,
}

/// Read a JSON object document from `path`.
///
/// # Errors
/// Returns an error when the file cannot be read or is not a JSON object of
/// the expected shape.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, SettingsReadError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let object: Map<String, Value> =
        serde_json::from_str(&content).map_err(|source| SettingsReadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_value(Value::Object(object)).map_err(|source| SettingsReadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `document` to `path` as pretty-printed JSON, replacing any previous
/// content.
///
/// # Errors
/// Returns an error when serialization fails or the file cannot be written.
pub fn save_document<T: Serialize>(path: &Path, document: &T) -> Result<(), SettingsWriteError> {
    let content = serde_json::to_string_pretty(document)
        .map_err(|error| SettingsWriteError::Serialize(error.to_string()))?;

    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|error| error.error)?;
    Ok(())
}

fn load_or_none<T: DeserializeOwned>(path: &Path, what: &str) -> Option<T> {
    match load_document(path) {
        Ok(document) => Some(document),
        Err(error) if error.is_not_found() => {
            debug!("No {what} at {}", path.display());
            None
        }
        Err(error) => {
            warn!("Ignoring {what}: {error}");
            None
        }
    }
}

/// Application settings file next to the installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` means "first run": the file is missing or unreadable.
    #[must_use]
    pub fn load(&self) -> Option<AppSettings> {
        load_or_none(&self.path, "application settings")
    }

    /// # Errors
    /// Returns the underlying write failure; the previous file is left intact.
    pub fn save(&self, settings: &AppSettings) -> Result<(), SettingsWriteError> {
        save_document(&self.path, settings)
    }
}

/// Per-user window geometry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowStateStore {
    path: PathBuf,
}

impl WindowStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn load(&self) -> Option<WindowState> {
        load_or_none(&self.path, "window state")
    }

    /// # Errors
    /// Returns the underlying write failure; the previous file is left intact.
    pub fn save(&self, state: &WindowState) -> Result<(), SettingsWriteError> {
        save_document(&self.path, state)
    }
}
