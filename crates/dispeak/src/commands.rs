//! Request/response commands sent by the presentation layer.

use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::session::{AppSession, HostTray};
use crate::settings::AppSettings;
use crate::window::{CloseAction, HostWindow};

/// An inbound command, encoded as `{"channel": ..., "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "channel", content = "payload")]
pub enum Command {
    #[serde(rename = "setting-file-read")]
    ReadSettings,
    #[serde(rename = "setting-file-write")]
    WriteSettings(AppSettings),
    #[serde(rename = "version-update-check")]
    CheckForUpdate,
    #[serde(rename = "bouyomi-dir-dialog")]
    PickHelper,
    #[serde(rename = "bouyomi-exe-start")]
    LaunchHelper(PathBuf),
    #[serde(rename = "now-version-check")]
    CurrentVersion,
    #[serde(rename = "directory-app-check")]
    AppDirectory,
    #[serde(rename = "window-minimize")]
    MinimizeWindow,
    #[serde(rename = "window-maximize")]
    ToggleMaximizeWindow,
    #[serde(rename = "window-close")]
    CloseWindow,
}

/// The synchronous answer to a [`Command`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    None,
    Settings(Option<AppSettings>),
    Flag(bool),
    ErrorCode(String),
    Path(Option<PathBuf>),
    Text(String),
    Close(CloseAction),
    Failed { error: String },
}

impl<W: HostWindow, T: HostTray> AppSession<W, T> {
    /// Answer one command. A panic while handling it is reported to the
    /// user and turned into [`Response::Failed`]; the session stays usable.
    pub fn dispatch(&mut self, command: Command) -> Response {
        debug!("Command: {command:?}");
        match self.guarded(|session| session.handle_command(command)) {
            Ok(response) => response,
            Err(failure) => Response::Failed {
                error: failure.to_string(),
            },
        }
    }

    /// Decode and answer a JSON-encoded command.
    pub fn dispatch_json(&mut self, raw: &str) -> Response {
        match serde_json::from_str::<Command>(raw) {
            Ok(command) => self.dispatch(command),
            Err(error) => {
                let failure = AppError::Unhandled(format!("malformed command: {error}"));
                self.report_unhandled(&failure);
                Response::Failed {
                    error: failure.to_string(),
                }
            }
        }
    }

    fn handle_command(&mut self, command: Command) -> Response {
        match command {
            Command::ReadSettings => Response::Settings(self.settings().cloned()),
            Command::WriteSettings(settings) => match self.write_settings(settings) {
                Ok(()) => Response::Flag(true),
                Err(error) => Response::ErrorCode(error.code()),
            },
            Command::CheckForUpdate => {
                drop(self.check_for_update());
                Response::None
            }
            Command::PickHelper => Response::Path(self.pick_helper()),
            Command::LaunchHelper(path) => Response::Flag(self.launch_helper(&path)),
            Command::CurrentVersion => Response::Text(self.version().to_string()),
            Command::AppDirectory => {
                Response::Text(self.app_directory().to_string_lossy().into_owned())
            }
            Command::MinimizeWindow => {
                self.minimize();
                Response::None
            }
            Command::ToggleMaximizeWindow => {
                self.toggle_maximize();
                Response::None
            }
            Command::CloseWindow => Response::Close(self.request_close()),
        }
    }
}
