//! Application shell for DiSpeak.
//!
//! The GUI host owns the event loop and implements [`HostWindow`] and
//! [`HostTray`]; everything it needs to decide lives in [`AppSession`]:
//! update checks, settings and window-state persistence, and the commands
//! sent by the presentation layer.

pub mod commands;
pub mod dialogs;
pub mod error;
pub mod helper;
pub mod logging;
pub mod session;
pub mod settings;
pub mod window;

#[cfg(test)]
mod testing;

pub use commands::{Command, Response};
pub use error::AppError;
pub use session::{AppSession, HostServices, HostTray, TrayAction};
pub use settings::{AppSettings, Bounds, SettingsStore, WindowState, WindowStateStore};
pub use window::{CloseAction, CloseOutcome, HostWindow, WindowStateController};
