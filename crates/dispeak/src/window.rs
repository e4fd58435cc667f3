//! Window geometry restore at creation and capture at close.

use log::{info, warn};

use crate::settings::{AppSettings, Bounds, SettingsWriteError, WindowState, WindowStateStore};

pub const DEFAULT_WIDTH: u32 = 940;
pub const DEFAULT_HEIGHT: u32 = 500;

/// The main window as seen by the shell. Implemented by the GUI host.
pub trait HostWindow {
    fn bounds(&self) -> Bounds;
    fn set_bounds(&mut self, bounds: Bounds);
    fn set_size(&mut self, width: u32, height: u32);
    fn center(&mut self);
    fn is_maximized(&self) -> bool;
    fn is_minimized(&self) -> bool;
    fn maximize(&mut self);
    fn unmaximize(&mut self);
    fn minimize(&mut self);
    fn show(&mut self);
    fn hide(&mut self);
}

/// What the host does with the window after a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseAction {
    Hide,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Persistence is disabled; stored geometry is left untouched.
    Skipped,
    Captured {
        state: WindowState,
        saved: Result<(), SettingsWriteError>,
    },
}

impl CloseOutcome {
    #[must_use]
    pub fn action(&self) -> CloseAction {
        match self {
            Self::Skipped => CloseAction::Hide,
            Self::Captured { .. } => CloseAction::Quit,
        }
    }
}

/// Owns the window-state document between startup and close.
#[derive(Debug)]
pub struct WindowStateController {
    store: WindowStateStore,
    stored: Option<WindowState>,
}

impl WindowStateController {
    /// Load the stored geometry once; it stays read-only until a capture.
    #[must_use]
    pub fn load(store: WindowStateStore) -> Self {
        let stored = store.load();
        Self { store, stored }
    }

    #[must_use]
    pub fn stored(&self) -> Option<&WindowState> {
        self.stored.as_ref()
    }

    pub fn apply_on_create<W: HostWindow + ?Sized>(&self, window: &mut W) {
        if let Some(state) = &self.stored {
            apply(window, state);
        }
    }

    /// Capture and persist the window geometry if `dispeak.window` is set.
    pub fn capture_on_close<W: HostWindow + ?Sized>(
        &mut self,
        window: &W,
        settings: Option<&AppSettings>,
    ) -> CloseOutcome {
        let enabled = settings.and_then(AppSettings::window_persist_enabled);
        if enabled != Some(true) {
            info!("Window state persistence disabled ({enabled:?}), skipping capture");
            return CloseOutcome::Skipped;
        }

        let state = capture(window, self.stored.as_ref());
        let saved = self.store.save(&state);
        match &saved {
            Ok(()) => {
                info!("Saved window state to {}", self.store.path().display());
                self.stored = Some(state);
            }
            Err(error) => warn!("Failed to save window state: {error}"),
        }
        CloseOutcome::Captured { state, saved }
    }
}

/// Apply each part of `state` independently; the host decides precedence
/// between explicit bounds and maximize.
pub fn apply<W: HostWindow + ?Sized>(window: &mut W, state: &WindowState) {
    if let Some(bounds) = state.bounds {
        window.set_bounds(bounds);
    }
    if state.maximized {
        window.maximize();
    }
    if state.minimized {
        window.minimize();
    }
}

/// Snapshot the window. A maximized window reports screen-sized bounds, so
/// the previously stored bounds are kept instead.
#[must_use]
pub fn capture<W: HostWindow + ?Sized>(window: &W, prior: Option<&WindowState>) -> WindowState {
    let maximized = window.is_maximized();
    let bounds = if maximized {
        prior.and_then(|state| state.bounds)
    } else {
        Some(window.bounds())
    };
    WindowState {
        bounds,
        maximized,
        minimized: window.is_minimized(),
    }
}
