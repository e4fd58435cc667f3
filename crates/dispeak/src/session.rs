//! The application session: the single main window, the tray, the in-memory
//! settings, and the update checker, passed explicitly to every handler.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dispeak_core::{
    Browser, CheckOutcome, GitHubReleaseFetcher, Notice, Notifier, ReleaseFetcher, TriggerMode,
    UpdateChecker, UpdateConfig, VersionVector, build_http_client,
};
use dispeak_platform::AppPaths;
use log::{error, info, warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::dialogs::{FilePicker, NativeFilePicker, NativeNotifier, SystemBrowser};
use crate::error::AppError;
use crate::helper::launch_helper;
use crate::logging::init_logging;
use crate::settings::{AppSettings, SettingsStore, SettingsWriteError, WindowStateStore};
use crate::window::{
    CloseAction, DEFAULT_HEIGHT, DEFAULT_WIDTH, HostWindow, WindowStateController,
};

const APP_NAME: &str = "DiSpeak";
pub const WIKI_URL: &str = "https://github.com/micelle/dc_DiSpeak/wiki";

/// The tray icon as seen by the shell. Implemented by the GUI host.
pub trait HostTray {
    fn set_tooltip(&mut self, text: &str);
}

/// Actions offered by the tray and application menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    Show,
    RestoreDefaultSize,
    CheckForUpdate,
    OpenWiki,
    Quit,
}

/// External collaborators the session talks to.
#[derive(Clone)]
pub struct HostServices {
    pub fetcher: Arc<dyn ReleaseFetcher>,
    pub notifier: Arc<dyn Notifier>,
    pub browser: Arc<dyn Browser>,
    pub picker: Arc<dyn FilePicker>,
}

impl HostServices {
    /// GitHub release feed, native message boxes, and the system browser.
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be built.
    pub fn native(config: &UpdateConfig) -> Result<Self, AppError> {
        let client =
            build_http_client(config).map_err(|error| AppError::HttpClient(error.to_string()))?;
        Ok(Self {
            fetcher: Arc::new(GitHubReleaseFetcher::new(client, config)),
            notifier: Arc::new(NativeNotifier),
            browser: Arc::new(SystemBrowser),
            picker: Arc::new(NativeFilePicker),
        })
    }
}

pub struct AppSession<W, T> {
    paths: AppPaths,
    settings_store: SettingsStore,
    settings: Option<AppSettings>,
    window_state: WindowStateController,
    window: Option<W>,
    tray: Option<T>,
    services: HostServices,
    checker: UpdateChecker,
    runtime: Handle,
    quitting: bool,
}

impl<W: HostWindow, T: HostTray> AppSession<W, T> {
    /// Start the shell for this installation: resolve paths, install the
    /// logger, build the native services, and begin the startup update check.
    ///
    /// # Errors
    /// Returns an error when the paths cannot be resolved or created, the
    /// HTTP client cannot be built, or the running version is invalid.
    pub fn launch(config: &UpdateConfig, runtime: Handle) -> Result<Self, AppError> {
        let paths = AppPaths::new()?;
        let services = HostServices::native(config)?;
        Self::launch_with(paths, config, services, runtime, cfg!(debug_assertions))
    }

    /// [`AppSession::launch`] with explicit paths and services.
    ///
    /// # Errors
    /// Returns an error when the data directory cannot be created or the
    /// running version is invalid.
    pub fn launch_with(
        paths: AppPaths,
        config: &UpdateConfig,
        services: HostServices,
        runtime: Handle,
        debug_logging: bool,
    ) -> Result<Self, AppError> {
        paths.ensure_dirs().map_err(AppError::DataDir)?;
        init_logging(&paths, debug_logging);
        let session = Self::new(paths, config, services, runtime)?;
        drop(session.start_update_check());
        Ok(session)
    }

    /// Load both settings documents and prepare the update checker.
    ///
    /// # Errors
    /// Returns an error when `config.current_version` is not a valid version.
    pub fn new(
        paths: AppPaths,
        config: &UpdateConfig,
        services: HostServices,
        runtime: Handle,
    ) -> Result<Self, AppError> {
        let current = VersionVector::parse(&config.current_version)?;
        let settings_store = SettingsStore::new(paths.settings_file());
        let settings = settings_store.load();
        let window_state =
            WindowStateController::load(WindowStateStore::new(paths.window_state_file()));
        let checker = UpdateChecker::new(
            current,
            services.fetcher.clone(),
            services.notifier.clone(),
            services.browser.clone(),
        );

        info!(
            "Session started: version {current}, settings {}",
            if settings.is_some() { "loaded" } else { "absent" }
        );

        Ok(Self {
            paths,
            settings_store,
            settings,
            window_state,
            window: None,
            tray: None,
            services,
            checker,
            runtime,
            quitting: false,
        })
    }

    #[must_use]
    pub fn version(&self) -> VersionVector {
        self.checker.current_version()
    }

    #[must_use]
    pub fn app_directory(&self) -> &Path {
        &self.paths.install_dir
    }

    #[must_use]
    pub fn settings(&self) -> Option<&AppSettings> {
        self.settings.as_ref()
    }

    #[must_use]
    pub fn window(&self) -> Option<&W> {
        self.window.as_ref()
    }

    pub fn window_mut(&mut self) -> Option<&mut W> {
        self.window.as_mut()
    }

    #[must_use]
    pub fn tray(&self) -> Option<&T> {
        self.tray.as_ref()
    }

    #[must_use]
    pub fn window_state(&self) -> &WindowStateController {
        &self.window_state
    }

    /// Silent check run once at launch.
    pub fn start_update_check(&self) -> JoinHandle<Option<CheckOutcome>> {
        self.spawn_check(TriggerMode::Startup)
    }

    /// User-requested check. Repeated calls each run their own fetch.
    pub fn check_for_update(&self) -> JoinHandle<Option<CheckOutcome>> {
        self.spawn_check(TriggerMode::Manual)
    }

    /// Resolves to `None` when the check panicked; the panic is reported
    /// like any other unhandled error.
    fn spawn_check(&self, trigger: TriggerMode) -> JoinHandle<Option<CheckOutcome>> {
        let checker = self.checker.clone();
        let notifier = self.services.notifier.clone();
        let check = self.runtime.spawn(async move { checker.run(trigger).await });
        self.runtime.spawn(async move {
            match check.await {
                Ok(outcome) => Some(outcome),
                Err(join_error) => {
                    let failure = if join_error.is_panic() {
                        AppError::from_panic(join_error.into_panic().as_ref())
                    } else {
                        AppError::Unhandled(join_error.to_string())
                    };
                    present_unhandled(notifier.as_ref(), &failure).await;
                    None
                }
            }
        })
    }

    /// Run `handler`, reporting a panic instead of unwinding into the host.
    pub(crate) fn guarded<R>(
        &mut self,
        handler: impl FnOnce(&mut Self) -> R,
    ) -> Result<R, AppError> {
        panic::catch_unwind(AssertUnwindSafe(|| handler(self))).map_err(|payload| {
            let failure = AppError::from_panic(payload.as_ref());
            self.report_unhandled(&failure);
            failure
        })
    }

    /// Take ownership of the freshly created main window and restore its
    /// stored geometry.
    pub fn attach_window(&mut self, mut window: W) {
        self.window_state.apply_on_create(&mut window);
        self.window = Some(window);
    }

    pub fn attach_tray(&mut self, mut tray: T) {
        tray.set_tooltip(&format!("{APP_NAME} v{}", self.version()));
        self.tray = Some(tray);
    }

    /// Replace the in-memory settings and persist them.
    ///
    /// The in-memory copy is updated even when writing fails, so the close
    /// handler sees what the user chose.
    ///
    /// # Errors
    /// Returns the write failure.
    pub fn write_settings(&mut self, settings: AppSettings) -> Result<(), SettingsWriteError> {
        let result = self.settings_store.save(&settings);
        if let Err(error) = &result {
            warn!("Failed to save settings: {error}");
        }
        self.settings = Some(settings);
        result
    }

    /// The window manager asked to close the window. Without
    /// `dispeak.window` the window is hidden instead. Once [`quit`] has run,
    /// the close that follows it is passed through without a second capture.
    ///
    /// [`quit`]: AppSession::quit
    pub fn on_close_requested(&mut self) -> CloseAction {
        if self.quitting {
            return CloseAction::Quit;
        }
        self.guarded(Self::close_window).unwrap_or(CloseAction::Hide)
    }

    fn close_window(&mut self) -> CloseAction {
        let Some(window) = self.window.as_mut() else {
            return CloseAction::Quit;
        };
        let action = self
            .window_state
            .capture_on_close(&*window, self.settings.as_ref())
            .action();
        if action == CloseAction::Hide {
            window.hide();
        }
        action
    }

    /// The in-window close button: quits when `dispeak.close` is set,
    /// otherwise hides to the tray.
    pub fn request_close(&mut self) -> CloseAction {
        let quit = self
            .settings
            .as_ref()
            .and_then(AppSettings::close_to_quit)
            .unwrap_or(false);
        if quit {
            self.quit()
        } else {
            if let Some(window) = self.window.as_mut() {
                window.hide();
            }
            CloseAction::Hide
        }
    }

    /// Quit the application, capturing window geometry first when enabled.
    /// A failed capture is reported but does not cancel the quit.
    pub fn quit(&mut self) -> CloseAction {
        if self.quitting {
            return CloseAction::Quit;
        }
        let _ = self.guarded(|session| {
            if let Some(window) = session.window.as_ref() {
                let _ = session
                    .window_state
                    .capture_on_close(window, session.settings.as_ref());
            }
        });
        self.quitting = true;
        info!("Quitting");
        CloseAction::Quit
    }

    #[must_use]
    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    pub fn minimize(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.minimize();
        }
    }

    pub fn toggle_maximize(&mut self) {
        if let Some(window) = self.window.as_mut() {
            if window.is_maximized() {
                window.unmaximize();
            } else {
                window.maximize();
            }
        }
    }

    pub fn show_window(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.show();
        }
    }

    pub fn restore_default_size(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.set_size(DEFAULT_WIDTH, DEFAULT_HEIGHT);
            window.center();
        }
    }

    /// Links followed inside the window open in the default browser.
    pub fn open_external(&self, url: &str) {
        if let Err(error) = self.services.browser.open_url(url) {
            warn!("Failed to open {url}: {error}");
        }
    }

    #[must_use]
    pub fn pick_helper(&self) -> Option<PathBuf> {
        self.services.picker.pick_executable()
    }

    /// Whether the helper process was started.
    #[must_use]
    pub fn launch_helper(&self, path: &Path) -> bool {
        match launch_helper(&self.runtime, path) {
            Ok(_) => true,
            Err(error) => {
                warn!("{error}");
                false
            }
        }
    }

    /// Returns `Some(CloseAction::Quit)` when the host should exit.
    pub fn handle_tray_action(&mut self, action: TrayAction) -> Option<CloseAction> {
        self.guarded(|session| session.run_tray_action(action))
            .ok()
            .flatten()
    }

    fn run_tray_action(&mut self, action: TrayAction) -> Option<CloseAction> {
        match action {
            TrayAction::Show => self.show_window(),
            TrayAction::RestoreDefaultSize => self.restore_default_size(),
            TrayAction::CheckForUpdate => {
                drop(self.check_for_update());
            }
            TrayAction::OpenWiki => self.open_external(WIKI_URL),
            TrayAction::Quit => return Some(self.quit()),
        }
        None
    }

    /// Show an otherwise unhandled failure without ending the session.
    pub fn report_unhandled(&self, failure: &AppError) {
        let notifier = self.services.notifier.clone();
        let failure = AppError::Unhandled(failure.to_string());
        self.runtime.spawn(async move {
            present_unhandled(notifier.as_ref(), &failure).await;
        });
    }
}

async fn present_unhandled(notifier: &dyn Notifier, failure: &AppError) {
    error!("Unhandled error: {failure}");
    let notice = Notice::UnexpectedError {
        details: failure.to_string(),
    };
    notifier.present(&notice).await;
}
