//! Test doubles for the host collaborators.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dispeak_core::{
    Browser, FetchError, Notice, NoticeResponse, Notifier, ReleaseFetcher, ReleaseMetadata,
};
use tokio::sync::mpsc;

use crate::dialogs::FilePicker;
use crate::session::{HostServices, HostTray};
use crate::settings::Bounds;
use crate::window::{DEFAULT_HEIGHT, DEFAULT_WIDTH, HostWindow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WindowCall {
    SetBounds(Bounds),
    SetSize(u32, u32),
    Center,
    Maximize,
    Unmaximize,
    Minimize,
    Show,
    Hide,
}

#[derive(Debug, Default)]
pub(crate) struct FakeWindow {
    pub(crate) bounds: Option<Bounds>,
    pub(crate) maximized: bool,
    pub(crate) minimized: bool,
    pub(crate) visible: bool,
    pub(crate) panic_on_minimize: bool,
    pub(crate) panic_on_show: bool,
    pub(crate) panic_on_hide: bool,
    pub(crate) calls: Vec<WindowCall>,
}

impl FakeWindow {
    pub(crate) fn at(bounds: Bounds) -> Self {
        Self {
            bounds: Some(bounds),
            visible: true,
            ..Self::default()
        }
    }
}

impl HostWindow for FakeWindow {
    fn bounds(&self) -> Bounds {
        self.bounds.unwrap_or(Bounds {
            x: 0,
            y: 0,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        })
    }

    fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = Some(bounds);
        self.calls.push(WindowCall::SetBounds(bounds));
    }

    fn set_size(&mut self, width: u32, height: u32) {
        let mut bounds = self.bounds();
        bounds.width = width;
        bounds.height = height;
        self.bounds = Some(bounds);
        self.calls.push(WindowCall::SetSize(width, height));
    }

    fn center(&mut self) {
        self.calls.push(WindowCall::Center);
    }

    fn is_maximized(&self) -> bool {
        self.maximized
    }

    fn is_minimized(&self) -> bool {
        self.minimized
    }

    fn maximize(&mut self) {
        self.maximized = true;
        self.calls.push(WindowCall::Maximize);
    }

    fn unmaximize(&mut self) {
        self.maximized = false;
        self.calls.push(WindowCall::Unmaximize);
    }

    fn minimize(&mut self) {
        assert!(!self.panic_on_minimize, "minimize on a destroyed window");
        self.minimized = true;
        self.calls.push(WindowCall::Minimize);
    }

    fn show(&mut self) {
        assert!(!self.panic_on_show, "show on a destroyed window");
        self.visible = true;
        self.calls.push(WindowCall::Show);
    }

    fn hide(&mut self) {
        assert!(!self.panic_on_hide, "hide on a destroyed window");
        self.visible = false;
        self.calls.push(WindowCall::Hide);
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeTray {
    pub(crate) tooltip: Option<String>,
}

impl HostTray for FakeTray {
    fn set_tooltip(&mut self, text: &str) {
        self.tooltip = Some(text.to_string());
    }
}

pub(crate) struct StaticFetcher(pub(crate) Result<ReleaseMetadata, FetchError>);

#[async_trait]
impl ReleaseFetcher for StaticFetcher {
    async fn fetch_latest(&self) -> Result<ReleaseMetadata, FetchError> {
        self.0.clone()
    }
}

pub(crate) struct PanickingFetcher;

#[async_trait]
impl ReleaseFetcher for PanickingFetcher {
    async fn fetch_latest(&self) -> Result<ReleaseMetadata, FetchError> {
        panic!("feed client torn down");
    }
}

/// Forwards every presented notice to a channel and answers prompts with
/// `response`.
pub(crate) struct ChannelNotifier {
    response: NoticeResponse,
    sender: mpsc::UnboundedSender<Notice>,
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn present(&self, notice: &Notice) -> NoticeResponse {
        let _ = self.sender.send(notice.clone());
        if notice.is_prompt() {
            self.response
        } else {
            NoticeResponse::Acknowledged
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingBrowser {
    pub(crate) opened: Mutex<Vec<String>>,
}

impl Browser for RecordingBrowser {
    fn open_url(&self, url: &str) -> std::io::Result<()> {
        self.opened
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(url.to_string());
        Ok(())
    }
}

pub(crate) struct FixedPicker(pub(crate) Option<PathBuf>);

impl FilePicker for FixedPicker {
    fn pick_executable(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

pub(crate) struct TestServices {
    pub(crate) services: HostServices,
    pub(crate) notices: mpsc::UnboundedReceiver<Notice>,
    pub(crate) browser: Arc<RecordingBrowser>,
}

pub(crate) fn release(tag: &str) -> ReleaseMetadata {
    ReleaseMetadata {
        tag: tag.to_string(),
        display_name: format!("DiSpeak {tag}"),
        release_page_url: format!("https://example.com/releases/{tag}"),
    }
}

pub(crate) fn services(
    fetched: Result<ReleaseMetadata, FetchError>,
    response: NoticeResponse,
    picked: Option<PathBuf>,
) -> TestServices {
    let (sender, notices) = mpsc::unbounded_channel();
    let browser = Arc::new(RecordingBrowser::default());
    TestServices {
        services: HostServices {
            fetcher: Arc::new(StaticFetcher(fetched)),
            notifier: Arc::new(ChannelNotifier { response, sender }),
            browser: browser.clone(),
            picker: Arc::new(FixedPicker(picked)),
        },
        notices,
        browser,
    }
}
