//! Native implementations of the host collaborators: message boxes, the
//! default browser, and the executable picker.

use std::path::PathBuf;

use dispeak_core::{Browser, Notice, NoticeResponse, Notifier};
use rfd::{MessageButtons, MessageDialogResult, MessageLevel};

/// Chooses an executable for the speech helper.
pub trait FilePicker: Send + Sync {
    /// `None` when the user cancels.
    fn pick_executable(&self) -> Option<PathBuf>;
}

fn level_for(notice: &Notice) -> MessageLevel {
    match notice {
        Notice::UpdateAvailable { .. } => MessageLevel::Warning,
        Notice::UpToDate { .. } => MessageLevel::Info,
        Notice::CheckFailed { .. } | Notice::UnexpectedError { .. } => MessageLevel::Error,
    }
}

pub struct NativeNotifier;

#[async_trait::async_trait]
impl Notifier for NativeNotifier {
    async fn present(&self, notice: &Notice) -> NoticeResponse {
        let buttons = if notice.is_prompt() {
            MessageButtons::YesNo
        } else {
            MessageButtons::Ok
        };
        let result = rfd::AsyncMessageDialog::new()
            .set_level(level_for(notice))
            .set_title(notice.title())
            .set_description(format!("{}\n\n{}", notice.message(), notice.detail()))
            .set_buttons(buttons)
            .show()
            .await;

        match (notice.is_prompt(), result) {
            (true, MessageDialogResult::Yes) => NoticeResponse::Accepted,
            (true, _) => NoticeResponse::Declined,
            (false, _) => NoticeResponse::Acknowledged,
        }
    }
}

pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open_url(&self, url: &str) -> std::io::Result<()> {
        open::that(url)
    }
}

pub struct NativeFilePicker;

impl FilePicker for NativeFilePicker {
    fn pick_executable(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Select")
            .add_filter("EXE File", &["exe"])
            .set_directory(".")
            .pick_file()
    }
}
