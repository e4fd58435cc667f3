use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use thiserror::Error;

use crate::release::{FetchError, ReleaseFetcher, ReleaseMetadata};
use crate::version::{MalformedVersionError, VersionVector, is_newer};

/// How an update check was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Automatic check at process launch; only an available update is shown.
    Startup,
    /// Explicit user request; every outcome is shown.
    Manual,
}

impl TriggerMode {
    #[must_use]
    pub fn is_user_initiated(self) -> bool {
        matches!(self, Self::Manual)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("release tag {tag:?} is not a version: {source}")]
    MalformedTag {
        tag: String,
        #[source]
        source: MalformedVersionError,
    },
}

/// Something the host should present to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    UpdateAvailable {
        title: String,
        current: VersionVector,
        latest: VersionVector,
        release_page_url: String,
    },
    UpToDate {
        title: String,
        current: VersionVector,
        latest: VersionVector,
    },
    CheckFailed {
        error: UpdateError,
    },
    /// A failure outside the update workflow that was caught before it could
    /// take the process down.
    UnexpectedError {
        details: String,
    },
}

impl Notice {
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::UpdateAvailable { title, .. } | Self::UpToDate { title, .. } => title,
            Self::CheckFailed { .. } => "Error",
            Self::UnexpectedError { .. } => "An error occurred",
        }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::UpdateAvailable { .. } => "A new version is available",
            Self::UpToDate { .. } => "You are up to date",
            Self::CheckFailed { .. } => "Failed to get the latest version.",
            Self::UnexpectedError { .. } => "Unknown error",
        }
    }

    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::UpdateAvailable {
                current, latest, ..
            } => format!(
                "Your version is out of date. Open the download page?\n\n\
                 Current version: {current}\nLatest version: {latest}"
            ),
            Self::UpToDate {
                current, latest, ..
            } => format!(
                "You are using the latest version. Thank you!\n\n\
                 Current version: {current}\nLatest version: {latest}"
            ),
            Self::CheckFailed { .. } => "Please wait a while and try again.".to_string(),
            Self::UnexpectedError { details } => format!("Details:\n{details}"),
        }
    }

    /// Whether the notice asks the user to choose between accept and decline.
    #[must_use]
    pub fn is_prompt(&self) -> bool {
        matches!(self, Self::UpdateAvailable { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeResponse {
    Accepted,
    Declined,
    Acknowledged,
}

/// Presents notices, typically as modal message boxes.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn present(&self, notice: &Notice) -> NoticeResponse;
}

/// Opens URLs in the user's default browser.
pub trait Browser: Send + Sync {
    /// # Errors
    /// Returns an error when no browser could be launched.
    fn open_url(&self, url: &str) -> std::io::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckState {
    Idle,
    Fetching,
    Succeeded(ReleaseMetadata),
    Failed(UpdateError),
}

/// Terminal result of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    UpdateAvailable { latest: VersionVector, accepted: bool },
    UpToDate { latest: VersionVector },
    Failed(UpdateError),
}

/// Runs fetch, compare and notify for one check at a time.
///
/// Clones share collaborators; concurrent checks do not share any state.
#[derive(Clone)]
pub struct UpdateChecker {
    current: VersionVector,
    fetcher: Arc<dyn ReleaseFetcher>,
    notifier: Arc<dyn Notifier>,
    browser: Arc<dyn Browser>,
}

impl UpdateChecker {
    #[must_use]
    pub fn new(
        current: VersionVector,
        fetcher: Arc<dyn ReleaseFetcher>,
        notifier: Arc<dyn Notifier>,
        browser: Arc<dyn Browser>,
    ) -> Self {
        Self {
            current,
            fetcher,
            notifier,
            browser,
        }
    }

    #[must_use]
    pub fn current_version(&self) -> VersionVector {
        self.current
    }

    /// Run one check to completion. Never fails; failures are reported
    /// through the returned outcome and, for manual checks, a notice.
    pub async fn run(&self, trigger: TriggerMode) -> CheckOutcome {
        let mut state = CheckState::Idle;
        debug!("Update check ({trigger:?}): {state:?}");

        state = CheckState::Fetching;
        debug!("Update check ({trigger:?}): {state:?}");
        state = match self.fetcher.fetch_latest().await {
            Ok(release) => CheckState::Succeeded(release),
            Err(error) => CheckState::Failed(UpdateError::Fetch(error)),
        };

        let (outcome, notice) = self.evaluate(state, trigger);

        let Some(notice) = notice else {
            return outcome;
        };

        let response = self.notifier.present(&notice).await;
        if let Notice::UpdateAvailable {
            release_page_url, ..
        } = &notice
        {
            if response == NoticeResponse::Accepted {
                info!("Opening release page {release_page_url}");
                if let Err(error) = self.browser.open_url(release_page_url) {
                    warn!("Failed to open release page: {error}");
                }
            }
            if let CheckOutcome::UpdateAvailable { latest, .. } = outcome {
                return CheckOutcome::UpdateAvailable {
                    latest,
                    accepted: response == NoticeResponse::Accepted,
                };
            }
        }
        outcome
    }

    /// Decide the outcome and the notice to show, if any, for a finished
    /// fetch.
    #[must_use]
    pub fn evaluate(
        &self,
        state: CheckState,
        trigger: TriggerMode,
    ) -> (CheckOutcome, Option<Notice>) {
        let release = match state {
            CheckState::Succeeded(release) => release,
            CheckState::Failed(error) => return Self::failed(error, trigger),
            CheckState::Idle | CheckState::Fetching => {
                return Self::failed(
                    UpdateError::Fetch(FetchError::Transport("check did not complete".to_string())),
                    trigger,
                );
            }
        };

        let latest = match VersionVector::parse_tag(&release.tag) {
            Ok(latest) => latest,
            Err(source) => {
                return Self::failed(
                    UpdateError::MalformedTag {
                        tag: release.tag,
                        source,
                    },
                    trigger,
                );
            }
        };

        if is_newer(self.current, latest) {
            info!("Update available: {} -> {latest}", self.current);
            let notice = Notice::UpdateAvailable {
                title: release.display_name,
                current: self.current,
                latest,
                release_page_url: release.release_page_url,
            };
            return (
                CheckOutcome::UpdateAvailable {
                    latest,
                    accepted: false,
                },
                Some(notice),
            );
        }

        debug!("Up to date: current {} latest {latest}", self.current);
        let notice = trigger.is_user_initiated().then(|| Notice::UpToDate {
            title: release.display_name,
            current: self.current,
            latest,
        });
        (CheckOutcome::UpToDate { latest }, notice)
    }

    fn failed(error: UpdateError, trigger: TriggerMode) -> (CheckOutcome, Option<Notice>) {
        if trigger.is_user_initiated() {
            warn!("Update check failed: {error}");
        } else {
            debug!("Startup update check failed: {error}");
        }
        let notice = trigger.is_user_initiated().then(|| Notice::CheckFailed {
            error: error.clone(),
        });
        (CheckOutcome::Failed(error), notice)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct StaticFetcher(Result<ReleaseMetadata, FetchError>);

    #[async_trait]
    impl ReleaseFetcher for StaticFetcher {
        async fn fetch_latest(&self) -> Result<ReleaseMetadata, FetchError> {
            self.0.clone()
        }
    }

    struct RecordingNotifier {
        response: NoticeResponse,
        seen: Mutex<Vec<Notice>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn present(&self, notice: &Notice) -> NoticeResponse {
            self.seen
                .lock()
                .expect("notifier lock should not be poisoned")
                .push(notice.clone());
            if notice.is_prompt() {
                self.response
            } else {
                NoticeResponse::Acknowledged
            }
        }
    }

    #[derive(Default)]
    struct RecordingBrowser {
        opened: Mutex<Vec<String>>,
    }

    impl Browser for RecordingBrowser {
        fn open_url(&self, url: &str) -> std::io::Result<()> {
            self.opened
                .lock()
                .expect("browser lock should not be poisoned")
                .push(url.to_string());
            Ok(())
        }
    }

    struct Harness {
        checker: UpdateChecker,
        notifier: Arc<RecordingNotifier>,
        browser: Arc<RecordingBrowser>,
    }

    impl Harness {
        fn notices(&self) -> Vec<Notice> {
            self.notifier
                .seen
                .lock()
                .expect("notifier lock should not be poisoned")
                .clone()
        }

        fn opened(&self) -> Vec<String> {
            self.browser
                .opened
                .lock()
                .expect("browser lock should not be poisoned")
                .clone()
        }
    }

    fn release(tag: &str) -> ReleaseMetadata {
        ReleaseMetadata {
            tag: tag.to_string(),
            display_name: format!("DiSpeak {tag}"),
            release_page_url: format!("https://example.com/releases/{tag}"),
        }
    }

    fn harness(
        current: &str,
        fetched: Result<ReleaseMetadata, FetchError>,
        response: NoticeResponse,
    ) -> Harness {
        let notifier = Arc::new(RecordingNotifier {
            response,
            seen: Mutex::new(Vec::new()),
        });
        let browser = Arc::new(RecordingBrowser::default());
        let checker = UpdateChecker::new(
            VersionVector::parse(current).expect("current version should parse"),
            Arc::new(StaticFetcher(fetched)),
            notifier.clone(),
            browser.clone(),
        );
        Harness {
            checker,
            notifier,
            browser,
        }
    }

    #[tokio::test]
    async fn newer_release_prompts_and_opens_page_on_accept() {
        let h = harness("2.3.0", Ok(release("v2.3.1")), NoticeResponse::Accepted);

        let outcome = h.checker.run(TriggerMode::Startup).await;

        assert_eq!(
            outcome,
            CheckOutcome::UpdateAvailable {
                latest: VersionVector::new(2, 3, 1),
                accepted: true,
            }
        );
        let notices = h.notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_prompt());
        let detail = notices[0].detail();
        assert!(detail.contains("2.3.0"));
        assert!(detail.contains("2.3.1"));
        assert_eq!(notices[0].title(), "DiSpeak v2.3.1");
        assert_eq!(h.opened(), vec!["https://example.com/releases/v2.3.1"]);
    }

    #[tokio::test]
    async fn declined_update_does_not_open_browser() {
        let h = harness("2.3.0", Ok(release("v3.0.0")), NoticeResponse::Declined);

        let outcome = h.checker.run(TriggerMode::Manual).await;

        assert_eq!(
            outcome,
            CheckOutcome::UpdateAvailable {
                latest: VersionVector::new(3, 0, 0),
                accepted: false,
            }
        );
        assert!(h.opened().is_empty());
    }

    #[tokio::test]
    async fn same_version_manual_check_reports_up_to_date() {
        let h = harness("2.3.0", Ok(release("v2.3.0")), NoticeResponse::Accepted);

        let outcome = h.checker.run(TriggerMode::Manual).await;

        assert_eq!(
            outcome,
            CheckOutcome::UpToDate {
                latest: VersionVector::new(2, 3, 0),
            }
        );
        let notices = h.notices();
        assert_eq!(notices.len(), 1);
        assert!(matches!(notices[0], Notice::UpToDate { .. }));
        assert!(h.opened().is_empty());
    }

    #[tokio::test]
    async fn same_version_startup_check_is_silent() {
        let h = harness("2.3.0", Ok(release("v2.3.0")), NoticeResponse::Accepted);

        let outcome = h.checker.run(TriggerMode::Startup).await;

        assert!(matches!(outcome, CheckOutcome::UpToDate { .. }));
        assert!(h.notices().is_empty());
    }

    #[tokio::test]
    async fn older_release_is_not_offered() {
        let h = harness("2.3.0", Ok(release("v2.2.9")), NoticeResponse::Accepted);

        let outcome = h.checker.run(TriggerMode::Startup).await;

        assert!(matches!(outcome, CheckOutcome::UpToDate { .. }));
        assert!(h.notices().is_empty());
    }

    #[tokio::test]
    async fn rate_limited_manual_check_shows_error_not_up_to_date() {
        let error = FetchError::Payload("API rate limit exceeded".to_string());
        let h = harness("2.3.0", Err(error.clone()), NoticeResponse::Accepted);

        let outcome = h.checker.run(TriggerMode::Manual).await;

        assert_eq!(outcome, CheckOutcome::Failed(UpdateError::Fetch(error)));
        let notices = h.notices();
        assert_eq!(notices.len(), 1);
        assert!(matches!(notices[0], Notice::CheckFailed { .. }));
        assert_eq!(notices[0].title(), "Error");
    }

    #[tokio::test]
    async fn rate_limited_startup_check_is_silent() {
        let h = harness(
            "2.3.0",
            Err(FetchError::Payload("API rate limit exceeded".to_string())),
            NoticeResponse::Accepted,
        );

        let outcome = h.checker.run(TriggerMode::Startup).await;

        assert!(matches!(outcome, CheckOutcome::Failed(_)));
        assert!(h.notices().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_visibility_follows_trigger() {
        let error = FetchError::Transport("connection refused".to_string());

        let silent = harness("2.3.0", Err(error.clone()), NoticeResponse::Accepted);
        silent.checker.run(TriggerMode::Startup).await;
        assert!(silent.notices().is_empty());

        let manual = harness("2.3.0", Err(error), NoticeResponse::Accepted);
        manual.checker.run(TriggerMode::Manual).await;
        assert!(matches!(manual.notices()[0], Notice::CheckFailed { .. }));
    }

    #[test]
    fn malformed_tag_is_a_failure_not_up_to_date() {
        let h = harness("2.3.0", Ok(release("nightly")), NoticeResponse::Accepted);

        let (outcome, notice) = h
            .checker
            .evaluate(CheckState::Succeeded(release("nightly")), TriggerMode::Manual);

        assert!(matches!(
            outcome,
            CheckOutcome::Failed(UpdateError::MalformedTag { .. })
        ));
        assert!(matches!(notice, Some(Notice::CheckFailed { .. })));

        let (_, notice) = h
            .checker
            .evaluate(CheckState::Succeeded(release("v1.2")), TriggerMode::Startup);
        assert!(notice.is_none());
    }
}
