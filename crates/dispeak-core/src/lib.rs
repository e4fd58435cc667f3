//! Core logic for the DiSpeak application shell.
//!
//! This crate is independent of any GUI host:
//! - Strict `MAJOR.MINOR.PATCH` parsing and comparison.
//! - Latest-release lookup against the GitHub releases feed.
//! - The update-check workflow and the notices it asks the host to present.

mod config;
mod release;
mod update;
mod version;

/// Update feed configuration and HTTP client construction.
pub use config::{UpdateConfig, build_http_client};
/// Release metadata model, feed errors, and the feed collaborator trait.
pub use release::{FetchError, GitHubReleaseFetcher, ReleaseFetcher, ReleaseMetadata};
/// Update-check orchestration and the host-facing notice types.
pub use update::{
    Browser, CheckOutcome, CheckState, Notice, NoticeResponse, Notifier, TriggerMode,
    UpdateChecker, UpdateError,
};
/// Version parsing and precedence.
pub use version::{MalformedVersionError, VersionVector, is_newer};
