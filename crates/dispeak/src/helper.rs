//! Launching the external speech helper executable.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::runtime::Handle;

#[derive(Debug, Error)]
pub enum HelperLaunchError {
    #[error("failed to start {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} exited before a process id was available")]
    NoProcessHandle { path: PathBuf },
}

/// Start `path` detached from the shell and return its process id.
///
/// The child is reaped on `runtime` so it never lingers as a zombie.
///
/// # Errors
/// Returns an error when the process cannot be spawned.
pub fn launch_helper(runtime: &Handle, path: &Path) -> Result<u32, HelperLaunchError> {
    let _guard = runtime.enter();
    let mut child = tokio::process::Command::new(path)
        .stdin(Stdio::null())
        .spawn()
        .map_err(|source| HelperLaunchError::Spawn {
            path: path.to_path_buf(),
            source,
        })?;

    let Some(pid) = child.id() else {
        return Err(HelperLaunchError::NoProcessHandle {
            path: path.to_path_buf(),
        });
    };
    info!("Started helper {} (pid {pid})", path.display());

    let label = path.display().to_string();
    runtime.spawn(async move {
        match child.wait().await {
            Ok(status) => debug!("Helper {label} exited with {status}"),
            Err(error) => warn!("Failed to wait for helper {label}: {error}"),
        }
    });
    Ok(pid)
}
