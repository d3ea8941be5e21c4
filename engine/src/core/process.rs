//! Cross-platform process spawning helpers.
//!
//! FFmpeg and FFprobe are console binaries. This module centralizes how they
//! are spawned: Windows creation flags (no console window per invocation),
//! captured output, kill-on-drop, and the optional wall-clock limit.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Captured result of a finished child process
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Why a child process could not be run to completion
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("process did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Apply platform-specific flags to a tokio process command.
pub fn configure_tokio_command(cmd: &mut tokio::process::Command) {
    #[cfg(target_os = "windows")]
    {
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(target_os = "windows"))]
    let _ = cmd;
}

/// Runs `cmd` until it exits and captures both output streams.
///
/// The caller suspends until the process exits. When `timeout` elapses first,
/// the child is killed (it is spawned with `kill_on_drop`) and
/// `ProcessError::TimedOut` is returned.
pub async fn run_to_completion(
    mut cmd: tokio::process::Command,
    timeout: Option<Duration>,
) -> Result<ProcessOutput, ProcessError> {
    configure_tokio_command(&mut cmd);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn()?;
    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| ProcessError::TimedOut(limit))??,
        None => child.wait_with_output().await?,
    };

    Ok(ProcessOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
