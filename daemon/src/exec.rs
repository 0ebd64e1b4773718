//! Bounded execution of external programs

use std::process::Output;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::DeviceError;

/// Run `program` with `args`, failing on timeout or non-zero exit
pub async fn run(program: &str, args: &[String], timeout: Duration) -> Result<Output, DeviceError> {
    debug!(program, ?args, "running command");

    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, output)
        .await
        .map_err(|_| DeviceError::Timeout {
            program: program.to_string(),
            timeout,
        })??;

    if !output.status.success() {
        return Err(DeviceError::CommandFailed {
            program: program.to_string(),
            status: output.status.to_string(),
        });
    }

    Ok(output)
}

/// Run a command line given as `[program, args...]`
pub async fn run_line(line: &[String], timeout: Duration) -> Result<Output, DeviceError> {
    let (program, args) = line
        .split_first()
        .ok_or_else(|| DeviceError::Io(std::io::Error::other("empty command line")))?;
    run(program, args, timeout).await
}
