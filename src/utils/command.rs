//! Utilities for running commands with proper error handling and timeouts

use crate::models::EnvironmentVariables;
use anyhow::{Context, Result};
use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

/// Collect the output of a prepared command, optionally bounded by a timeout.
///
/// A non-zero exit status is *not* treated as an error here; callers that need
/// to inspect stderr (the container runtime, for instance) decide for themselves.
/// An elapsed timeout surfaces as `io::ErrorKind::TimedOut` and kills the child.
pub async fn output_with_timeout(mut cmd: Command, timeout: Option<Duration>) -> io::Result<Output> {
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    match timeout {
        Some(limit) => match tokio::time::timeout(limit, cmd.output()).await {
            Ok(output) => output,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("command timed out after {:?}", limit),
            )),
        },
        None => cmd.output().await,
    }
}

/// Run a command with extra environment variables and an optional timeout
pub async fn run_command(
    program: &str,
    args: &[&str],
    envs: &EnvironmentVariables,
    timeout: Option<Duration>,
) -> Result<Output> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.envs(envs);

    // Values may hold credentials, so only the names are logged
    debug!(
        "Running command: {} {} (env: {})",
        program,
        args.join(" "),
        envs.keys().cloned().collect::<Vec<_>>().join(",")
    );

    let output = output_with_timeout(cmd, timeout)
        .await
        .context(format!("Failed to execute {}", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("Command failed: {} {}", program, args.join(" "));
        error!("Stderr: {}", stderr);
        anyhow::bail!(
            "Command failed with exit code {:?}: {}",
            output.status.code(),
            stderr.trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.is_empty() {
        debug!("Command output: {}", stdout);
    }

    Ok(output)
}

/// Run a command and return stdout as string
pub async fn run_command_stdout(
    program: &str,
    args: &[&str],
    envs: &EnvironmentVariables,
    timeout: Option<Duration>,
) -> Result<String> {
    let output = run_command(program, args, envs, timeout).await?;
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_command_passes_environment() {
        let mut envs = EnvironmentVariables::new();
        envs.insert("SERVICE_MANAGER_TEST".to_string(), "hello".to_string());

        let stdout = run_command_stdout("sh", &["-c", "echo $SERVICE_MANAGER_TEST"], &envs, None)
            .await
            .unwrap();

        assert_eq!(stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_command_reports_failure() {
        let result = run_command(
            "sh",
            &["-c", "echo broken >&2; exit 3"],
            &EnvironmentVariables::new(),
            None,
        )
        .await;

        let message = result.unwrap_err().to_string();
        assert!(message.contains("Some(3)"));
        assert!(message.contains("broken"));
    }

    #[tokio::test]
    async fn test_output_with_timeout_elapses() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");

        let err = output_with_timeout(cmd, Some(Duration::from_millis(50)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
