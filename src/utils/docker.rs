//! Docker CLI calls used to control service containers

use super::command::output_with_timeout;
use std::io;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Error raised by the container runtime
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The referenced container does not exist (anymore)
    #[error("Container not found: {0}")]
    NotFound(String),

    #[error("'{command}' failed with exit code {exit_code:?}: {stderr}")]
    CommandFailed {
        command: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("'{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// The docker binary could not be executed at all
    #[error("Failed to execute '{command}': {source}")]
    Exec {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl RuntimeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound(_))
    }
}

/// Everything needed to create a service container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    /// `KEY=VALUE` pairs
    pub env: Vec<String>,
    pub host_port: u16,
    pub container_port: u16,
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("No such container") || stderr.contains("No such object")
}

/// Run `docker <args>`, returning trimmed stdout.
///
/// `target` names the container the call is about, used for not-found errors.
async fn docker(args: &[&str], target: &str, timeout: Duration) -> Result<String, RuntimeError> {
    let command = format!("docker {}", args.first().copied().unwrap_or_default());
    debug!("Running {} for {}", command, target);

    let mut cmd = Command::new("docker");
    cmd.args(args);

    let output = match output_with_timeout(cmd, Some(timeout)).await {
        Ok(output) => output,
        Err(e) if e.kind() == io::ErrorKind::TimedOut => {
            return Err(RuntimeError::Timeout { command, timeout });
        }
        Err(source) => return Err(RuntimeError::Exec { command, source }),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if is_not_found(&stderr) {
            return Err(RuntimeError::NotFound(target.to_string()));
        }
        return Err(RuntimeError::CommandFailed {
            command,
            stderr,
            exit_code: output.status.code(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Resolve a container name or id to its full id
pub async fn inspect_container(id: &str, timeout: Duration) -> Result<String, RuntimeError> {
    docker(&["inspect", "--type", "container", "--format", "{{.Id}}", id], id, timeout).await
}

/// Create (but do not start) a container, returning its id
pub async fn create_container(spec: &ContainerSpec, timeout: Duration) -> Result<String, RuntimeError> {
    info!("Creating container {} from image {}", spec.name, spec.image);

    let publish = format!("{}:{}", spec.host_port, spec.container_port);
    let mut args = vec!["create", "--name", spec.name.as_str(), "-p", publish.as_str()];
    for pair in &spec.env {
        args.push("-e");
        args.push(pair.as_str());
    }
    args.push(spec.image.as_str());

    docker(&args, &spec.name, timeout).await
}

pub async fn start_container(id: &str, timeout: Duration) -> Result<(), RuntimeError> {
    docker(&["start", id], id, timeout).await.map(|_| ())
}

/// Force-stop a container. A container that is not running counts as stopped.
pub async fn kill_container(id: &str, timeout: Duration) -> Result<(), RuntimeError> {
    match docker(&["kill", id], id, timeout).await {
        Err(RuntimeError::CommandFailed { ref stderr, .. }) if stderr.contains("is not running") => {
            debug!("Container {} was not running", id);
            Ok(())
        }
        other => other.map(|_| ()),
    }
}

/// Remove a container together with its anonymous volumes
pub async fn remove_container(id: &str, timeout: Duration) -> Result<(), RuntimeError> {
    docker(&["rm", "--volumes", id], id, timeout).await.map(|_| ())
}
