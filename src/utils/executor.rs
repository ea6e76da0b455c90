//! Command execution abstraction for testability
//!
//! Backup procedures run external scripts through this seam so tests can
//! substitute a recording executor.

use crate::models::EnvironmentVariables;
use anyhow::Result;
use async_trait::async_trait;
use std::process::Output;
use std::time::Duration;

/// Abstraction for command execution, enabling mocking in tests
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command with extra environment variables and an optional timeout
    async fn run_command(
        &self,
        program: &str,
        args: &[&str],
        envs: &EnvironmentVariables,
        timeout: Option<Duration>,
    ) -> Result<Output>;

    /// Run a command and return stdout as string
    async fn run_command_stdout(
        &self,
        program: &str,
        args: &[&str],
        envs: &EnvironmentVariables,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let output = self.run_command(program, args, envs, timeout).await?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Default implementation using real subprocess calls
#[derive(Debug, Clone, Default)]
pub struct RealExecutor;

impl RealExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for RealExecutor {
    async fn run_command(
        &self,
        program: &str,
        args: &[&str],
        envs: &EnvironmentVariables,
        timeout: Option<Duration>,
    ) -> Result<Output> {
        super::command::run_command(program, args, envs, timeout).await
    }
}

/// A mock executor for testing that records calls and returns configured responses
/// Available for use in external test crates
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Recorded command invocation
    #[derive(Clone, Debug)]
    pub struct CommandCall {
        pub program: String,
        pub args: Vec<String>,
        pub envs: EnvironmentVariables,
    }

    /// Response configuration for mock
    #[derive(Clone, Debug)]
    pub enum MockResponse {
        Success { stdout: String },
        Failure { stderr: String, exit_code: i32 },
        Timeout,
        /// Sleep before succeeding, for observing in-flight work
        Delayed { delay: Duration },
    }

    impl Default for MockResponse {
        fn default() -> Self {
            MockResponse::Success {
                stdout: String::new(),
            }
        }
    }

    /// Mock executor for testing
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        calls: Arc<Mutex<Vec<CommandCall>>>,
        /// Pre-configured responses: program path -> response
        responses: Arc<Mutex<HashMap<String, MockResponse>>>,
        default_response: Arc<Mutex<MockResponse>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Configure a response for a specific program
        pub fn expect(self, program: &str, response: MockResponse) -> Self {
            self.responses.lock().insert(program.to_string(), response);
            self
        }

        /// Set the default response for unconfigured programs
        pub fn with_default_response(self, response: MockResponse) -> Self {
            *self.default_response.lock() = response;
            self
        }

        /// Get all recorded calls
        pub fn get_calls(&self) -> Vec<CommandCall> {
            self.calls.lock().clone()
        }

        /// Check if a program was called
        pub fn was_called(&self, program: &str) -> bool {
            self.calls.lock().iter().any(|c| c.program == program)
        }

        /// Get number of calls to a specific program
        pub fn call_count(&self, program: &str) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|c| c.program == program)
                .count()
        }

        fn record_call(&self, program: &str, args: &[&str], envs: &EnvironmentVariables) {
            self.calls.lock().push(CommandCall {
                program: program.to_string(),
                args: args.iter().map(|s| s.to_string()).collect(),
                envs: envs.clone(),
            });
        }

        fn get_response(&self, program: &str) -> MockResponse {
            self.responses
                .lock()
                .get(program)
                .cloned()
                .unwrap_or_else(|| self.default_response.lock().clone())
        }
    }

    #[async_trait]
    impl CommandExecutor for MockExecutor {
        async fn run_command(
            &self,
            program: &str,
            args: &[&str],
            envs: &EnvironmentVariables,
            _timeout: Option<Duration>,
        ) -> Result<Output> {
            self.record_call(program, args, envs);

            let stdout = match self.get_response(program) {
                MockResponse::Success { stdout } => stdout,
                MockResponse::Failure { stderr, exit_code } => {
                    anyhow::bail!("Command failed with exit code {:?}: {}", exit_code, stderr)
                }
                MockResponse::Timeout => anyhow::bail!("Command timed out"),
                MockResponse::Delayed { delay } => {
                    tokio::time::sleep(delay).await;
                    String::new()
                }
            };

            Ok(Output {
                status: std::process::ExitStatus::default(),
                stdout: stdout.into_bytes(),
                stderr: Vec::new(),
            })
        }
    }
}
