//! Container runtime abstraction for testability
//!
//! Services only talk to containers through [`ContainerRuntime`] and the
//! [`ContainerHandle`] it hands out, so tests can swap in [`mock::MockRuntime`].

use super::docker::{self, ContainerSpec, RuntimeError};
use async_trait::async_trait;
use std::time::Duration;

/// Handle to one live container
#[async_trait]
pub trait ContainerHandle: Send + Sync {
    fn id(&self) -> &str;

    async fn start(&self) -> Result<(), RuntimeError>;

    /// Force-stop the container
    async fn kill(&self) -> Result<(), RuntimeError>;

    /// Remove the container
    async fn delete(&self) -> Result<(), RuntimeError>;
}

/// Abstraction for the container runtime, enabling mocking in tests
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Look up a container. Missing containers yield [`RuntimeError::NotFound`].
    async fn get(&self, id: &str) -> Result<Box<dyn ContainerHandle>, RuntimeError>;

    /// Create a container and return its id
    async fn create(&self, spec: &ContainerSpec) -> Result<String, RuntimeError>;
}

/// Default implementation using real Docker CLI calls
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    timeout: Duration,
}

impl DockerRuntime {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn get(&self, id: &str) -> Result<Box<dyn ContainerHandle>, RuntimeError> {
        let full_id = docker::inspect_container(id, self.timeout).await?;
        Ok(Box::new(DockerContainer {
            id: full_id,
            timeout: self.timeout,
        }))
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        docker::create_container(spec, self.timeout).await
    }
}

/// A container resolved through the Docker CLI
#[derive(Debug, Clone)]
pub struct DockerContainer {
    id: String,
    timeout: Duration,
}

#[async_trait]
impl ContainerHandle for DockerContainer {
    fn id(&self) -> &str {
        &self.id
    }

    async fn start(&self) -> Result<(), RuntimeError> {
        docker::start_container(&self.id, self.timeout).await
    }

    async fn kill(&self) -> Result<(), RuntimeError> {
        docker::kill_container(&self.id, self.timeout).await
    }

    async fn delete(&self) -> Result<(), RuntimeError> {
        docker::remove_container(&self.id, self.timeout).await
    }
}

/// Mock implementation for testing
/// Available for use in external test crates
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    /// Recorded runtime call
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum RuntimeCall {
        Get { id: String },
        Create { spec: ContainerSpec },
        Start { id: String },
        Kill { id: String },
        Delete { id: String },
    }

    #[derive(Default)]
    struct State {
        /// Known containers and whether they are running
        containers: BTreeMap<String, bool>,
        calls: Vec<RuntimeCall>,
        next_id: u64,
        fail_kill: bool,
        fail_delete: bool,
        /// Containers that resolve but disappear before kill/delete
        vanishing: Vec<String>,
    }

    /// Mock container runtime for testing
    #[derive(Clone, Default)]
    pub struct MockRuntime {
        state: Arc<Mutex<State>>,
    }

    impl MockRuntime {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-register a running container
        pub fn with_container(self, id: &str) -> Self {
            self.state.lock().containers.insert(id.to_string(), true);
            self
        }

        /// Container resolves on `get` but is gone when killed or deleted
        pub fn with_vanishing_container(self, id: &str) -> Self {
            {
                let mut state = self.state.lock();
                state.containers.insert(id.to_string(), true);
                state.vanishing.push(id.to_string());
            }
            self
        }

        /// Configure kill to fail with a non-recoverable error
        pub fn with_failing_kill(self) -> Self {
            self.state.lock().fail_kill = true;
            self
        }

        /// Configure delete to fail with a non-recoverable error
        pub fn with_failing_delete(self) -> Self {
            self.state.lock().fail_delete = true;
            self
        }

        /// Get all recorded calls
        pub fn get_calls(&self) -> Vec<RuntimeCall> {
            self.state.lock().calls.clone()
        }

        pub fn contains(&self, id: &str) -> bool {
            self.state.lock().containers.contains_key(id)
        }

        pub fn is_running(&self, id: &str) -> bool {
            self.state.lock().containers.get(id).copied().unwrap_or(false)
        }

        pub fn kill_calls(&self) -> usize {
            self.count(|c| matches!(c, RuntimeCall::Kill { .. }))
        }

        pub fn delete_calls(&self) -> usize {
            self.count(|c| matches!(c, RuntimeCall::Delete { .. }))
        }

        pub fn created_specs(&self) -> Vec<ContainerSpec> {
            self.state
                .lock()
                .calls
                .iter()
                .filter_map(|c| match c {
                    RuntimeCall::Create { spec } => Some(spec.clone()),
                    _ => None,
                })
                .collect()
        }

        fn count(&self, predicate: impl Fn(&RuntimeCall) -> bool) -> usize {
            self.state.lock().calls.iter().filter(|c| predicate(c)).count()
        }

        fn record_call(&self, call: RuntimeCall) {
            self.state.lock().calls.push(call);
        }
    }

    #[async_trait]
    impl ContainerRuntime for MockRuntime {
        async fn get(&self, id: &str) -> Result<Box<dyn ContainerHandle>, RuntimeError> {
            self.record_call(RuntimeCall::Get { id: id.to_string() });
            if !self.contains(id) {
                return Err(RuntimeError::NotFound(id.to_string()));
            }
            Ok(Box::new(MockContainer {
                id: id.to_string(),
                runtime: self.clone(),
            }))
        }

        async fn create(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
            self.record_call(RuntimeCall::Create { spec: spec.clone() });
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = format!("mock-{:04}", state.next_id);
            state.containers.insert(id.clone(), false);
            Ok(id)
        }
    }

    /// Handle returned by [`MockRuntime::get`]
    pub struct MockContainer {
        id: String,
        runtime: MockRuntime,
    }

    impl MockContainer {
        fn vanish_if_configured(&self) -> Result<(), RuntimeError> {
            let mut state = self.runtime.state.lock();
            if state.vanishing.contains(&self.id) {
                state.containers.remove(&self.id);
            }
            if !state.containers.contains_key(&self.id) {
                return Err(RuntimeError::NotFound(self.id.clone()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ContainerHandle for MockContainer {
        fn id(&self) -> &str {
            &self.id
        }

        async fn start(&self) -> Result<(), RuntimeError> {
            self.runtime.record_call(RuntimeCall::Start { id: self.id.clone() });
            self.vanish_if_configured()?;
            self.runtime.state.lock().containers.insert(self.id.clone(), true);
            Ok(())
        }

        async fn kill(&self) -> Result<(), RuntimeError> {
            self.runtime.record_call(RuntimeCall::Kill { id: self.id.clone() });
            if self.runtime.state.lock().fail_kill {
                return Err(RuntimeError::CommandFailed {
                    command: "docker kill".to_string(),
                    stderr: "Mock kill failure".to_string(),
                    exit_code: Some(1),
                });
            }
            self.vanish_if_configured()?;
            self.runtime.state.lock().containers.insert(self.id.clone(), false);
            Ok(())
        }

        async fn delete(&self) -> Result<(), RuntimeError> {
            self.runtime.record_call(RuntimeCall::Delete { id: self.id.clone() });
            if self.runtime.state.lock().fail_delete {
                return Err(RuntimeError::CommandFailed {
                    command: "docker rm".to_string(),
                    stderr: "Mock delete failure".to_string(),
                    exit_code: Some(1),
                });
            }
            self.vanish_if_configured()?;
            self.runtime.state.lock().containers.remove(&self.id);
            Ok(())
        }
    }
}
