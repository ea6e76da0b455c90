pub mod command;
pub mod docker;
pub mod locker;
pub mod secret;

// Trait-based abstractions for testability
pub mod docker_ops;
pub mod executor;

// Re-export commonly used types and traits (used by test crate)
pub use docker::{ContainerSpec, RuntimeError};
pub use docker_ops::{ContainerHandle, ContainerRuntime, DockerRuntime};
pub use executor::{CommandExecutor, RealExecutor};
