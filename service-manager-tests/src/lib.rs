//! Test utilities for service-manager
//!
//! This crate provides shared test utilities, wiring of the mock
//! implementations and helper functions for testing service-manager.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{new_service, TestContext};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let ctx = TestContext::new();
//!     let manager = ctx.manager();
//!     let service = manager.create(new_service("orders", "postgres")).unwrap();
//!     // ... test code
//! }
//! ```

pub mod config_builder;
pub mod fixtures;
pub mod test_context;

// Re-export commonly used items
pub use config_builder::ConfigBuilder;
pub use fixtures::*;
pub use test_context::TestContext;

// Re-export types from the main crate for convenience
pub use service_manager::config::{Config, GlobalConfig};
pub use service_manager::models::{Backup, BackupStatus, EnvironmentVariables, NewService, Service};

// Re-export mock implementations from the main crate
pub use service_manager::managers::jobs::mock::RecordingQueue;
pub use service_manager::utils::docker_ops::mock::{MockRuntime, RuntimeCall};
pub use service_manager::utils::executor::mock::{MockExecutor, MockResponse};

/// Common test result type
pub type TestResult<T = ()> = anyhow::Result<T>;
