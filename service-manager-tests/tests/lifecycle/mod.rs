//! Lifecycle tests for service-manager
//!
//! Full create/start/stop/destroy and backup flows through `ServiceManager`,
//! with the container runtime and backup scripts mocked.

mod backups;
mod services;
