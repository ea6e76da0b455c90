//! Unit tests for service-manager
//!
//! Pure domain behaviour through the public API: strategies resolved from
//! services, validation and the record store.

mod service;
mod store;
mod strategies;
