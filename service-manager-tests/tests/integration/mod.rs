//! Integration tests for service-manager
//!
//! These tests require Docker and drive real containers through the docker CLI.
//! Run with: `cargo test -p service-manager-tests --test integration -- --ignored`

mod common;
mod docker;
