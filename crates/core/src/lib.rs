//! Vitalink Core - Shared types library.
//!
//! This crate provides common types used across all Vitalink components:
//! - `client` - Network resilience and session-lifecycle layer
//! - `integration-tests` - End-to-end tests against a scripted service
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for bearer credentials, type-safe IDs,
//!   emails, and the cached user summary

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
