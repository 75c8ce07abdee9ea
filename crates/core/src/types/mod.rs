//! Core types for Vitalink.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod user;

pub use credential::Credential;
pub use email::{Email, EmailError};
pub use id::*;
pub use user::UserSummary;
