//! Shared utilities, configuration, and error handling for Linecard
//!
//! This crate provides common functionality used across the Linecard
//! data-access workspace:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - A verification scope for multi-field test diagnostics

pub mod config;
pub mod error;
pub mod verify;

pub use config::Config;
pub use error::{Error, Result};
pub use verify::{Severity, Verification, VerificationFailure, VerificationStep};
