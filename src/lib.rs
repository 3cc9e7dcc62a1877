//! nvtel - NVML-based GPU telemetry library
//!
//! Reads GPU properties by name through a registry of native NVML accessors,
//! marshaling integer and string results across the C boundary.
//!
//! # Modules
//!
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Domain models
//! - [`error`]: Error types
//! - [`nvml`]: Native library access, property dispatch and enumeration

pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod nvml;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
