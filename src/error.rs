//! Unified error types for nvtel
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use crate::nvml::ffi::NativeStatus;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from the telemetry layer
    #[error("{0}")]
    Telemetry(#[from] TelemetryError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Selected GPU index does not exist
    #[error("GPU not found at index {0}")]
    GpuNotFound(u32),

    /// IO error (stdout, file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from property dispatch, device enumeration and session setup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// Property name is not registered, or registered with another shape
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// The native accessor returned a non-success status
    #[error("Native call for '{property}' failed: {message} (status {status})")]
    NativeCallFailed {
        property: String,
        status: NativeStatus,
        message: String,
    },

    /// Marshaling produced a zero-length string
    #[error("Property '{0}' returned an empty string")]
    EmptyResult(String),

    /// Device count or handle resolution failed
    #[error("Device enumeration failed: {0}")]
    EnumerationFailed(String),

    /// Enumeration finished without a single usable device
    #[error("No NVIDIA GPUs detected")]
    NoDevicesFound,

    /// Device construction stopped early (strict enumeration only)
    #[error("Enumeration stopped at device {index} after {constructed} device(s): {reason}")]
    PartialEnumeration {
        constructed: usize,
        index: u32,
        reason: String,
    },

    /// The native library could not be loaded or initialized
    #[error("Failed to initialize NVML: {0}")]
    SessionInitFailed(String),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Failed to parse config file
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
