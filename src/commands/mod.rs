//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod get;
pub mod info;
pub mod list;
pub mod properties;

pub use get::run_get;
pub use info::run_info;
pub use list::run_list;
pub use properties::run_properties;

use crate::error::{AppError, Result};
use crate::nvml::Device;

/// Narrow `devices` to the one at `gpu`, if requested
///
/// Devices whose index could not be read never match.
pub fn select_devices(devices: Vec<Device<'_>>, gpu: Option<u32>) -> Result<Vec<Device<'_>>> {
    let Some(index) = gpu else {
        return Ok(devices);
    };

    let selected: Vec<_> = devices
        .into_iter()
        .filter(|d| d.index() == Some(index))
        .collect();

    if selected.is_empty() {
        return Err(AppError::GpuNotFound(index));
    }
    Ok(selected)
}
