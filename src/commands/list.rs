//! List command implementation
//!
//! Lists all detected NVIDIA GPUs.

use crate::cli::output::{print_output, GpuList, GpuListEntry};
use crate::config::Config;
use crate::error::Result;
use crate::nvml::{enumerate_with, NativeLibrary};

/// Execute the list command
pub fn run_list(lib: &dyn NativeLibrary, config: &Config) -> Result<()> {
    let gpu_list = build_list(lib, config)?;
    print_output(&gpu_list, config.output.format)?;
    Ok(())
}

/// Enumerate devices into a displayable list
pub fn build_list(lib: &dyn NativeLibrary, config: &Config) -> Result<GpuList> {
    let devices = enumerate_with(lib, config.devices.policy())?;
    let gpus = devices
        .iter()
        .map(|device| GpuListEntry::from(&device.info()))
        .collect();

    let driver_version = lib
        .driver_version()
        .inspect_err(|e| log::debug!("Driver version unavailable: {}", e))
        .ok();

    Ok(GpuList {
        gpus,
        driver_version,
    })
}
