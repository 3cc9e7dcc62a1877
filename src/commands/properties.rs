//! Properties command implementation
//!
//! Lists the properties resolved from the loaded library.

use crate::cli::output::{print_output, PropertyEntry, PropertyList};
use crate::config::Config;
use crate::error::Result;
use crate::nvml::NativeLibrary;

/// Execute the properties command
pub fn run_properties(lib: &dyn NativeLibrary, config: &Config) -> Result<()> {
    print_output(&build_property_list(lib), config.output.format)?;
    Ok(())
}

pub fn build_property_list(lib: &dyn NativeLibrary) -> PropertyList {
    let properties = lib
        .registry()
        .iter()
        .map(|(name, descriptor)| PropertyEntry {
            name: name.to_string(),
            shape: descriptor.shape().to_string(),
            buffer_len: descriptor.buffer_len(),
        })
        .collect();

    PropertyList { properties }
}
