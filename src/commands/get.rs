//! Get command implementation
//!
//! Reads a single named property from the selected GPUs.

use crate::cli::output::{print_output, PropertyReading, PropertyValue, PropertyValues};
use crate::config::Config;
use crate::error::Result;
use crate::nvml::{enumerate_with, NativeLibrary, PropertyDescriptor};

use super::select_devices;

/// Execute the get command
pub fn run_get(
    lib: &dyn NativeLibrary,
    config: &Config,
    gpu: Option<u32>,
    property: &str,
) -> Result<()> {
    let values = read_property(lib, config, gpu, property)?;
    print_output(&values, config.output.format)?;
    Ok(())
}

/// Read `property` from every selected device
pub fn read_property(
    lib: &dyn NativeLibrary,
    config: &Config,
    gpu: Option<u32>,
    property: &str,
) -> Result<PropertyValues> {
    // Unknown names fail before any device is touched.
    let descriptor = *lib.registry().lookup(property)?;

    let devices = select_devices(enumerate_with(lib, config.devices.policy())?, gpu)?;

    let values = devices
        .iter()
        .map(|device| -> Result<PropertyValue> {
            let value = match descriptor {
                PropertyDescriptor::Scalar(_) => PropertyReading::Scalar(device.scalar(property)?),
                PropertyDescriptor::Text(_) => PropertyReading::Text(device.text(property)?),
            };
            Ok(PropertyValue {
                gpu_index: device.index(),
                gpu_name: device.name().to_string(),
                property: property.to_string(),
                value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PropertyValues { values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, TelemetryError};
    use crate::mock::MockLibrary;

    #[test]
    fn test_read_scalar() {
        let lib = MockLibrary::new(2);
        let values = read_property(&lib, &Config::default(), None, "FanSpeed").unwrap();
        assert_eq!(values.values.len(), 2);
        assert_eq!(values.values[1].value, PropertyReading::Scalar(42));
    }

    #[test]
    fn test_read_text_single_gpu() {
        let lib = MockLibrary::new(2);
        let values = read_property(&lib, &Config::default(), Some(1), "Serial").unwrap();
        assert_eq!(values.values.len(), 1);
        assert_eq!(
            values.values[0].value,
            PropertyReading::Text("0324117000000".to_string())
        );
    }

    #[test]
    fn test_read_unknown() {
        let lib = MockLibrary::new(1);
        let result = read_property(&lib, &Config::default(), None, "BoardId");
        assert!(matches!(
            result,
            Err(AppError::Telemetry(TelemetryError::UnknownProperty(name))) if name == "BoardId"
        ));
    }
}
