//! Thermal domain types

use nvml_wrapper_sys::bindings::nvmlTemperatureSensors_enum_NVML_TEMPERATURE_GPU;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Temperature sensor selector (nvmlTemperatureSensors_t)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureSensor {
    /// GPU die sensor
    #[default]
    Gpu,
}

impl TemperatureSensor {
    /// Native selector value
    pub fn as_raw(&self) -> u32 {
        match self {
            Self::Gpu => nvmlTemperatureSensors_enum_NVML_TEMPERATURE_GPU,
        }
    }
}

impl fmt::Display for TemperatureSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu => write!(f, "GPU"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_raw_value() {
        assert_eq!(TemperatureSensor::Gpu.as_raw(), 0);
        assert_eq!(TemperatureSensor::default().to_string(), "GPU");
    }
}
