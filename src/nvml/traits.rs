//! Trait definitions for the native library boundary
//!
//! These traits abstract over the loaded NVML library to enable testing
//! with mocks.

use crate::domain::{ClockType, MemoryInfo, TemperatureSensor, Utilization};
use crate::error::TelemetryError;
use crate::nvml::dispatch::native_failure;
use crate::nvml::ffi::{DeviceHandle, NativeStatus};
use crate::nvml::registry::Registry;

/// Native library operations needed by enumeration and devices
///
/// Only device discovery and the registry are required. The struct and
/// selector accessors default to `NOT_SUPPORTED` so a library (or mock)
/// can provide just the ones it has.
pub trait NativeLibrary: Send + Sync {
    /// The property registry resolved for this library
    fn registry(&self) -> &Registry;

    /// Number of devices visible to the library
    fn device_count(&self) -> Result<u32, NativeStatus>;

    /// Resolve the handle of the device at `index`
    fn handle_by_index(&self, index: u32) -> Result<DeviceHandle, NativeStatus>;

    /// Installed driver version
    fn driver_version(&self) -> Result<String, TelemetryError> {
        Err(native_failure(
            self.registry(),
            "DriverVersion",
            NativeStatus::NOT_SUPPORTED,
        ))
    }

    /// Temperature reading in degrees Celsius
    fn temperature(
        &self,
        _handle: DeviceHandle,
        _sensor: TemperatureSensor,
    ) -> Result<u32, NativeStatus> {
        Err(NativeStatus::NOT_SUPPORTED)
    }

    /// Current clock in MHz
    fn clock_info(&self, _handle: DeviceHandle, _clock: ClockType) -> Result<u32, NativeStatus> {
        Err(NativeStatus::NOT_SUPPORTED)
    }

    /// Maximum clock in MHz
    fn max_clock_info(
        &self,
        _handle: DeviceHandle,
        _clock: ClockType,
    ) -> Result<u32, NativeStatus> {
        Err(NativeStatus::NOT_SUPPORTED)
    }

    fn memory_info(&self, _handle: DeviceHandle) -> Result<MemoryInfo, NativeStatus> {
        Err(NativeStatus::NOT_SUPPORTED)
    }

    fn utilization_rates(&self, _handle: DeviceHandle) -> Result<Utilization, NativeStatus> {
        Err(NativeStatus::NOT_SUPPORTED)
    }

    /// PCI bus id in `domain:bus:device.function` form
    fn pci_bus_id(&self, _handle: DeviceHandle) -> Result<String, NativeStatus> {
        Err(NativeStatus::NOT_SUPPORTED)
    }

    /// Aggregate uncorrected ECC errors over the device lifetime
    fn total_ecc_errors(&self, _handle: DeviceHandle) -> Result<u64, NativeStatus> {
        Err(NativeStatus::NOT_SUPPORTED)
    }
}
