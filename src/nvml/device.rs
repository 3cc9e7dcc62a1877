//! Devices and enumeration
//!
//! A [`Device`] pairs a native handle with its identity, resolved once when
//! the device is constructed. Every other property is read on demand
//! through the dispatcher.

use crate::domain::{
    ClockType, GpuInfo, MemoryInfo, PerformanceState, TemperatureSensor, Utilization,
};
use crate::error::TelemetryError;
use crate::nvml::dispatch::{get_scalar, get_text, native_failure};
use crate::nvml::ffi::{DeviceHandle, NativeStatus};
use crate::nvml::traits::NativeLibrary;

use std::fmt;

/// What to do when a device's identity cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumerationPolicy {
    /// Stop and return the devices built so far
    #[default]
    BestEffort,
    /// Stop and report [`TelemetryError::PartialEnumeration`]
    Strict,
}

/// One physical GPU
pub struct Device<'a> {
    lib: &'a dyn NativeLibrary,
    handle: DeviceHandle,
    uuid: String,
    name: String,
    index: Option<u32>,
    pci_bus_id: Option<String>,
}

impl<'a> Device<'a> {
    /// Build a device, resolving its UUID and name eagerly
    ///
    /// Index and PCI bus id are resolved too, but their absence is not an error.
    pub fn new(lib: &'a dyn NativeLibrary, handle: DeviceHandle) -> Result<Self, TelemetryError> {
        let registry = lib.registry();
        let uuid = get_text(registry, handle, "UUID")?;
        let name = get_text(registry, handle, "Name")?;

        let index = get_scalar(registry, handle, "Index")
            .inspect_err(|e| log::debug!("Index unavailable for {}: {}", uuid, e))
            .ok();
        let pci_bus_id = lib
            .pci_bus_id(handle)
            .ok()
            .filter(|id| !id.is_empty());

        Ok(Self {
            lib,
            handle,
            uuid,
            name,
            index,
            pci_bus_id,
        })
    }

    /// The native handle, for dispatching further properties
    pub fn handle(&self) -> DeviceHandle {
        self.handle
    }

    /// Cached UUID
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Cached product name, e.g. "Tesla K40m"
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cached NVML index
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// Cached PCI bus id
    pub fn pci_bus_id(&self) -> Option<&str> {
        self.pci_bus_id.as_deref()
    }

    /// Identity summary for display
    pub fn info(&self) -> GpuInfo {
        let mut info = GpuInfo::new(self.name.clone(), self.uuid.clone());
        if let Some(index) = self.index {
            info = info.with_index(index);
        }
        if let Some(bus_id) = &self.pci_bus_id {
            info = info.with_pci_bus_id(bus_id.clone());
        }
        info
    }

    /// Dispatch a scalar property by name
    pub fn scalar(&self, name: &str) -> Result<u32, TelemetryError> {
        get_scalar(self.lib.registry(), self.handle, name)
    }

    /// Dispatch a text property by name
    pub fn text(&self, name: &str) -> Result<String, TelemetryError> {
        get_text(self.lib.registry(), self.handle, name)
    }

    fn extended<T>(
        &self,
        property: &str,
        result: Result<T, NativeStatus>,
    ) -> Result<T, TelemetryError> {
        result.map_err(|status| native_failure(self.lib.registry(), property, status))
    }

    /// Minor number: the device node is /dev/nvidia[minor_number]
    pub fn minor_number(&self) -> Result<u32, TelemetryError> {
        self.scalar("MinorNumber")
    }

    /// Checksum of the inforom configuration, identical for identically configured devices
    pub fn inforom_configuration_checksum(&self) -> Result<u32, TelemetryError> {
        self.scalar("InforomConfigurationChecksum")
    }

    pub fn max_pcie_link_generation(&self) -> Result<u32, TelemetryError> {
        self.scalar("MaxPCIeLinkGeneration")
    }

    pub fn max_pcie_link_width(&self) -> Result<u32, TelemetryError> {
        self.scalar("MaxPCIeLinkWidth")
    }

    pub fn curr_pcie_link_generation(&self) -> Result<u32, TelemetryError> {
        self.scalar("CurrPCIeLinkGeneration")
    }

    pub fn curr_pcie_link_width(&self) -> Result<u32, TelemetryError> {
        self.scalar("CurrPCIeLinkWidth")
    }

    pub fn pcie_replay_counter(&self) -> Result<u32, TelemetryError> {
        self.scalar("PCIeReplayCounter")
    }

    /// Fan speed in percent, on devices that have fans
    pub fn fan_speed(&self) -> Result<u32, TelemetryError> {
        self.scalar("FanSpeed")
    }

    /// Power management limit in mW
    pub fn power_management_limit(&self) -> Result<u32, TelemetryError> {
        self.scalar("PowerManagementLimit")
    }

    /// Default power management limit in mW
    pub fn power_management_default_limit(&self) -> Result<u32, TelemetryError> {
        self.scalar("PowerManagementDefaultLimit")
    }

    /// Current draw in mW
    pub fn power_usage(&self) -> Result<u32, TelemetryError> {
        self.scalar("PowerUsage")
    }

    /// Effective limit after all limiters, in mW
    pub fn enforced_power_limit(&self) -> Result<u32, TelemetryError> {
        self.scalar("EnforcedPowerLimit")
    }

    /// Identical for GPUs connected to the same PLX
    pub fn board_id(&self) -> Result<u32, TelemetryError> {
        self.scalar("BoardId")
    }

    /// Whether the device sits on a multi-GPU board
    pub fn multi_gpu_board(&self) -> Result<bool, TelemetryError> {
        Ok(self.scalar("MultiGpuBoard")? != 0)
    }

    pub fn performance_state(&self) -> Result<PerformanceState, TelemetryError> {
        Ok(PerformanceState::from_raw(self.scalar("PowerState")?))
    }

    pub fn serial(&self) -> Result<String, TelemetryError> {
        self.text("Serial")
    }

    pub fn inforom_image_version(&self) -> Result<String, TelemetryError> {
        self.text("InforomImageVersion")
    }

    pub fn vbios_version(&self) -> Result<String, TelemetryError> {
        self.text("VbiosVersion")
    }

    pub fn board_part_number(&self) -> Result<String, TelemetryError> {
        self.text("BoardPartNumber")
    }

    /// GPU die temperature in degrees Celsius
    pub fn temperature(&self) -> Result<u32, TelemetryError> {
        self.extended(
            "Temperature",
            self.lib.temperature(self.handle, TemperatureSensor::Gpu),
        )
    }

    /// Current clock in MHz
    pub fn clock_info(&self, clock: ClockType) -> Result<u32, TelemetryError> {
        self.extended("ClockInfo", self.lib.clock_info(self.handle, clock))
    }

    /// Maximum clock in MHz
    pub fn max_clock_info(&self, clock: ClockType) -> Result<u32, TelemetryError> {
        self.extended("MaxClockInfo", self.lib.max_clock_info(self.handle, clock))
    }

    pub fn memory_info(&self) -> Result<MemoryInfo, TelemetryError> {
        self.extended("MemoryInfo", self.lib.memory_info(self.handle))
    }

    pub fn utilization_rates(&self) -> Result<Utilization, TelemetryError> {
        self.extended("UtilizationRates", self.lib.utilization_rates(self.handle))
    }

    /// Lifetime count of uncorrected ECC errors
    pub fn total_ecc_errors(&self) -> Result<u64, TelemetryError> {
        self.extended("TotalEccErrors", self.lib.total_ecc_errors(self.handle))
    }
}

impl fmt::Debug for Device<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("handle", &self.handle)
            .field("uuid", &self.uuid)
            .field("name", &self.name)
            .field("index", &self.index)
            .field("pci_bus_id", &self.pci_bus_id)
            .finish()
    }
}

/// Enumerate all devices, stopping quietly at the first one whose
/// identity cannot be resolved
pub fn enumerate(lib: &dyn NativeLibrary) -> Result<Vec<Device<'_>>, TelemetryError> {
    enumerate_with(lib, EnumerationPolicy::BestEffort)
}

/// Enumerate all devices under an explicit policy
pub fn enumerate_with(
    lib: &dyn NativeLibrary,
    policy: EnumerationPolicy,
) -> Result<Vec<Device<'_>>, TelemetryError> {
    let handles = device_handles(lib)?;
    let mut devices = Vec::with_capacity(handles.len());

    for (index, handle) in (0u32..).zip(handles) {
        match Device::new(lib, handle) {
            Ok(device) => devices.push(device),
            Err(e) => {
                log::warn!(
                    "Stopping enumeration at device {} ({} constructed): {}",
                    index,
                    devices.len(),
                    e
                );
                if policy == EnumerationPolicy::Strict {
                    return Err(TelemetryError::PartialEnumeration {
                        constructed: devices.len(),
                        index,
                        reason: e.to_string(),
                    });
                }
                break;
            }
        }
    }

    if devices.is_empty() {
        return Err(TelemetryError::NoDevicesFound);
    }

    Ok(devices)
}

/// Resolve every handle; any single failure aborts
fn device_handles(lib: &dyn NativeLibrary) -> Result<Vec<DeviceHandle>, TelemetryError> {
    let count = lib.device_count().map_err(|status| {
        TelemetryError::EnumerationFailed(format!(
            "device count query failed: {}",
            lib.registry().describe(status)
        ))
    })?;
    log::debug!("NVML reports {} device(s)", count);

    (0..count)
        .map(|index| {
            lib.handle_by_index(index).map_err(|status| {
                TelemetryError::EnumerationFailed(format!(
                    "handle for device {} unavailable: {}",
                    index,
                    lib.registry().describe(status)
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{handle, MockLibrary};

    #[test]
    fn test_enumerate_all_devices() {
        let lib = MockLibrary::new(3);
        let devices = enumerate(&lib).unwrap();
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[1].uuid(), "GPU-MOCK-0001");
        assert_eq!(devices[1].name(), "Mock GPU 1");
        assert_eq!(devices[1].index(), Some(1));
        assert_eq!(devices[1].pci_bus_id(), Some("00000000:01:00.0"));
    }

    #[test]
    fn test_enumerate_stops_at_uuid_failure() {
        let lib = MockLibrary::new(3).with_broken_uuid(2);
        let devices = enumerate(&lib).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].uuid(), "GPU-MOCK-0000");
        assert_eq!(devices[1].uuid(), "GPU-MOCK-0001");
    }

    #[test]
    fn test_enumerate_stops_at_name_failure() {
        let lib = MockLibrary::new(3).with_broken_name(2);
        let devices = enumerate(&lib).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].name(), "Mock GPU 1");
    }

    #[test]
    fn test_enumerate_strict_reports_name_failure() {
        let lib = MockLibrary::new(3).with_broken_name(1);
        let err = enumerate_with(&lib, EnumerationPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            TelemetryError::PartialEnumeration {
                constructed: 1,
                index: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_enumerate_strict_reports_partial() {
        let lib = MockLibrary::new(3).with_broken_uuid(2);
        let err = enumerate_with(&lib, EnumerationPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            TelemetryError::PartialEnumeration {
                constructed: 2,
                index: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_enumerate_no_devices() {
        let lib = MockLibrary::new(0);
        assert_eq!(enumerate(&lib).unwrap_err(), TelemetryError::NoDevicesFound);
    }

    #[test]
    fn test_enumerate_first_device_broken() {
        let lib = MockLibrary::new(2).with_broken_uuid(0);
        assert_eq!(enumerate(&lib).unwrap_err(), TelemetryError::NoDevicesFound);
    }

    #[test]
    fn test_enumerate_count_failure() {
        let lib = MockLibrary::new(2).with_count_failure();
        assert!(matches!(
            enumerate(&lib),
            Err(TelemetryError::EnumerationFailed(_))
        ));
    }

    #[test]
    fn test_enumerate_handle_failure_aborts() {
        let lib = MockLibrary::new(3).with_broken_handle(1);
        assert!(matches!(
            enumerate(&lib),
            Err(TelemetryError::EnumerationFailed(_))
        ));
    }

    #[test]
    fn test_scalar_wrappers() {
        let lib = MockLibrary::new(1);
        let device = Device::new(&lib, handle(0)).unwrap();
        assert_eq!(device.fan_speed().unwrap(), 42);
        assert_eq!(device.power_usage().unwrap(), 150_000);
        assert!(device.multi_gpu_board().unwrap());
        assert_eq!(device.performance_state().unwrap(), PerformanceState::P(2));
    }

    #[test]
    fn test_text_wrappers() {
        let lib = MockLibrary::new(1);
        let device = Device::new(&lib, handle(0)).unwrap();
        assert_eq!(device.serial().unwrap(), "0324117000000");
        assert_eq!(device.vbios_version().unwrap(), "X");
    }

    #[test]
    fn test_unregistered_wrapper_reports_unknown() {
        let lib = MockLibrary::new(1);
        let device = Device::new(&lib, handle(0)).unwrap();
        assert_eq!(
            device.board_id(),
            Err(TelemetryError::UnknownProperty("BoardId".to_string()))
        );
    }

    #[test]
    fn test_extended_accessors() {
        let lib = MockLibrary::new(1);
        let device = Device::new(&lib, handle(0)).unwrap();
        assert_eq!(device.temperature().unwrap(), 45);
        assert_eq!(device.clock_info(ClockType::Graphics).unwrap(), 1_500);
        assert_eq!(device.memory_info().unwrap().total, 8 << 30);
    }

    #[test]
    fn test_extended_unsupported() {
        let lib = MockLibrary::new(1);
        let device = Device::new(&lib, handle(0)).unwrap();
        match device.total_ecc_errors() {
            Err(TelemetryError::NativeCallFailed {
                property, status, ..
            }) => {
                assert_eq!(property, "TotalEccErrors");
                assert_eq!(status, NativeStatus::NOT_SUPPORTED);
            }
            other => panic!("Expected NativeCallFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_device_info() {
        let lib = MockLibrary::new(1);
        let device = Device::new(&lib, handle(0)).unwrap();
        let info = device.info();
        assert_eq!(info.index, Some(0));
        assert_eq!(info.uuid, "GPU-MOCK-0000");
    }

    #[test]
    fn test_devices_shared_across_threads() {
        let lib = MockLibrary::new(2);
        let devices = enumerate(&lib).unwrap();
        std::thread::scope(|s| {
            for device in &devices {
                s.spawn(move || assert_eq!(device.fan_speed().unwrap(), 42));
            }
        });
    }
}
