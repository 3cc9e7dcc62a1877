//! NVML session
//!
//! Loads the native library, initializes it exactly once per process and
//! resolves every accessor the rest of the crate dispatches through.

use crate::domain::{ClockType, MemoryInfo, TemperatureSensor, Utilization};
use crate::error::TelemetryError;
use crate::nvml::buffer::c_chars_to_string;
use crate::nvml::dispatch::{get_system_text, native_failure};
use crate::nvml::ffi::{
    CountFn, DeviceHandle, EccCountFn, HandleByIndexFn, InitFn, MemoryInfoFn, NativeStatus,
    PciInfoFn, SelectorFn, SystemTextFn, UtilizationFn, AGGREGATE_ECC,
    MEMORY_ERROR_TYPE_UNCORRECTED, NVML_SYSTEM_DRIVER_VERSION_BUFFER_SIZE,
};
use crate::nvml::registry::Registry;
use crate::nvml::traits::NativeLibrary;

use libloading::{Library, Symbol};
use nvml_wrapper_sys::bindings::{nvmlMemory_t, nvmlPciInfo_t, nvmlUtilization_t};
use std::mem;
use std::os::raw::{c_uint, c_ulonglong};
use std::ptr;
use std::sync::OnceLock;

/// Library file tried first when no path is configured
pub const DEFAULT_LIBRARY: &str = "libnvidia-ml.so.1";
/// Unversioned name tried when the default is missing
pub const FALLBACK_LIBRARY: &str = "libnvidia-ml.so";

static SESSION: OnceLock<Result<Session, TelemetryError>> = OnceLock::new();

/// Accessors that do not fit the scalar/text shapes
#[derive(Debug, Default)]
struct ExtendedAccessors {
    driver_version: Option<SystemTextFn>,
    temperature: Option<SelectorFn>,
    clock_info: Option<SelectorFn>,
    max_clock_info: Option<SelectorFn>,
    memory_info: Option<MemoryInfoFn>,
    utilization: Option<UtilizationFn>,
    pci_info: Option<PciInfoFn>,
    total_ecc_errors: Option<EccCountFn>,
}

/// Initialized NVML library
pub struct Session {
    registry: Registry,
    device_count: CountFn,
    handle_by_index: HandleByIndexFn,
    extended: ExtendedAccessors,
    // Keeps every resolved function pointer valid.
    _library: Library,
}

impl Session {
    /// Initialize the process-wide session
    ///
    /// The first call loads `path` (or the default library names) and runs
    /// `nvmlInit`. Later calls return the same outcome, whatever path they pass.
    pub fn init(path: Option<&str>) -> Result<&'static Session, TelemetryError> {
        SESSION
            .get_or_init(|| Self::load(path))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// The session created by [`Session::init`]
    pub fn global() -> Result<&'static Session, TelemetryError> {
        stored(&SESSION)
    }

    fn load(path: Option<&str>) -> Result<Self, TelemetryError> {
        let library = open_library(path)?;

        let init: InitFn = required(&library, "nvmlInit_v2")?;
        // SAFETY: nvmlInit_v2 takes no arguments and may be called from any thread.
        let raw = unsafe { init() };
        NativeStatus::check(raw).map_err(|status| {
            TelemetryError::SessionInitFailed(format!(
                "nvmlInit returned {} ({})",
                status.description(),
                status
            ))
        })?;

        let device_count = required(&library, "nvmlDeviceGetCount_v2")?;
        let handle_by_index = required(&library, "nvmlDeviceGetHandleByIndex_v2")?;
        let registry = Registry::resolve(&library);

        let extended = ExtendedAccessors {
            driver_version: optional(&library, "nvmlSystemGetDriverVersion"),
            temperature: optional(&library, "nvmlDeviceGetTemperature"),
            clock_info: optional(&library, "nvmlDeviceGetClockInfo"),
            max_clock_info: optional(&library, "nvmlDeviceGetMaxClockInfo"),
            memory_info: optional(&library, "nvmlDeviceGetMemoryInfo"),
            utilization: optional(&library, "nvmlDeviceGetUtilizationRates"),
            pci_info: optional(&library, "nvmlDeviceGetPciInfo_v3"),
            total_ecc_errors: optional(&library, "nvmlDeviceGetTotalEccErrors"),
        };

        log::info!(
            "NVML session initialized ({} properties registered)",
            registry.len()
        );

        Ok(Self {
            registry,
            device_count,
            handle_by_index,
            extended,
            _library: library,
        })
    }

    fn selector(
        func: Option<SelectorFn>,
        handle: DeviceHandle,
        selector: c_uint,
    ) -> Result<u32, NativeStatus> {
        let func = func.ok_or(NativeStatus::NOT_SUPPORTED)?;
        let mut value: c_uint = 0;
        // SAFETY: SelectorFn prototype; `value` outlives the call.
        NativeStatus::check(unsafe { func(handle.as_raw(), selector, &mut value) })?;
        Ok(value)
    }
}

impl NativeLibrary for Session {
    fn registry(&self) -> &Registry {
        &self.registry
    }

    fn device_count(&self) -> Result<u32, NativeStatus> {
        let mut count: c_uint = 0;
        // SAFETY: nvmlDeviceGetCount_v2 writes one unsigned int.
        NativeStatus::check(unsafe { (self.device_count)(&mut count) })?;
        Ok(count)
    }

    fn handle_by_index(&self, index: u32) -> Result<DeviceHandle, NativeStatus> {
        let mut handle = ptr::null_mut();
        // SAFETY: nvmlDeviceGetHandleByIndex_v2 writes one device handle.
        NativeStatus::check(unsafe { (self.handle_by_index)(index, &mut handle) })?;
        Ok(DeviceHandle::from_raw(handle))
    }

    fn driver_version(&self) -> Result<String, TelemetryError> {
        match self.extended.driver_version {
            Some(func) => get_system_text(
                &self.registry,
                "DriverVersion",
                func,
                NVML_SYSTEM_DRIVER_VERSION_BUFFER_SIZE,
            ),
            None => Err(native_failure(
                &self.registry,
                "DriverVersion",
                NativeStatus::NOT_SUPPORTED,
            )),
        }
    }

    fn temperature(
        &self,
        handle: DeviceHandle,
        sensor: TemperatureSensor,
    ) -> Result<u32, NativeStatus> {
        Self::selector(self.extended.temperature, handle, sensor.as_raw())
    }

    fn clock_info(&self, handle: DeviceHandle, clock: ClockType) -> Result<u32, NativeStatus> {
        Self::selector(self.extended.clock_info, handle, clock.as_raw())
    }

    fn max_clock_info(&self, handle: DeviceHandle, clock: ClockType) -> Result<u32, NativeStatus> {
        Self::selector(self.extended.max_clock_info, handle, clock.as_raw())
    }

    fn memory_info(&self, handle: DeviceHandle) -> Result<MemoryInfo, NativeStatus> {
        let func = self.extended.memory_info.ok_or(NativeStatus::NOT_SUPPORTED)?;
        // SAFETY: nvmlMemory_t is plain integers; all-zero is valid.
        let mut raw: nvmlMemory_t = unsafe { mem::zeroed() };
        NativeStatus::check(unsafe { func(handle.as_raw(), &mut raw) })?;
        Ok(MemoryInfo::new(raw.total, raw.used, raw.free))
    }

    fn utilization_rates(&self, handle: DeviceHandle) -> Result<Utilization, NativeStatus> {
        let func = self.extended.utilization.ok_or(NativeStatus::NOT_SUPPORTED)?;
        // SAFETY: as above.
        let mut raw: nvmlUtilization_t = unsafe { mem::zeroed() };
        NativeStatus::check(unsafe { func(handle.as_raw(), &mut raw) })?;
        Ok(Utilization::from_raw(raw.gpu, raw.memory))
    }

    fn pci_bus_id(&self, handle: DeviceHandle) -> Result<String, NativeStatus> {
        let func = self.extended.pci_info.ok_or(NativeStatus::NOT_SUPPORTED)?;
        // SAFETY: integers and char arrays only; all-zero is valid.
        let mut raw: nvmlPciInfo_t = unsafe { mem::zeroed() };
        NativeStatus::check(unsafe { func(handle.as_raw(), &mut raw) })?;
        Ok(c_chars_to_string(&raw.busId))
    }

    fn total_ecc_errors(&self, handle: DeviceHandle) -> Result<u64, NativeStatus> {
        let func = self
            .extended
            .total_ecc_errors
            .ok_or(NativeStatus::NOT_SUPPORTED)?;
        let mut count: c_ulonglong = 0;
        // SAFETY: nvmlDeviceGetTotalEccErrors writes one unsigned long long.
        NativeStatus::check(unsafe {
            func(
                handle.as_raw(),
                MEMORY_ERROR_TYPE_UNCORRECTED,
                AGGREGATE_ECC,
                &mut count,
            )
        })?;
        Ok(count)
    }
}

fn stored(
    cell: &OnceLock<Result<Session, TelemetryError>>,
) -> Result<&Session, TelemetryError> {
    cell.get()
        .ok_or_else(|| TelemetryError::SessionInitFailed("session not initialized".to_string()))?
        .as_ref()
        .map_err(Clone::clone)
}

fn open_library(path: Option<&str>) -> Result<Library, TelemetryError> {
    let not_found =
        |e: libloading::Error| TelemetryError::SessionInitFailed(format!("NVML library not found: {}", e));

    // SAFETY: loading NVML runs no initialization code beyond the dynamic
    // linker's.
    match path {
        Some(path) => unsafe { Library::new(path) }.map_err(not_found),
        None => unsafe { Library::new(DEFAULT_LIBRARY) }
            .or_else(|_| unsafe { Library::new(FALLBACK_LIBRARY) })
            .map_err(not_found),
    }
}

fn required<T: Copy>(library: &Library, symbol: &str) -> Result<T, TelemetryError> {
    // SAFETY: callers pair each symbol with its nvml.h prototype.
    let func: Symbol<T> = unsafe { library.get(symbol.as_bytes()) }.map_err(|e| {
        TelemetryError::SessionInitFailed(format!("{} not available: {}", symbol, e))
    })?;
    Ok(*func)
}

fn optional<T: Copy>(library: &Library, symbol: &str) -> Option<T> {
    // SAFETY: as for `required`.
    match unsafe { library.get::<T>(symbol.as_bytes()) } {
        Ok(func) => Some(*func),
        Err(e) => {
            log::debug!("{} not available: {}", symbol, e);
            None
        }
    }
}
