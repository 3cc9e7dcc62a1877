//! Native ABI surface
//!
//! Calling shapes, status codes, handles and struct layouts shared with
//! the NVML C library. Nothing here calls into the library.

use nvml_wrapper_sys::bindings::{
    nvmlDevice_t, nvmlEccCounterType_enum_NVML_AGGREGATE_ECC,
    nvmlMemoryErrorType_enum_NVML_MEMORY_ERROR_TYPE_UNCORRECTED, nvmlMemory_t, nvmlPciInfo_t,
    nvmlReturn_enum_NVML_ERROR_GPU_IS_LOST, nvmlReturn_enum_NVML_ERROR_INSUFFICIENT_SIZE,
    nvmlReturn_enum_NVML_ERROR_INVALID_ARGUMENT, nvmlReturn_enum_NVML_ERROR_NOT_FOUND,
    nvmlReturn_enum_NVML_ERROR_NOT_SUPPORTED, nvmlReturn_enum_NVML_ERROR_NO_PERMISSION,
    nvmlReturn_enum_NVML_ERROR_UNINITIALIZED, nvmlReturn_enum_NVML_ERROR_UNKNOWN,
    nvmlReturn_enum_NVML_SUCCESS, nvmlReturn_t, nvmlUtilization_t,
};
use std::fmt;
use std::os::raw::{c_char, c_uint, c_ulonglong};

/// Text buffer sizes from `nvml.h`. The library guarantees a
/// null-terminated result fits in these.
pub use nvml_wrapper_sys::bindings::{
    NVML_DEVICE_INFOROM_VERSION_BUFFER_SIZE, NVML_DEVICE_NAME_V2_BUFFER_SIZE,
    NVML_DEVICE_PART_NUMBER_BUFFER_SIZE, NVML_DEVICE_SERIAL_BUFFER_SIZE,
    NVML_DEVICE_UUID_V2_BUFFER_SIZE, NVML_DEVICE_VBIOS_VERSION_BUFFER_SIZE,
    NVML_SYSTEM_DRIVER_VERSION_BUFFER_SIZE,
};

/// `(device, *out) -> status`
pub type ScalarFn = unsafe extern "C" fn(nvmlDevice_t, *mut c_uint) -> nvmlReturn_t;

/// `(device, *buf, len) -> status`
pub type TextFn = unsafe extern "C" fn(nvmlDevice_t, *mut c_char, c_uint) -> nvmlReturn_t;

pub type InitFn = unsafe extern "C" fn() -> nvmlReturn_t;
pub type CountFn = unsafe extern "C" fn(*mut c_uint) -> nvmlReturn_t;
pub type HandleByIndexFn = unsafe extern "C" fn(c_uint, *mut nvmlDevice_t) -> nvmlReturn_t;
pub type ErrorStringFn = unsafe extern "C" fn(nvmlReturn_t) -> *const c_char;
pub type SystemTextFn = unsafe extern "C" fn(*mut c_char, c_uint) -> nvmlReturn_t;

/// `(device, selector, *out) -> status`, used for temperature sensors and clocks
pub type SelectorFn = unsafe extern "C" fn(nvmlDevice_t, c_uint, *mut c_uint) -> nvmlReturn_t;
pub type MemoryInfoFn = unsafe extern "C" fn(nvmlDevice_t, *mut nvmlMemory_t) -> nvmlReturn_t;
pub type UtilizationFn =
    unsafe extern "C" fn(nvmlDevice_t, *mut nvmlUtilization_t) -> nvmlReturn_t;
pub type PciInfoFn = unsafe extern "C" fn(nvmlDevice_t, *mut nvmlPciInfo_t) -> nvmlReturn_t;
pub type EccCountFn =
    unsafe extern "C" fn(nvmlDevice_t, c_uint, c_uint, *mut c_ulonglong) -> nvmlReturn_t;

// nvmlDeviceGetTotalEccErrors selectors
pub const MEMORY_ERROR_TYPE_UNCORRECTED: c_uint =
    nvmlMemoryErrorType_enum_NVML_MEMORY_ERROR_TYPE_UNCORRECTED;
pub const AGGREGATE_ECC: c_uint = nvmlEccCounterType_enum_NVML_AGGREGATE_ECC;

/// Raw result code of a native call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeStatus(pub nvmlReturn_t);

impl NativeStatus {
    pub const SUCCESS: Self = Self(nvmlReturn_enum_NVML_SUCCESS);
    pub const UNINITIALIZED: Self = Self(nvmlReturn_enum_NVML_ERROR_UNINITIALIZED);
    pub const INVALID_ARGUMENT: Self = Self(nvmlReturn_enum_NVML_ERROR_INVALID_ARGUMENT);
    pub const NOT_SUPPORTED: Self = Self(nvmlReturn_enum_NVML_ERROR_NOT_SUPPORTED);
    pub const NO_PERMISSION: Self = Self(nvmlReturn_enum_NVML_ERROR_NO_PERMISSION);
    pub const NOT_FOUND: Self = Self(nvmlReturn_enum_NVML_ERROR_NOT_FOUND);
    pub const INSUFFICIENT_SIZE: Self = Self(nvmlReturn_enum_NVML_ERROR_INSUFFICIENT_SIZE);
    pub const GPU_IS_LOST: Self = Self(nvmlReturn_enum_NVML_ERROR_GPU_IS_LOST);
    pub const UNKNOWN: Self = Self(nvmlReturn_enum_NVML_ERROR_UNKNOWN);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Turn a raw return code into `Ok(())` or the failing status
    pub fn check(raw: nvmlReturn_t) -> Result<(), NativeStatus> {
        let status = Self(raw);
        if status.is_success() {
            Ok(())
        } else {
            Err(status)
        }
    }

    /// Built-in message for when `nvmlErrorString` is unavailable
    pub fn description(self) -> &'static str {
        match self.0 {
            0 => "Success",
            1 => "Uninitialized",
            2 => "Invalid Argument",
            3 => "Not Supported",
            4 => "Insufficient Permissions",
            5 => "Already Initialized",
            6 => "Not Found",
            7 => "Insufficient Size",
            8 => "Insufficient External Power",
            9 => "Driver Not Loaded",
            10 => "Timeout",
            11 => "Interrupt Request Issue",
            12 => "NVML Shared Library Not Found",
            13 => "Function Not Found",
            14 => "Corrupted infoROM",
            15 => "GPU is lost",
            16 => "GPU requires restart",
            17 => "GPU access blocked by the operating system",
            18 => "RM has detected an NVML/RM version mismatch",
            19 => "In use by another client",
            20 => "Insufficient Memory",
            21 => "No data",
            22 => "ECC is not supported with vGPU",
            23 => "Insufficient resources",
            _ => "Unknown Error",
        }
    }
}

impl fmt::Display for NativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque device handle handed out by the native library
///
/// Never dereferenced on this side of the ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceHandle(nvmlDevice_t);

// SAFETY: the handle is a capability token owned by the library; this crate
// only passes it back into native calls, which synchronize internally.
unsafe impl Send for DeviceHandle {}
unsafe impl Sync for DeviceHandle {}

impl DeviceHandle {
    pub fn from_raw(raw: nvmlDevice_t) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> nvmlDevice_t {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_check() {
        assert!(NativeStatus::check(nvmlReturn_enum_NVML_SUCCESS).is_ok());
        assert_eq!(
            NativeStatus::check(nvmlReturn_enum_NVML_ERROR_NOT_SUPPORTED),
            Err(NativeStatus::NOT_SUPPORTED)
        );
    }

    #[test]
    fn test_status_description() {
        assert_eq!(NativeStatus::GPU_IS_LOST.description(), "GPU is lost");
        assert_eq!(NativeStatus(4242).description(), "Unknown Error");
    }

    #[test]
    fn test_status_codes_match_header() {
        assert_eq!(NativeStatus::UNINITIALIZED.0, 1);
        assert_eq!(NativeStatus::NOT_SUPPORTED.0, 3);
        assert_eq!(NativeStatus::GPU_IS_LOST.0, 15);
        assert_eq!(NativeStatus::UNKNOWN.0, 999);
        assert_eq!(NativeStatus::UNKNOWN.description(), "Unknown Error");
    }

    #[test]
    fn test_handle_round_trip() {
        let raw = 7usize as nvmlDevice_t;
        assert_eq!(DeviceHandle::from_raw(raw).as_raw(), raw);
    }
}
