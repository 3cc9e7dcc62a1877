//! Mock implementations for testing
//!
//! Provides a mock native library and `extern "C"` stub accessors so the
//! dispatcher and enumeration can be exercised without real hardware.
//!
//! Mock handles carry the device index in their pointer value; they are
//! never dereferenced.

use crate::domain::{ClockType, MemoryInfo, TemperatureSensor, Utilization};
use crate::error::TelemetryError;
use crate::nvml::dispatch::get_system_text;
use crate::nvml::ffi::{DeviceHandle, NativeStatus, NVML_SYSTEM_DRIVER_VERSION_BUFFER_SIZE};
use crate::nvml::registry::Registry;
use crate::nvml::traits::NativeLibrary;

use nvml_wrapper_sys::bindings::nvmlDevice_t;

/// Set on handles whose UUID accessor should fail
const BROKEN_UUID: usize = 1 << 16;
/// Set on handles whose name accessor should fail
const BROKEN_NAME: usize = 1 << 17;
const INDEX_MASK: usize = 0xFFFF;

/// Mock handle for the device at `index`
pub fn handle(index: u32) -> DeviceHandle {
    DeviceHandle::from_raw(index as usize as nvmlDevice_t)
}

fn handle_index(raw: nvmlDevice_t) -> usize {
    raw as usize & INDEX_MASK
}

/// Native accessor stubs
pub mod stubs {
    use super::{handle_index, BROKEN_NAME, BROKEN_UUID};
    use crate::nvml::ffi::NativeStatus;
    use nvml_wrapper_sys::bindings::{nvmlDevice_t, nvmlReturn_t};
    use std::cell::Cell;
    use std::os::raw::{c_char, c_uint};

    thread_local! {
        static CALLS: Cell<usize> = const { Cell::new(0) };
    }

    /// Stub invocations on the current thread since the last reset
    pub fn calls() -> usize {
        CALLS.with(Cell::get)
    }

    pub fn reset_calls() {
        CALLS.with(|c| c.set(0));
    }

    fn record() {
        CALLS.with(|c| c.set(c.get() + 1));
    }

    const SUCCESS: nvmlReturn_t = NativeStatus::SUCCESS.0;
    const NOT_SUPPORTED: nvmlReturn_t = NativeStatus::NOT_SUPPORTED.0;
    const UNKNOWN: nvmlReturn_t = NativeStatus::UNKNOWN.0;

    /// Copy `bytes` into `buf`, bounded by `length`
    ///
    /// # Safety
    /// `buf` must be valid for `length` bytes.
    unsafe fn write_bytes(buf: *mut c_char, length: c_uint, bytes: &[u8]) {
        let n = bytes.len().min(length as usize);
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), n);
    }

    /// Write `text` plus a terminator, truncated to fit
    unsafe fn write_c_str(buf: *mut c_char, length: c_uint, text: &str) {
        if length == 0 {
            return;
        }
        let n = text.len().min(length as usize - 1);
        write_bytes(buf, length, &text.as_bytes()[..n]);
        *buf.add(n) = 0;
    }

    pub unsafe extern "C" fn scalar_42(_device: nvmlDevice_t, out: *mut c_uint) -> nvmlReturn_t {
        record();
        *out = 42;
        SUCCESS
    }

    pub unsafe extern "C" fn scalar_fail_with_garbage(
        _device: nvmlDevice_t,
        out: *mut c_uint,
    ) -> nvmlReturn_t {
        record();
        *out = 0xDEAD_BEEF;
        NOT_SUPPORTED
    }

    pub unsafe extern "C" fn scalar_index(device: nvmlDevice_t, out: *mut c_uint) -> nvmlReturn_t {
        record();
        *out = handle_index(device) as c_uint;
        SUCCESS
    }

    pub unsafe extern "C" fn scalar_power_usage(
        _device: nvmlDevice_t,
        out: *mut c_uint,
    ) -> nvmlReturn_t {
        record();
        *out = 150_000;
        SUCCESS
    }

    pub unsafe extern "C" fn scalar_one(_device: nvmlDevice_t, out: *mut c_uint) -> nvmlReturn_t {
        record();
        *out = 1;
        SUCCESS
    }

    pub unsafe extern "C" fn scalar_two(_device: nvmlDevice_t, out: *mut c_uint) -> nvmlReturn_t {
        record();
        *out = 2;
        SUCCESS
    }

    pub unsafe extern "C" fn text_name(
        device: nvmlDevice_t,
        buf: *mut c_char,
        length: c_uint,
    ) -> nvmlReturn_t {
        record();
        if device as usize & BROKEN_NAME != 0 {
            return NOT_SUPPORTED;
        }
        write_c_str(buf, length, &format!("Mock GPU {}", handle_index(device)));
        SUCCESS
    }

    pub unsafe extern "C" fn text_uuid(
        device: nvmlDevice_t,
        buf: *mut c_char,
        length: c_uint,
    ) -> nvmlReturn_t {
        record();
        if device as usize & BROKEN_UUID != 0 {
            write_c_str(buf, length, "half-written");
            return UNKNOWN;
        }
        write_c_str(buf, length, &format!("GPU-MOCK-{:04}", handle_index(device)));
        SUCCESS
    }

    pub unsafe extern "C" fn text_serial(
        _device: nvmlDevice_t,
        buf: *mut c_char,
        length: c_uint,
    ) -> nvmlReturn_t {
        record();
        write_c_str(buf, length, "0324117000000");
        SUCCESS
    }

    /// "X" followed by nulls up to `length`
    pub unsafe extern "C" fn text_x_padded(
        _device: nvmlDevice_t,
        buf: *mut c_char,
        length: c_uint,
    ) -> nvmlReturn_t {
        record();
        let mut bytes = vec![0u8; length as usize];
        if let Some(first) = bytes.first_mut() {
            *first = b'X';
        }
        write_bytes(buf, length, &bytes);
        SUCCESS
    }

    pub unsafe extern "C" fn text_abc_garbage(
        _device: nvmlDevice_t,
        buf: *mut c_char,
        length: c_uint,
    ) -> nvmlReturn_t {
        record();
        write_bytes(buf, length, b"abc\0garbage");
        SUCCESS
    }

    pub unsafe extern "C" fn text_empty(
        _device: nvmlDevice_t,
        buf: *mut c_char,
        length: c_uint,
    ) -> nvmlReturn_t {
        record();
        write_c_str(buf, length, "");
        SUCCESS
    }

    pub unsafe extern "C" fn text_fail_with_garbage(
        _device: nvmlDevice_t,
        buf: *mut c_char,
        length: c_uint,
    ) -> nvmlReturn_t {
        record();
        write_c_str(buf, length, "garbage");
        NOT_SUPPORTED
    }

    /// Fills every byte, leaving no terminator
    pub unsafe extern "C" fn text_fill(
        _device: nvmlDevice_t,
        buf: *mut c_char,
        length: c_uint,
    ) -> nvmlReturn_t {
        record();
        write_bytes(buf, length, &vec![b'Z'; length as usize]);
        SUCCESS
    }

    pub unsafe extern "C" fn system_text_version(buf: *mut c_char, length: c_uint) -> nvmlReturn_t {
        record();
        write_c_str(buf, length, "535.154.05");
        SUCCESS
    }

    pub unsafe extern "C" fn system_text_empty(buf: *mut c_char, length: c_uint) -> nvmlReturn_t {
        record();
        write_c_str(buf, length, "");
        SUCCESS
    }

    pub unsafe extern "C" fn error_string(_status: nvmlReturn_t) -> *const c_char {
        b"stub error\0".as_ptr().cast()
    }
}

/// Mock native library
#[derive(Debug)]
pub struct MockLibrary {
    registry: Registry,
    count: u32,
    count_fails: bool,
    broken_handle: Option<u32>,
    broken_uuid: Option<u32>,
    broken_name: Option<u32>,
}

impl MockLibrary {
    /// Create a mock library exposing `count` healthy devices
    ///
    /// `BoardId` is deliberately left unregistered.
    pub fn new(count: u32) -> Self {
        let registry = Registry::builder()
            .scalar("Index", stubs::scalar_index)
            .scalar("FanSpeed", stubs::scalar_42)
            .scalar("PowerUsage", stubs::scalar_power_usage)
            .scalar("MultiGpuBoard", stubs::scalar_one)
            .scalar("PowerState", stubs::scalar_two)
            .text("UUID", stubs::text_uuid, 96)
            .text("Name", stubs::text_name, 96)
            .text("Serial", stubs::text_serial, 30)
            .text("VbiosVersion", stubs::text_x_padded, 32)
            .build();

        Self {
            registry,
            count,
            count_fails: false,
            broken_handle: None,
            broken_uuid: None,
            broken_name: None,
        }
    }

    /// Builder: make the device count query fail
    pub fn with_count_failure(mut self) -> Self {
        self.count_fails = true;
        self
    }

    /// Builder: make handle resolution fail at `index`
    pub fn with_broken_handle(mut self, index: u32) -> Self {
        self.broken_handle = Some(index);
        self
    }

    /// Builder: make UUID resolution fail for the device at `index`
    pub fn with_broken_uuid(mut self, index: u32) -> Self {
        self.broken_uuid = Some(index);
        self
    }

    /// Builder: make name resolution fail for the device at `index`
    pub fn with_broken_name(mut self, index: u32) -> Self {
        self.broken_name = Some(index);
        self
    }
}

impl NativeLibrary for MockLibrary {
    fn registry(&self) -> &Registry {
        &self.registry
    }

    fn device_count(&self) -> Result<u32, NativeStatus> {
        if self.count_fails {
            return Err(NativeStatus::UNINITIALIZED);
        }
        Ok(self.count)
    }

    fn handle_by_index(&self, index: u32) -> Result<DeviceHandle, NativeStatus> {
        if index >= self.count {
            return Err(NativeStatus::INVALID_ARGUMENT);
        }
        if self.broken_handle == Some(index) {
            return Err(NativeStatus::GPU_IS_LOST);
        }
        let mut raw = index as usize;
        if self.broken_uuid == Some(index) {
            raw |= BROKEN_UUID;
        }
        if self.broken_name == Some(index) {
            raw |= BROKEN_NAME;
        }
        Ok(DeviceHandle::from_raw(raw as nvmlDevice_t))
    }

    fn driver_version(&self) -> Result<String, TelemetryError> {
        get_system_text(
            &self.registry,
            "DriverVersion",
            stubs::system_text_version,
            NVML_SYSTEM_DRIVER_VERSION_BUFFER_SIZE,
        )
    }

    fn temperature(
        &self,
        _handle: DeviceHandle,
        sensor: TemperatureSensor,
    ) -> Result<u32, NativeStatus> {
        match sensor {
            TemperatureSensor::Gpu => Ok(45),
        }
    }

    fn clock_info(&self, _handle: DeviceHandle, clock: ClockType) -> Result<u32, NativeStatus> {
        match clock {
            ClockType::Graphics | ClockType::SM => Ok(1_500),
            ClockType::Memory => Ok(7_000),
            ClockType::Video => Err(NativeStatus::NOT_SUPPORTED),
        }
    }

    fn max_clock_info(&self, _handle: DeviceHandle, clock: ClockType) -> Result<u32, NativeStatus> {
        match clock {
            ClockType::Graphics | ClockType::SM => Ok(2_100),
            ClockType::Memory => Ok(7_500),
            ClockType::Video => Err(NativeStatus::NOT_SUPPORTED),
        }
    }

    fn memory_info(&self, _handle: DeviceHandle) -> Result<MemoryInfo, NativeStatus> {
        Ok(MemoryInfo::new(8 << 30, 2 << 30, 6 << 30))
    }

    fn utilization_rates(&self, _handle: DeviceHandle) -> Result<Utilization, NativeStatus> {
        Ok(Utilization::from_raw(30, 10))
    }

    fn pci_bus_id(&self, handle: DeviceHandle) -> Result<String, NativeStatus> {
        Ok(format!("00000000:{:02X}:00.0", handle_index(handle.as_raw())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_handle_index() {
        assert_eq!(handle_index(handle(7).as_raw()), 7);
    }

    #[test]
    fn test_mock_library_handles() {
        let lib = MockLibrary::new(2);
        assert_eq!(lib.device_count().unwrap(), 2);
        assert!(lib.handle_by_index(1).is_ok());
        assert_eq!(
            lib.handle_by_index(5).unwrap_err(),
            NativeStatus::INVALID_ARGUMENT
        );
    }

    #[test]
    fn test_broken_handle() {
        let lib = MockLibrary::new(3).with_broken_handle(1);
        assert_eq!(lib.handle_by_index(1).unwrap_err(), NativeStatus::GPU_IS_LOST);
    }

    #[test]
    fn test_stub_calls_are_counted() {
        stubs::reset_calls();
        let lib = MockLibrary::new(1);
        let _ = crate::nvml::dispatch::get_scalar(lib.registry(), handle(0), "FanSpeed");
        assert_eq!(stubs::calls(), 1);
    }
}
