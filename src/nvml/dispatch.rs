//! Property dispatcher
//!
//! Looks a property up in the [`Registry`], calls the native accessor with
//! the right shape and translates the native status into a typed result.
//! Raw status codes never escape this module except inside
//! [`TelemetryError::NativeCallFailed`].

use crate::error::TelemetryError;
use crate::nvml::buffer::TextBuffer;
use crate::nvml::ffi::{DeviceHandle, NativeStatus, SystemTextFn};
use crate::nvml::registry::Registry;

use std::os::raw::c_uint;

/// Read a scalar property. The value is returned uninterpreted.
pub fn get_scalar(
    registry: &Registry,
    handle: DeviceHandle,
    name: &str,
) -> Result<u32, TelemetryError> {
    let desc = registry.scalar(name)?;

    let mut value: c_uint = 0;
    // SAFETY: the descriptor can only hold a ScalarFn, and `value` outlives the call.
    let raw = unsafe { (desc.func())(handle.as_raw(), &mut value) };

    NativeStatus::check(raw).map_err(|status| native_failure(registry, name, status))?;
    log::debug!("{} = {}", name, value);
    Ok(value)
}

/// Read a text property through a scoped buffer of the registered size
pub fn get_text(
    registry: &Registry,
    handle: DeviceHandle,
    name: &str,
) -> Result<String, TelemetryError> {
    let desc = registry.text(name)?;

    let mut buffer = TextBuffer::new(desc.buffer_len());
    // SAFETY: the buffer is exactly `buffer.capacity()` bytes and lives
    // until the end of this function.
    let raw = unsafe { (desc.func())(handle.as_raw(), buffer.as_mut_ptr(), buffer.capacity()) };

    NativeStatus::check(raw).map_err(|status| native_failure(registry, name, status))?;

    let value = buffer.to_string_lossy();
    if value.is_empty() {
        return Err(TelemetryError::EmptyResult(name.to_string()));
    }

    log::debug!("{} = {:?}", name, value);
    Ok(value)
}

/// Read a device-independent text value, such as the driver version
pub fn get_system_text(
    registry: &Registry,
    name: &str,
    func: SystemTextFn,
    length: u32,
) -> Result<String, TelemetryError> {
    let mut buffer = TextBuffer::new(length);
    // SAFETY: the buffer is exactly `buffer.capacity()` bytes.
    let raw = unsafe { func(buffer.as_mut_ptr(), buffer.capacity()) };

    NativeStatus::check(raw).map_err(|status| native_failure(registry, name, status))?;

    let value = buffer.to_string_lossy();
    if value.is_empty() {
        return Err(TelemetryError::EmptyResult(name.to_string()));
    }
    Ok(value)
}

/// Build the error payload for a failed native call
pub fn native_failure(registry: &Registry, name: &str, status: NativeStatus) -> TelemetryError {
    TelemetryError::NativeCallFailed {
        property: name.to_string(),
        status,
        message: registry.describe(status),
    }
}
