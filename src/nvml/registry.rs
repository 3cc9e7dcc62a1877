//! Native accessor registry
//!
//! Maps a property name to the native function that reads it, together
//! with the function's calling shape. The shape is fixed when an entry is
//! registered: a [`ScalarDescriptor`] can only be built from a [`ScalarFn`]
//! and a [`TextDescriptor`] only from a [`TextFn`].
//!
//! A registry is built once and never mutated afterwards, so it can be
//! shared between threads without locking.

use crate::error::TelemetryError;
use crate::nvml::ffi::{
    ErrorStringFn, NativeStatus, ScalarFn, TextFn, NVML_DEVICE_INFOROM_VERSION_BUFFER_SIZE,
    NVML_DEVICE_NAME_V2_BUFFER_SIZE, NVML_DEVICE_PART_NUMBER_BUFFER_SIZE,
    NVML_DEVICE_SERIAL_BUFFER_SIZE, NVML_DEVICE_UUID_V2_BUFFER_SIZE,
    NVML_DEVICE_VBIOS_VERSION_BUFFER_SIZE,
};

use libloading::{Library, Symbol};
use std::collections::BTreeMap;
use std::ffi::CStr;

/// `(property name, native symbol)` for every scalar property
pub const SCALAR_PROPERTIES: &[(&str, &str)] = &[
    ("Index", "nvmlDeviceGetIndex"),
    ("MinorNumber", "nvmlDeviceGetMinorNumber"),
    (
        "InforomConfigurationChecksum",
        "nvmlDeviceGetInforomConfigurationChecksum",
    ),
    ("MaxPCIeLinkGeneration", "nvmlDeviceGetMaxPcieLinkGeneration"),
    ("MaxPCIeLinkWidth", "nvmlDeviceGetMaxPcieLinkWidth"),
    ("CurrPCIeLinkGeneration", "nvmlDeviceGetCurrPcieLinkGeneration"),
    ("CurrPCIeLinkWidth", "nvmlDeviceGetCurrPcieLinkWidth"),
    ("PCIeReplayCounter", "nvmlDeviceGetPcieReplayCounter"),
    ("FanSpeed", "nvmlDeviceGetFanSpeed"),
    ("PowerManagementLimit", "nvmlDeviceGetPowerManagementLimit"),
    (
        "PowerManagementDefaultLimit",
        "nvmlDeviceGetPowerManagementDefaultLimit",
    ),
    ("PowerUsage", "nvmlDeviceGetPowerUsage"),
    ("EnforcedPowerLimit", "nvmlDeviceGetEnforcedPowerLimit"),
    ("BoardId", "nvmlDeviceGetBoardId"),
    ("MultiGpuBoard", "nvmlDeviceGetMultiGpuBoard"),
    ("PowerState", "nvmlDeviceGetPowerState"),
];

/// `(property name, native symbol, buffer length)` for every text property
pub const TEXT_PROPERTIES: &[(&str, &str, u32)] = &[
    ("Name", "nvmlDeviceGetName", NVML_DEVICE_NAME_V2_BUFFER_SIZE),
    ("Serial", "nvmlDeviceGetSerial", NVML_DEVICE_SERIAL_BUFFER_SIZE),
    ("UUID", "nvmlDeviceGetUUID", NVML_DEVICE_UUID_V2_BUFFER_SIZE),
    (
        "InforomImageVersion",
        "nvmlDeviceGetInforomImageVersion",
        NVML_DEVICE_INFOROM_VERSION_BUFFER_SIZE,
    ),
    (
        "VbiosVersion",
        "nvmlDeviceGetVbiosVersion",
        NVML_DEVICE_VBIOS_VERSION_BUFFER_SIZE,
    ),
    (
        "BoardPartNumber",
        "nvmlDeviceGetBoardPartNumber",
        NVML_DEVICE_PART_NUMBER_BUFFER_SIZE,
    ),
];

/// Accessor writing one unsigned integer through an out pointer
#[derive(Debug, Clone, Copy)]
pub struct ScalarDescriptor {
    func: ScalarFn,
}

impl ScalarDescriptor {
    pub fn new(func: ScalarFn) -> Self {
        Self { func }
    }

    pub fn func(&self) -> ScalarFn {
        self.func
    }
}

/// Accessor writing a null-terminated string into a caller buffer
#[derive(Debug, Clone, Copy)]
pub struct TextDescriptor {
    func: TextFn,
    buffer_len: u32,
}

impl TextDescriptor {
    pub fn new(func: TextFn, buffer_len: u32) -> Self {
        Self { func, buffer_len }
    }

    pub fn func(&self) -> TextFn {
        self.func
    }

    /// Maximum buffer size the library needs for this property
    pub fn buffer_len(&self) -> u32 {
        self.buffer_len
    }
}

/// Registry entry
#[derive(Debug, Clone, Copy)]
pub enum PropertyDescriptor {
    Scalar(ScalarDescriptor),
    Text(TextDescriptor),
}

impl PropertyDescriptor {
    /// Short shape name for listings
    pub fn shape(&self) -> &'static str {
        match self {
            PropertyDescriptor::Scalar(_) => "scalar",
            PropertyDescriptor::Text(_) => "text",
        }
    }

    pub fn buffer_len(&self) -> Option<u32> {
        match self {
            PropertyDescriptor::Scalar(_) => None,
            PropertyDescriptor::Text(t) => Some(t.buffer_len()),
        }
    }
}

/// Read-only name -> descriptor table
#[derive(Debug, Default)]
pub struct Registry {
    entries: BTreeMap<String, PropertyDescriptor>,
    error_string: Option<ErrorStringFn>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Resolve every known property against a loaded library
    ///
    /// Symbols the library does not export are left out, so asking for
    /// them later reports an unknown property.
    pub fn resolve(lib: &Library) -> Self {
        let mut builder = Self::builder();

        for &(name, symbol) in SCALAR_PROPERTIES {
            // SAFETY: the symbol type matches the nvml.h prototype for every
            // entry in SCALAR_PROPERTIES.
            match unsafe { lib.get::<ScalarFn>(symbol.as_bytes()) } {
                Ok(func) => builder = builder.scalar(name, *func),
                Err(e) => log::debug!("Skipping property {}: {}", name, e),
            }
        }

        for &(name, symbol, length) in TEXT_PROPERTIES {
            // SAFETY: as above, for TEXT_PROPERTIES.
            match unsafe { lib.get::<TextFn>(symbol.as_bytes()) } {
                Ok(func) => builder = builder.text(name, *func, length),
                Err(e) => log::debug!("Skipping property {}: {}", name, e),
            }
        }

        // SAFETY: nvmlErrorString has the ErrorStringFn prototype.
        let error_string: Option<Symbol<ErrorStringFn>> =
            unsafe { lib.get(b"nvmlErrorString") }.ok();
        if let Some(func) = error_string {
            builder = builder.error_string(*func);
        }

        let registry = builder.build();
        log::debug!("Resolved {} native properties", registry.len());
        registry
    }

    /// Look up a property by its exact, case-sensitive name
    pub fn lookup(&self, name: &str) -> Result<&PropertyDescriptor, TelemetryError> {
        self.entries
            .get(name)
            .ok_or_else(|| TelemetryError::UnknownProperty(name.to_string()))
    }

    /// Look up a property that must have the scalar shape
    pub fn scalar(&self, name: &str) -> Result<&ScalarDescriptor, TelemetryError> {
        match self.lookup(name)? {
            PropertyDescriptor::Scalar(desc) => Ok(desc),
            PropertyDescriptor::Text(_) => Err(TelemetryError::UnknownProperty(name.to_string())),
        }
    }

    /// Look up a property that must have the text shape
    pub fn text(&self, name: &str) -> Result<&TextDescriptor, TelemetryError> {
        match self.lookup(name)? {
            PropertyDescriptor::Text(desc) => Ok(desc),
            PropertyDescriptor::Scalar(_) => Err(TelemetryError::UnknownProperty(name.to_string())),
        }
    }

    /// Human-readable message for a failed native status
    pub fn describe(&self, status: NativeStatus) -> String {
        if let Some(func) = self.error_string {
            // SAFETY: nvmlErrorString returns a pointer to a static string
            // or null.
            let ptr = unsafe { func(status.0) };
            if !ptr.is_null() {
                return unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
            }
        }
        status.description().to_string()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyDescriptor)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects entries before the registry is frozen
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: BTreeMap<String, PropertyDescriptor>,
    error_string: Option<ErrorStringFn>,
}

impl RegistryBuilder {
    /// Register a scalar property (a later entry replaces an earlier one)
    pub fn scalar(mut self, name: impl Into<String>, func: ScalarFn) -> Self {
        self.entries.insert(
            name.into(),
            PropertyDescriptor::Scalar(ScalarDescriptor::new(func)),
        );
        self
    }

    /// Register a text property read through a `buffer_len`-byte buffer
    pub fn text(mut self, name: impl Into<String>, func: TextFn, buffer_len: u32) -> Self {
        self.entries.insert(
            name.into(),
            PropertyDescriptor::Text(TextDescriptor::new(func, buffer_len)),
        );
        self
    }

    pub fn error_string(mut self, func: ErrorStringFn) -> Self {
        self.error_string = Some(func);
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            entries: self.entries,
            error_string: self.error_string,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::stubs;

    fn sample() -> Registry {
        Registry::builder()
            .scalar("FanSpeed", stubs::scalar_42)
            .text("Name", stubs::text_name, 96)
            .build()
    }

    #[test]
    fn test_lookup_registered() {
        let registry = sample();
        assert!(matches!(
            registry.lookup("FanSpeed"),
            Ok(PropertyDescriptor::Scalar(_))
        ));
        assert_eq!(registry.text("Name").unwrap().buffer_len(), 96);
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = sample();
        assert_eq!(
            registry.lookup("fanspeed").unwrap_err(),
            TelemetryError::UnknownProperty("fanspeed".to_string())
        );
    }

    #[test]
    fn test_lookup_wrong_shape() {
        let registry = sample();
        assert!(matches!(
            registry.scalar("Name"),
            Err(TelemetryError::UnknownProperty(_))
        ));
        assert!(matches!(
            registry.text("FanSpeed"),
            Err(TelemetryError::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_describe_without_error_string() {
        let registry = sample();
        assert_eq!(registry.describe(NativeStatus::NOT_SUPPORTED), "Not Supported");
    }

    #[test]
    fn test_describe_with_error_string() {
        let registry = Registry::builder()
            .error_string(stubs::error_string)
            .build();
        assert_eq!(registry.describe(NativeStatus::UNKNOWN), "stub error");
    }

    #[test]
    fn test_property_tables_have_unique_names() {
        let mut names: Vec<&str> = SCALAR_PROPERTIES
            .iter()
            .map(|(n, _)| *n)
            .chain(TEXT_PROPERTIES.iter().map(|(n, _, _)| *n))
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_text_buffer_lengths_cover_identity() {
        for &(name, _, length) in TEXT_PROPERTIES {
            assert!(length > 0, "{} has no buffer", name);
        }
        let uuid = TEXT_PROPERTIES.iter().find(|(n, _, _)| *n == "UUID").unwrap();
        assert!(uuid.2 >= 80);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_resolve_skips_missing_symbols() {
        // libc exports none of the NVML accessors
        let lib = unsafe { Library::new("libc.so.6") }.unwrap();
        let registry = Registry::resolve(&lib);

        assert!(registry.is_empty());
        assert_eq!(
            crate::nvml::dispatch::get_scalar(&registry, crate::mock::handle(0), "FanSpeed"),
            Err(TelemetryError::UnknownProperty("FanSpeed".to_string()))
        );
        assert_eq!(registry.describe(NativeStatus::NOT_FOUND), "Not Found");
    }

    #[test]
    fn test_iter_is_sorted() {
        let registry = sample();
        let names: Vec<&str> = registry.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["FanSpeed", "Name"]);
    }
}
