//! GPU identity domain type
//!
//! Provides the GpuInfo struct for GPU identification and metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// GPU identity as cached on a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuInfo {
    /// NVML index, when the device reported one
    pub index: Option<u32>,
    /// GPU name (e.g., "Tesla K40m")
    pub name: String,
    /// Unique GPU UUID
    pub uuid: String,
    /// PCI bus ID
    pub pci_bus_id: Option<String>,
}

impl GpuInfo {
    /// Create new GPU info
    pub fn new(name: String, uuid: String) -> Self {
        Self {
            index: None,
            name,
            uuid,
            pci_bus_id: None,
        }
    }

    /// Set the NVML index
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the PCI bus ID
    pub fn with_pci_bus_id(mut self, bus_id: String) -> Self {
        self.pci_bus_id = Some(bus_id);
        self
    }
}

impl fmt::Display for GpuInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "[{}] {}", index, self.name),
            None => write!(f, "[?] {}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_info_display() {
        let info = GpuInfo::new("Tesla K40m".to_string(), "GPU-xxx".to_string()).with_index(0);
        assert_eq!(info.to_string(), "[0] Tesla K40m");
    }

    #[test]
    fn test_gpu_info_display_without_index() {
        let info = GpuInfo::new("Tesla K40m".to_string(), "GPU-xxx".to_string());
        assert_eq!(info.to_string(), "[?] Tesla K40m");
    }


    #[test]
    fn test_gpu_info_builder() {
        let info = GpuInfo::new("Test GPU".to_string(), "GPU-123".to_string())
            .with_index(2)
            .with_pci_bus_id("00000000:02:00.0".to_string());

        assert_eq!(info.index, Some(2));
        assert_eq!(info.pci_bus_id.as_deref(), Some("00000000:02:00.0"));
    }
}
