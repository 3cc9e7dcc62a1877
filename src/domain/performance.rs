//! Performance and utilization domain types
//!
//! Types for GPU clocks, utilization rates, and performance states.

use nvml_wrapper_sys::bindings::{
    nvmlClockType_enum_NVML_CLOCK_GRAPHICS, nvmlClockType_enum_NVML_CLOCK_MEM,
    nvmlClockType_enum_NVML_CLOCK_SM, nvmlClockType_enum_NVML_CLOCK_VIDEO,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Clock domain selector (nvmlClockType_t)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockType {
    /// Graphics clock
    Graphics,
    /// Streaming Multiprocessor clock
    SM,
    /// Memory clock
    Memory,
    /// Video encoder/decoder clock
    Video,
}

impl ClockType {
    pub const ALL: [ClockType; 4] = [Self::Graphics, Self::SM, Self::Memory, Self::Video];

    /// Native selector value
    pub fn as_raw(&self) -> u32 {
        match self {
            Self::Graphics => nvmlClockType_enum_NVML_CLOCK_GRAPHICS,
            Self::SM => nvmlClockType_enum_NVML_CLOCK_SM,
            Self::Memory => nvmlClockType_enum_NVML_CLOCK_MEM,
            Self::Video => nvmlClockType_enum_NVML_CLOCK_VIDEO,
        }
    }
}

impl fmt::Display for ClockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Graphics => "Graphics",
            Self::SM => "SM",
            Self::Memory => "Memory",
            Self::Video => "Video",
        };
        write!(f, "{}", name)
    }
}

/// GPU and memory utilization rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Utilization {
    /// GPU compute utilization (0-100%)
    pub gpu: u8,
    /// Memory bandwidth utilization (0-100%)
    pub memory: u8,
}

impl Utilization {
    pub fn new(gpu: u8, memory: u8) -> Self {
        Self {
            gpu: gpu.min(100),
            memory: memory.min(100),
        }
    }

    /// Build from the native percentages, clamping out-of-range values
    pub fn from_raw(gpu: u32, memory: u32) -> Self {
        Self::new(gpu.min(100) as u8, memory.min(100) as u8)
    }
}

/// GPU performance state (P-state)
///
/// Lower numbers = higher performance, higher power
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PerformanceState {
    /// P0..P15
    P(u8),
    /// NVML_PSTATE_UNKNOWN or anything out of range
    #[default]
    Unknown,
}

impl PerformanceState {
    /// Highest valid P-state index
    pub const MAX: u32 = 15;

    /// Create from raw NVML value
    pub fn from_raw(value: u32) -> Self {
        if value <= Self::MAX {
            Self::P(value as u8)
        } else {
            Self::Unknown
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::P(0) => "Maximum Performance",
            Self::P(1) => "High Performance",
            Self::P(2) => "Balanced",
            Self::P(3..=7) => "Adaptive",
            Self::P(8..=11) => "Power Saving",
            Self::P(12) => "Minimum Performance",
            Self::P(_) => "Very Low Power",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PerformanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P(n) => write!(f, "P{}", n),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_type_raw() {
        let raw: Vec<u32> = ClockType::ALL.iter().map(|c| c.as_raw()).collect();
        assert_eq!(raw, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_utilization_clamps() {
        let util = Utilization::from_raw(250, 40);
        assert_eq!(util.gpu, 100);
        assert_eq!(util.memory, 40);
    }

    #[test]
    fn test_performance_state_from_raw() {
        assert_eq!(PerformanceState::from_raw(0), PerformanceState::P(0));
        assert_eq!(PerformanceState::from_raw(2), PerformanceState::P(2));
        assert_eq!(PerformanceState::from_raw(32), PerformanceState::Unknown);
    }

    #[test]
    fn test_performance_state_display() {
        assert_eq!(PerformanceState::P(8).to_string(), "P8");
        assert_eq!(PerformanceState::P(8).description(), "Power Saving");
        assert_eq!(PerformanceState::Unknown.to_string(), "Unknown");
    }
}
