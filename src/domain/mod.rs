//! Domain models for nvtel
//!
//! Typed views over raw native values. Conversion from the raw value
//! happens in the named device methods, never in the dispatcher.

pub mod gpu;
pub mod memory;
pub mod performance;
pub mod power;
pub mod thermal;

pub use gpu::GpuInfo;
pub use memory::MemoryInfo;
pub use performance::{ClockType, PerformanceState, Utilization};
pub use power::Power;
pub use thermal::TemperatureSensor;
