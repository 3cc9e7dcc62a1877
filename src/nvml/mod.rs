//! NVML access layer
//!
//! - [`ffi`]: calling shapes, status codes and handles of the C ABI
//! - [`registry`]: name -> native accessor table
//! - [`buffer`]: text buffer marshaling
//! - [`dispatch`]: scalar/text property dispatch
//! - [`session`]: process-wide library initialization
//! - [`device`]: devices and enumeration

pub mod buffer;
pub mod device;
pub mod dispatch;
pub mod ffi;
pub mod registry;
pub mod session;
pub mod traits;

pub use device::{enumerate, enumerate_with, Device, EnumerationPolicy};
pub use dispatch::{get_scalar, get_text};
pub use ffi::{DeviceHandle, NativeStatus};
pub use registry::{PropertyDescriptor, Registry};
pub use session::Session;
pub use traits::NativeLibrary;
