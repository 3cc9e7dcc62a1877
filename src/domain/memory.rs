//! Memory domain types

use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

/// Framebuffer memory in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoryInfo {
    /// Total memory in bytes
    pub total: u64,
    /// Used memory in bytes
    pub used: u64,
    /// Free memory in bytes
    pub free: u64,
}

impl MemoryInfo {
    pub fn new(total: u64, used: u64, free: u64) -> Self {
        Self { total, used, free }
    }

    pub fn total_mib(&self) -> u64 {
        self.total / MIB
    }

    pub fn used_mib(&self) -> u64 {
        self.used / MIB
    }

    pub fn free_mib(&self) -> u64 {
        self.free / MIB
    }

    /// Usage in percent (0 - 100)
    pub fn usage_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.used.saturating_mul(100) / self.total).min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_info() {
        let mem = MemoryInfo::new(8 << 30, 2 << 30, 6 << 30);
        assert_eq!(mem.total_mib(), 8192);
        assert_eq!(mem.used_mib(), 2048);
        assert_eq!(mem.free_mib(), 6144);
        assert_eq!(mem.usage_percent(), 25);
    }

    #[test]
    fn test_memory_info_zero_total() {
        assert_eq!(MemoryInfo::default().usage_percent(), 0);
    }
}
