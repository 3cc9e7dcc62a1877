//! Power domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Power reading as reported by NVML, in milliwatts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Power(u32);

impl Power {
    pub const fn from_milliwatts(mw: u32) -> Self {
        Self(mw)
    }

    #[inline]
    pub const fn as_milliwatts(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}W", self.0 / 1000, self.0 % 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_conversion() {
        let p = Power::from_milliwatts(150_250);
        assert_eq!(p.as_milliwatts(), 150_250);
    }

    #[test]
    fn test_power_display() {
        assert_eq!(Power::from_milliwatts(150_250).to_string(), "150.250W");
        assert_eq!(Power::from_milliwatts(7).to_string(), "0.007W");
    }
}
