//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::domain::GpuInfo;
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", render(data, format))
}

/// Render `data` in the selected format
pub fn render<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => data.to_table(),
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Compact => data.to_compact(),
    }
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().trim_end().replace('\n', " | ")
    }
}

/// "N/A" for values the device did not report
fn or_na<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn index_label(index: Option<u32>) -> String {
    or_na(&index)
}

/// GPU list entry for display
#[derive(Debug, Clone, Serialize)]
pub struct GpuListEntry {
    pub index: Option<u32>,
    pub name: String,
    pub uuid: String,
    pub pci_bus_id: Option<String>,
}

impl From<&GpuInfo> for GpuListEntry {
    fn from(info: &GpuInfo) -> Self {
        Self {
            index: info.index,
            name: info.name.clone(),
            uuid: info.uuid.clone(),
            pci_bus_id: info.pci_bus_id.clone(),
        }
    }
}

impl TableDisplay for GpuListEntry {
    fn to_table(&self) -> String {
        format!(
            "[{}] {} (UUID: {}, PCI: {})",
            index_label(self.index),
            self.name,
            self.uuid,
            or_na(&self.pci_bus_id)
        )
    }

    fn to_compact(&self) -> String {
        format!("{}:{}", index_label(self.index), self.name)
    }
}

/// GPU list for display
#[derive(Debug, Clone, Serialize)]
pub struct GpuList {
    pub gpus: Vec<GpuListEntry>,
    pub driver_version: Option<String>,
}

impl TableDisplay for GpuList {
    fn to_table(&self) -> String {
        let mut output = format!("Driver Version: {}\n", or_na(&self.driver_version));
        output.push_str(&format!("GPUs Found: {}\n\n", self.gpus.len()));

        for gpu in &self.gpus {
            output.push_str(&gpu.to_table());
            output.push('\n');
        }

        output
    }

    fn to_compact(&self) -> String {
        self.gpus
            .iter()
            .map(|g| g.to_compact())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Board identity section of a device report
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdentitySection {
    pub serial: Option<String>,
    pub vbios_version: Option<String>,
    pub inforom_image_version: Option<String>,
    pub board_part_number: Option<String>,
    pub board_id: Option<u32>,
    pub minor_number: Option<u32>,
    pub multi_gpu_board: Option<bool>,
}

/// Power section of a device report
#[derive(Debug, Clone, Default, Serialize)]
pub struct PowerSection {
    pub usage_watts: Option<String>,
    pub limit_watts: Option<String>,
    pub default_limit_watts: Option<String>,
    pub enforced_limit_watts: Option<String>,
    pub performance_state: Option<String>,
    pub fan_speed_percent: Option<u32>,
    pub temperature_celsius: Option<u32>,
}

/// PCIe section of a device report
#[derive(Debug, Clone, Default, Serialize)]
pub struct PcieSection {
    pub current_generation: Option<u32>,
    pub max_generation: Option<u32>,
    pub current_width: Option<u32>,
    pub max_width: Option<u32>,
    pub replay_counter: Option<u32>,
}

/// Clock, utilization and memory section of a device report
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClockSection {
    pub clocks: Vec<ClockEntry>,
    pub gpu_utilization_percent: Option<u8>,
    pub memory_utilization_percent: Option<u8>,
    pub memory_used_mib: Option<u64>,
    pub memory_free_mib: Option<u64>,
    pub memory_total_mib: Option<u64>,
    pub memory_usage_percent: Option<u8>,
    pub uncorrected_ecc_errors: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClockEntry {
    pub domain: String,
    pub current_mhz: Option<u32>,
    pub max_mhz: Option<u32>,
}

/// Detailed report for one GPU
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub gpu: GpuListEntry,
    pub identity: IdentitySection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<PowerSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcie: Option<PcieSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clocks: Option<ClockSection>,
}

impl TableDisplay for DeviceReport {
    fn to_table(&self) -> String {
        let id = &self.identity;
        let mut output = format!("[{}] {}\n", index_label(self.gpu.index), self.gpu.name);
        output.push_str(&format!("  UUID:            {}\n", self.gpu.uuid));
        output.push_str(&format!("  PCI Bus ID:      {}\n", or_na(&self.gpu.pci_bus_id)));
        output.push_str(&format!("  Serial:          {}\n", or_na(&id.serial)));
        output.push_str(&format!("  VBIOS:           {}\n", or_na(&id.vbios_version)));
        output.push_str(&format!("  InfoROM:         {}\n", or_na(&id.inforom_image_version)));
        output.push_str(&format!("  Part Number:     {}\n", or_na(&id.board_part_number)));
        output.push_str(&format!("  Board ID:        {}\n", or_na(&id.board_id)));
        output.push_str(&format!("  Minor Number:    {}\n", or_na(&id.minor_number)));
        output.push_str(&format!("  Multi-GPU Board: {}\n", or_na(&id.multi_gpu_board)));

        if let Some(power) = &self.power {
            output.push_str("\n  Power:\n");
            output.push_str(&format!("    Usage:         {}\n", or_na(&power.usage_watts)));
            output.push_str(&format!("    Limit:         {}\n", or_na(&power.limit_watts)));
            output.push_str(&format!(
                "    Default Limit: {}\n",
                or_na(&power.default_limit_watts)
            ));
            output.push_str(&format!(
                "    Enforced:      {}\n",
                or_na(&power.enforced_limit_watts)
            ));
            output.push_str(&format!(
                "    P-State:       {}\n",
                or_na(&power.performance_state)
            ));
            output.push_str(&format!(
                "    Fan Speed:     {}\n",
                power
                    .fan_speed_percent
                    .map(|s| format!("{}%", s))
                    .unwrap_or_else(|| "N/A".to_string())
            ));
            output.push_str(&format!(
                "    Temperature:   {}\n",
                power
                    .temperature_celsius
                    .map(|t| format!("{}°C", t))
                    .unwrap_or_else(|| "N/A".to_string())
            ));
        }

        if let Some(pcie) = &self.pcie {
            output.push_str("\n  PCIe:\n");
            output.push_str(&format!(
                "    Generation:    {} (max {})\n",
                or_na(&pcie.current_generation),
                or_na(&pcie.max_generation)
            ));
            output.push_str(&format!(
                "    Width:         x{} (max x{})\n",
                or_na(&pcie.current_width),
                or_na(&pcie.max_width)
            ));
            output.push_str(&format!("    Replays:       {}\n", or_na(&pcie.replay_counter)));
        }

        if let Some(clocks) = &self.clocks {
            output.push_str("\n  Clocks:\n");
            for clock in &clocks.clocks {
                output.push_str(&format!(
                    "    {:<13}  {} / {} MHz\n",
                    format!("{}:", clock.domain),
                    or_na(&clock.current_mhz),
                    or_na(&clock.max_mhz)
                ));
            }
            output.push_str(&format!(
                "    Utilization:   GPU {}%, Memory {}%\n",
                or_na(&clocks.gpu_utilization_percent),
                or_na(&clocks.memory_utilization_percent)
            ));
            output.push_str(&format!(
                "    Memory:        {} / {} MiB ({}% used, {} MiB free)\n",
                or_na(&clocks.memory_used_mib),
                or_na(&clocks.memory_total_mib),
                or_na(&clocks.memory_usage_percent),
                or_na(&clocks.memory_free_mib)
            ));
            output.push_str(&format!(
                "    ECC Errors:    {}\n",
                or_na(&clocks.uncorrected_ecc_errors)
            ));
        }

        output
    }

    fn to_compact(&self) -> String {
        format!(
            "{}:{} {}",
            index_label(self.gpu.index),
            self.gpu.name,
            self.gpu.uuid
        )
    }
}

/// A property value as read from the device
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyReading {
    Scalar(u32),
    Text(String),
}

impl Display for PropertyReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One GPU's value for a `get` query
#[derive(Debug, Clone, Serialize)]
pub struct PropertyValue {
    pub gpu_index: Option<u32>,
    pub gpu_name: String,
    pub property: String,
    pub value: PropertyReading,
}

impl TableDisplay for PropertyValue {
    fn to_table(&self) -> String {
        format!(
            "[{}] {}: {} = {}",
            index_label(self.gpu_index),
            self.gpu_name,
            self.property,
            self.value
        )
    }

    fn to_compact(&self) -> String {
        self.value.to_string()
    }
}

/// Values of one property across GPUs
#[derive(Debug, Clone, Serialize)]
pub struct PropertyValues {
    pub values: Vec<PropertyValue>,
}

impl TableDisplay for PropertyValues {
    fn to_table(&self) -> String {
        self.values
            .iter()
            .map(|v| v.to_table())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_compact(&self) -> String {
        self.values
            .iter()
            .map(|v| v.to_compact())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A registered property
#[derive(Debug, Clone, Serialize)]
pub struct PropertyEntry {
    pub name: String,
    pub shape: String,
    pub buffer_len: Option<u32>,
}

/// Properties supported by the loaded library
#[derive(Debug, Clone, Serialize)]
pub struct PropertyList {
    pub properties: Vec<PropertyEntry>,
}

impl TableDisplay for PropertyList {
    fn to_table(&self) -> String {
        let mut output = format!("Properties: {}\n\n", self.properties.len());
        output.push_str("  Name                          Shape   Buffer\n");
        output.push_str("  ──────────────────────────────────────────────\n");
        for entry in &self.properties {
            output.push_str(&format!(
                "  {:<29} {:<7} {}\n",
                entry.name,
                entry.shape,
                entry
                    .buffer_len
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ));
        }
        output
    }

    fn to_compact(&self) -> String {
        self.properties
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> GpuListEntry {
        GpuListEntry {
            index: Some(0),
            name: "Test GPU".to_string(),
            uuid: "GPU-123".to_string(),
            pci_bus_id: None,
        }
    }

    #[test]
    fn test_gpu_list_entry_table() {
        let output = entry().to_table();
        assert!(output.contains("Test GPU"));
        assert!(output.contains("GPU-123"));
        assert!(output.contains("PCI: N/A"));
    }

    #[test]
    fn test_unknown_index_label() {
        let mut e = entry();
        e.index = None;
        assert_eq!(e.to_compact(), "N/A:Test GPU");
    }

    #[test]
    fn test_property_reading_json_is_bare() {
        let value = PropertyValue {
            gpu_index: Some(0),
            gpu_name: "Test GPU".to_string(),
            property: "FanSpeed".to_string(),
            value: PropertyReading::Scalar(42),
        };
        let json = render(&value, OutputFormat::Json);
        assert!(json.contains("\"value\": 42"));
        assert_eq!(render(&value, OutputFormat::Compact), "42");
    }

    #[test]
    fn test_report_omits_unrequested_sections() {
        let report = DeviceReport {
            gpu: entry(),
            identity: IdentitySection::default(),
            power: None,
            pcie: Some(PcieSection::default()),
            clocks: None,
        };
        let json = render(&report, OutputFormat::Json);
        assert!(!json.contains("\"power\""));
        assert!(json.contains("\"pcie\""));
        assert!(report.to_table().contains("PCIe:"));
    }

    #[test]
    fn test_property_list_table() {
        let list = PropertyList {
            properties: vec![PropertyEntry {
                name: "Serial".to_string(),
                shape: "text".to_string(),
                buffer_len: Some(30),
            }],
        };
        assert!(list.to_table().contains("Serial"));
        assert_eq!(list.to_compact(), "Serial");
    }
}
