//! Info command implementation
//!
//! Shows detailed GPU information.

use crate::cli::args::InfoArgs;
use crate::cli::output::{
    print_output, ClockEntry, ClockSection, DeviceReport, GpuListEntry, IdentitySection,
    PcieSection, PowerSection,
};
use crate::config::Config;
use crate::domain::{ClockType, Power};
use crate::error::{Result, TelemetryError};
use crate::nvml::{enumerate_with, Device, NativeLibrary};

use super::select_devices;

/// Execute the info command
pub fn run_info(
    lib: &dyn NativeLibrary,
    config: &Config,
    gpu: Option<u32>,
    args: &InfoArgs,
) -> Result<()> {
    let devices = select_devices(enumerate_with(lib, config.devices.policy())?, gpu)?;

    for device in &devices {
        print_output(&build_report(device, args), config.output.format)?;
    }

    Ok(())
}

/// Property value, or `None` when the device cannot report it
fn available<T>(device: &Device<'_>, result: std::result::Result<T, TelemetryError>) -> Option<T> {
    result
        .inspect_err(|e| log::debug!("{}: {}", device.uuid(), e))
        .ok()
}

fn watts(device: &Device<'_>, result: std::result::Result<u32, TelemetryError>) -> Option<String> {
    available(device, result).map(|mw| Power::from_milliwatts(mw).to_string())
}

/// Collect the sections selected by `args` for one device
pub fn build_report(device: &Device<'_>, args: &InfoArgs) -> DeviceReport {
    let all = args.shows_all();

    let identity = IdentitySection {
        serial: available(device, device.serial()),
        vbios_version: available(device, device.vbios_version()),
        inforom_image_version: available(device, device.inforom_image_version()),
        board_part_number: available(device, device.board_part_number()),
        board_id: available(device, device.board_id()),
        minor_number: available(device, device.minor_number()),
        multi_gpu_board: available(device, device.multi_gpu_board()),
    };

    let power = (all || args.power).then(|| PowerSection {
        usage_watts: watts(device, device.power_usage()),
        limit_watts: watts(device, device.power_management_limit()),
        default_limit_watts: watts(device, device.power_management_default_limit()),
        enforced_limit_watts: watts(device, device.enforced_power_limit()),
        performance_state: available(device, device.performance_state())
            .map(|p| format!("{} ({})", p, p.description())),
        fan_speed_percent: available(device, device.fan_speed()),
        temperature_celsius: available(device, device.temperature()),
    });

    let pcie = (all || args.pcie).then(|| PcieSection {
        current_generation: available(device, device.curr_pcie_link_generation()),
        max_generation: available(device, device.max_pcie_link_generation()),
        current_width: available(device, device.curr_pcie_link_width()),
        max_width: available(device, device.max_pcie_link_width()),
        replay_counter: available(device, device.pcie_replay_counter()),
    });

    let clocks = (all || args.clocks).then(|| {
        let utilization = available(device, device.utilization_rates());
        let memory = available(device, device.memory_info());
        ClockSection {
            clocks: ClockType::ALL
                .iter()
                .map(|&clock| ClockEntry {
                    domain: clock.to_string(),
                    current_mhz: available(device, device.clock_info(clock)),
                    max_mhz: available(device, device.max_clock_info(clock)),
                })
                .collect(),
            gpu_utilization_percent: utilization.map(|u| u.gpu),
            memory_utilization_percent: utilization.map(|u| u.memory),
            memory_used_mib: memory.map(|m| m.used_mib()),
            memory_free_mib: memory.map(|m| m.free_mib()),
            memory_total_mib: memory.map(|m| m.total_mib()),
            memory_usage_percent: memory.map(|m| m.usage_percent()),
            uncorrected_ecc_errors: available(device, device.total_ecc_errors()),
        }
    });

    DeviceReport {
        gpu: GpuListEntry::from(&device.info()),
        identity,
        power,
        pcie,
        clocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLibrary;
    use crate::nvml::enumerate;

    #[test]
    fn test_full_report() {
        let lib = MockLibrary::new(1);
        let devices = enumerate(&lib).unwrap();
        let report = build_report(&devices[0], &InfoArgs::default());

        assert_eq!(report.gpu.uuid, "GPU-MOCK-0000");
        assert_eq!(report.identity.serial.as_deref(), Some("0324117000000"));
        assert_eq!(report.identity.board_id, None);
        assert_eq!(report.identity.multi_gpu_board, Some(true));

        let power = report.power.unwrap();
        assert_eq!(power.usage_watts.as_deref(), Some("150.000W"));
        assert_eq!(power.fan_speed_percent, Some(42));
        assert_eq!(power.temperature_celsius, Some(45));
        assert_eq!(power.performance_state.as_deref(), Some("P2 (Balanced)"));

        let clocks = report.clocks.unwrap();
        assert_eq!(clocks.clocks.len(), 4);
        assert_eq!(clocks.clocks[0].current_mhz, Some(1_500));
        assert_eq!(clocks.clocks[3].current_mhz, None);
        assert_eq!(clocks.memory_total_mib, Some(8 * 1024));
        assert_eq!(clocks.memory_free_mib, Some(6 * 1024));
        assert_eq!(clocks.memory_usage_percent, Some(25));
        assert_eq!(clocks.uncorrected_ecc_errors, None);
    }

    #[test]
    fn test_report_sections() {
        let lib = MockLibrary::new(1);
        let devices = enumerate(&lib).unwrap();
        let args = InfoArgs {
            pcie: true,
            ..InfoArgs::default()
        };
        let report = build_report(&devices[0], &args);
        assert!(report.power.is_none());
        assert!(report.clocks.is_none());
        assert!(report.pcie.is_some());
    }
}
