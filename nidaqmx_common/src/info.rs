//! Plain-data snapshots of the system, its devices and a task, rendered as the indented text
//! report returned by `get_info_str`.
//!
//! The back-end fills these structs from driver queries; rendering them needs no driver.

use indexmap::IndexMap;
use std::fmt;

use crate::pattern::make_pattern;

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}

// Channel lists are compressed when possible, and printed verbatim otherwise
fn pattern_or_none(names: &[String]) -> String {
    match make_pattern(names) {
        Ok(pattern) if !pattern.is_empty() => pattern,
        Ok(_) => "None".to_string(),
        Err(_) => join_or_none(names),
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviceInfo {
    pub product_type: String,
    pub product_number: u32,
    pub serial_number: u32,
    pub bus: String,
    pub ai_channels: Vec<String>,
    pub ao_channels: Vec<String>,
    pub di_lines: Vec<String>,
    pub di_ports: Vec<String>,
    pub do_lines: Vec<String>,
    pub do_ports: Vec<String>,
    pub ci_channels: Vec<String>,
    pub co_channels: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SystemInfo {
    pub version: String,
    pub global_channels: Vec<String>,
    pub tasks: Vec<String>,
    /// Devices keyed by name, in driver enumeration order.
    pub devices: IndexMap<String, DeviceInfo>,
}

/// Properties shown for every channel of a task. Analog-only properties are `None` for other
/// channel types.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelInfo {
    pub name: String,
    pub physical_name: String,
    pub channel_type: String,
    pub is_global: bool,
    pub measurement_type: Option<String>,
    /// `(min, max, units)`
    pub limits: Option<(f64, f64, String)>,
    pub data_transfer_mechanism: Option<String>,
    /// `(high, low)` range, analog input only
    pub range: Option<(f64, f64)>,
    pub auto_zero_mode: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskInfo {
    pub name: String,
    pub devices: Vec<String>,
    pub channel_type: String,
    pub channel_io_type: String,
    pub buffer_size: u32,
    pub channels: Vec<ChannelInfo>,
    pub system: Option<SystemInfo>,
}

impl fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let device_names: Vec<String> = self.devices.keys().cloned().collect();
        writeln!(f, "NIDAQmx version: {}", self.version)?;
        writeln!(f, "System devices: {}", join_or_none(&device_names))?;
        writeln!(f, "System global channels: {}", join_or_none(&self.global_channels))?;
        write!(f, "System tasks: {}", join_or_none(&self.tasks))?;
        for (name, dev) in &self.devices {
            write!(f, "\n Device: {}", name)?;
            write!(f, "\n  Product type: {}", dev.product_type)?;
            write!(f, "\n  Product number: {}", dev.product_number)?;
            write!(f, "\n  Serial number: {}", dev.serial_number)?;
            write!(f, "\n  Bus: {}", dev.bus)?;
            for (label, names) in [
                ("Analog input channels", &dev.ai_channels),
                ("Analog output channels", &dev.ao_channels),
                ("Digital input lines", &dev.di_lines),
                ("Digital input ports", &dev.di_ports),
                ("Digital output lines", &dev.do_lines),
                ("Digital output ports", &dev.do_ports),
                ("Counter input channels", &dev.ci_channels),
                ("Counter output channels", &dev.co_channels),
            ] {
                write!(f, "\n  {}: {}", label, pattern_or_none(names))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for TaskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Task block is indented one level when preceded by the system report
        let tab = match &self.system {
            Some(system) => {
                writeln!(f, "{}", system)?;
                "  "
            }
            None => "",
        };
        let head = &tab[..tab.len().saturating_sub(1)];
        let names: Vec<String> = self.channels.iter().map(|c| c.name.clone()).collect();

        write!(f, "{}Task name: {}", head, self.name)?;
        write!(f, "\n{}Names of devices: {}", tab, join_or_none(&self.devices))?;
        write!(f, "\n{}Number of channels: {}", tab, self.channels.len())?;
        write!(f, "\n{}Names of channels: {}", tab, join_or_none(&names))?;
        write!(f, "\n{}Channel type: {}", tab, self.channel_type)?;
        write!(f, "\n{}Channel I/O type: {}", tab, self.channel_io_type)?;
        write!(f, "\n{}Buffer size: {}", tab, self.buffer_size)?;

        let tab = format!("{}  ", tab);
        let head = &tab[..tab.len() - 1];
        for chan in &self.channels {
            write!(f, "\n{}Channel name: {}", head, chan.name)?;
            write!(f, "\n{}Physical channel name: {}", tab, chan.physical_name)?;
            write!(f, "\n{}Channel type: {}", tab, chan.channel_type)?;
            write!(f, "\n{}Is global: {}", tab, chan.is_global)?;
            if let Some(meas) = &chan.measurement_type {
                write!(f, "\n{}Measurement type: {}", tab, meas)?;
            }
            if let Some((min, max, units)) = &chan.limits {
                write!(f, "\n{}Minimum/Maximum values: {}/{} {}", tab, min, max, units)?;
            }
            if let Some(mech) = &chan.data_transfer_mechanism {
                write!(f, "\n{}Data transfer mechanism: {}", tab, mech)?;
            }
            if let Some((high, low)) = &chan.range {
                write!(f, "\n{}High/Low values: {}/{}", tab, high, low)?;
            }
            if let Some(mode) = &chan.auto_zero_mode {
                write!(f, "\n{}Auto zero mode: {}", tab, mode)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ai_task() -> TaskInfo {
        TaskInfo {
            name: "measure voltage".to_string(),
            devices: vec!["Dev1".to_string()],
            channel_type: "AI".to_string(),
            channel_io_type: "input".to_string(),
            buffer_size: 1000,
            channels: vec![ChannelInfo {
                name: "measure".to_string(),
                physical_name: "Dev1/ai8".to_string(),
                channel_type: "AI".to_string(),
                is_global: false,
                measurement_type: Some("voltage".to_string()),
                limits: Some((-1.0, 1.0, "volts".to_string())),
                data_transfer_mechanism: Some("dma".to_string()),
                range: Some((1.0, -1.0)),
                auto_zero_mode: Some("none".to_string()),
            }],
            system: None,
        }
    }

    #[test]
    fn task_report() {
        let expected = "Task name: measure voltage\n\
                        Names of devices: Dev1\n\
                        Number of channels: 1\n\
                        Names of channels: measure\n\
                        Channel type: AI\n\
                        Channel I/O type: input\n\
                        Buffer size: 1000\n \
                        Channel name: measure\n  \
                        Physical channel name: Dev1/ai8\n  \
                        Channel type: AI\n  \
                        Is global: false\n  \
                        Measurement type: voltage\n  \
                        Minimum/Maximum values: -1/1 volts\n  \
                        Data transfer mechanism: dma\n  \
                        High/Low values: 1/-1\n  \
                        Auto zero mode: none";
        assert_eq!(ai_task().to_string(), expected);
    }

    #[test]
    fn empty_task_report() {
        let info = TaskInfo {
            name: "_unnamedTask<0>".to_string(),
            channel_type: "DO".to_string(),
            channel_io_type: "output".to_string(),
            ..Default::default()
        };
        let text = info.to_string();
        assert!(text.contains("Names of devices: None"));
        assert!(text.contains("Number of channels: 0"));
        assert!(!text.contains("Channel name"));
    }

    #[test]
    fn system_report_compresses_channels() {
        let mut devices = IndexMap::new();
        devices.insert(
            "Dev1".to_string(),
            DeviceInfo {
                product_type: "PCIe-6259".to_string(),
                bus: "PCIe (bus=3, device=0)".to_string(),
                ai_channels: (0..32).map(|i| format!("Dev1/ai{}", i)).collect(),
                do_lines: vec!["Dev1/port0/line0".to_string(), "Dev1/port0/line1".to_string()],
                ..Default::default()
            },
        );
        let mut info = ai_task();
        info.system = Some(SystemInfo {
            version: "8.0".to_string(),
            devices,
            ..Default::default()
        });
        let text = info.to_string();
        assert!(text.starts_with("NIDAQmx version: 8.0\nSystem devices: Dev1\n"));
        assert!(text.contains("\n Device: Dev1\n  Product type: PCIe-6259"));
        assert!(text.contains("\n  Analog input channels: Dev1/ai0:31"));
        assert!(text.contains("\n  Digital output lines: Dev1/port0/line0:1"));
        assert!(text.contains("\n  Counter output channels: None"));
        // Task block moves one level in
        assert!(text.contains("\n Task name: measure voltage\n  Names of devices: Dev1"));
        assert!(text.contains("\n   Channel name: measure\n    Physical channel name: Dev1/ai8"));
    }
}
