//! Typed string options of the binding.
//!
//! Python callers pass options as lowercase strings (`edge="falling"`, `sample_mode="finite"`).
//! Every option is an enum generated by [`daqmx_option!`], which provides:
//! - [`std::str::FromStr`] from the string name, failing with [`DaqmxError::InvalidOption`] that
//!   lists the accepted names;
//! - `val()`, the vendor constant passed to the C-function;
//! - `from_val()`, the inverse used when the driver reports a property back;
//! - `name()` and [`std::fmt::Display`], the string name again.

use std::fmt;
use std::str::FromStr;

use crate::constants::*;
use crate::error::{DaqmxError, Result};

#[macro_export]
macro_rules! daqmx_option {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $variant:ident => $text:literal = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            pub const NAMES: &'static [&'static str] = &[$( $text ),+];

            pub fn val(self) -> i32 {
                match self {
                    $( $name::$variant => $val ),+
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }

            pub fn from_val(value: i32) -> $crate::error::Result<Self> {
                $(
                    if value == $val {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::error::DaqmxError::UnexpectedValue { label: $label, value })
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::DaqmxError;

            fn from_str(s: &str) -> $crate::error::Result<Self> {
                $(
                    if s == $text {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::error::DaqmxError::InvalidOption {
                    label: $label,
                    expected: Self::NAMES.join("|"),
                    got: s.to_string(),
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.name())
            }
        }
    };
}

daqmx_option!(
    /// Active edge of a clock or digital trigger.
    Edge, "edge" {
        Rising => "rising" = DAQMX_VAL_RISING,
        Falling => "falling" = DAQMX_VAL_FALLING,
    }
);

daqmx_option!(
    SampleMode, "sample_mode" {
        Finite => "finite" = DAQMX_VAL_FINITESAMPS,
        Continuous => "continuous" = DAQMX_VAL_CONTSAMPS,
        HwTimed => "hwtimed" = DAQMX_VAL_HWTIMEDSINGLEPOINT,
    }
);

daqmx_option!(
    /// Input terminal configuration of analog input channels.
    TerminalConfig, "terminal" {
        Default => "default" = DAQMX_VAL_CFG_DEFAULT,
        Rse => "rse" = DAQMX_VAL_RSE,
        Nrse => "nrse" = DAQMX_VAL_NRSE,
        Diff => "diff" = DAQMX_VAL_DIFF,
        PseudoDiff => "pseudodiff" = DAQMX_VAL_PSEUDODIFF,
    }
);

impl TerminalConfig {
    /// Terminal names are accepted in any case (`"RSE"`, `"Diff"`).
    pub fn parse_any_case(s: &str) -> Result<Self> {
        s.to_lowercase().parse()
    }
}

daqmx_option!(
    VoltageUnits, "units" {
        Volts => "volts" = DAQMX_VAL_VOLTS,
        Custom => "custom" = DAQMX_VAL_FROMCUSTOMSCALE,
    }
);

daqmx_option!(
    /// Sample ordering of read and write buffers (`fill_mode` for reads, `layout` for writes).
    FillMode, "fill_mode" {
        GroupByChannel => "group_by_channel" = DAQMX_VAL_GROUPBYCHANNEL as i32,
        GroupByScanNumber => "group_by_scan_number" = DAQMX_VAL_GROUPBYSCANNUMBER as i32,
    }
);

daqmx_option!(
    LineGrouping, "grouping" {
        PerLine => "per_line" = DAQMX_VAL_CHANPERLINE,
        ForAllLines => "for_all_lines" = DAQMX_VAL_CHANFORALLLINES,
    }
);

daqmx_option!(
    /// Actions of `DAQmxTaskControl`.
    TaskAction, "state" {
        Start => "start" = DAQMX_VAL_TASK_START,
        Stop => "stop" = DAQMX_VAL_TASK_STOP,
        Verify => "verify" = DAQMX_VAL_TASK_VERIFY,
        Commit => "commit" = DAQMX_VAL_TASK_COMMIT,
        Reserve => "reserve" = DAQMX_VAL_TASK_RESERVE,
        Unreserve => "unreserve" = DAQMX_VAL_TASK_UNRESERVE,
        Abort => "abort" = DAQMX_VAL_TASK_ABORT,
    }
);

daqmx_option!(
    /// Signals that can raise a signal event.
    Signal, "signalID" {
        SampleClock => "sample_clock" = DAQMX_VAL_SAMPLECLOCK,
        SampleComplete => "sample_complete" = DAQMX_VAL_SAMPLECOMPLETEEVENT,
        ChangeDetection => "change_detection" = DAQMX_VAL_CHANGEDETECTIONEVENT,
        CounterOutput => "counter_output" = DAQMX_VAL_COUNTEROUTPUTEVENT,
    }
);

daqmx_option!(
    /// Signals that can be routed to a terminal with `DAQmxExportSignal`.
    ExportSignal, "signal" {
        StartTrigger => "start_trigger" = DAQMX_VAL_STARTTRIGGER,
        RefClock10MHz => "ref_clock_10mhz" = DAQMX_VAL_10MHZREFCLOCK,
        SampleClock => "sample_clock" = DAQMX_VAL_SAMPLECLOCK,
    }
);

daqmx_option!(
    Slope, "slope" {
        Rising => "rising" = DAQMX_VAL_RISING_SLOPE,
        Falling => "falling" = DAQMX_VAL_FALLING_SLOPE,
    }
);

daqmx_option!(
    WindowTrigger, "when" {
        Entering => "entering" = DAQMX_VAL_ENTERINGWIN,
        Leaving => "leaving" = DAQMX_VAL_LEAVINGWIN,
    }
);

daqmx_option!(
    PatternTrigger, "when" {
        Matches => "matches" = DAQMX_VAL_PATTERNMATCHES,
        DoesNotMatch => "does_not_match" = DAQMX_VAL_PATTERNDOESNOTMATCH,
    }
);

daqmx_option!(
    /// Pause trigger type. `"none"` disables the pause trigger.
    PauseTrigger, "trigger_type" {
        DigitalLevel => "digital_level" = DAQMX_VAL_DIGLVL,
        AnalogLevel => "analog_level" = DAQMX_VAL_ANLGLVL,
        AnalogWindow => "analog_window" = DAQMX_VAL_ANLGWIN,
        Disabled => "none" = DAQMX_VAL_NONE,
    }
);

daqmx_option!(
    /// Condition under which a pause trigger pauses the task. Which conditions apply depends
    /// on the selected [`PauseTrigger`].
    PauseWhen, "when" {
        High => "high" = DAQMX_VAL_HIGH,
        Low => "low" = DAQMX_VAL_LOW,
        Above => "above" = DAQMX_VAL_ABOVELVL,
        Below => "below" = DAQMX_VAL_BELOWLVL,
        Inside => "inside" = DAQMX_VAL_INSIDEWIN,
        Outside => "outside" = DAQMX_VAL_OUTSIDEWIN,
    }
);

impl PauseTrigger {
    /// Conditions accepted by `set_pause_trigger_when` for this trigger type.
    pub fn when_options(self) -> &'static [PauseWhen] {
        match self {
            PauseTrigger::DigitalLevel => &[PauseWhen::High, PauseWhen::Low],
            PauseTrigger::AnalogLevel => &[PauseWhen::Above, PauseWhen::Below],
            PauseTrigger::AnalogWindow => &[PauseWhen::Inside, PauseWhen::Outside],
            PauseTrigger::Disabled => &[],
        }
    }
}

impl PauseWhen {
    /// Parses `s` and checks that it is a valid condition of `trigger`.
    pub fn parse_for(trigger: PauseTrigger, s: &str) -> Result<Self> {
        let options = trigger.when_options();
        match s.parse::<PauseWhen>() {
            Ok(when) if options.contains(&when) => Ok(when),
            _ => Err(DaqmxError::InvalidOption {
                label: "when",
                expected: options
                    .iter()
                    .map(|w| w.name())
                    .collect::<Vec<_>>()
                    .join("|"),
                got: s.to_string(),
            }),
        }
    }
}

daqmx_option!(
    /// Arm start trigger type. `"disable"` turns the arm start trigger off.
    ArmStartTrigger, "trigger_type" {
        DigitalEdge => "digital_edge" = DAQMX_VAL_DIGEDGE,
        Disable => "disable" = DAQMX_VAL_NONE,
    }
);

daqmx_option!(
    CountDirection, "direction" {
        Up => "up" = DAQMX_VAL_COUNTUP,
        Down => "down" = DAQMX_VAL_COUNTDOWN,
        Ext => "ext" = DAQMX_VAL_EXTCONTROLLED,
    }
);

daqmx_option!(
    IdleState, "idle_state" {
        Low => "low" = DAQMX_VAL_LOW,
        High => "high" = DAQMX_VAL_HIGH,
    }
);

daqmx_option!(
    FrequencyUnits, "units" {
        Hertz => "hertz" = DAQMX_VAL_HZ,
    }
);

daqmx_option!(
    TimeUnits, "units" {
        Seconds => "seconds" = DAQMX_VAL_SECONDS,
    }
);

daqmx_option!(
    /// Channel type of a task. A task holds channels of a single type.
    ChannelType, "channel_type" {
        AI => "AI" = DAQMX_VAL_AI,
        AO => "AO" = DAQMX_VAL_AO,
        DI => "DI" = DAQMX_VAL_DI,
        DO => "DO" = DAQMX_VAL_DO,
        CI => "CI" = DAQMX_VAL_CI,
        CO => "CO" = DAQMX_VAL_CO,
    }
);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoType {
    Input,
    Output,
}

impl IoType {
    pub fn name(self) -> &'static str {
        match self {
            IoType::Input => "input",
            IoType::Output => "output",
        }
    }

    /// Capitalized form used in DAQmx function names (`DAQmxCfgInputBuffer`).
    pub fn title(self) -> &'static str {
        match self {
            IoType::Input => "Input",
            IoType::Output => "Output",
        }
    }
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl ChannelType {
    pub fn io_type(self) -> IoType {
        match self {
            ChannelType::AI | ChannelType::DI | ChannelType::CI => IoType::Input,
            ChannelType::AO | ChannelType::DO | ChannelType::CO => IoType::Output,
        }
    }

    pub fn is_analog(self) -> bool {
        matches!(self, ChannelType::AI | ChannelType::AO)
    }

    pub fn is_digital(self) -> bool {
        matches!(self, ChannelType::DI | ChannelType::DO)
    }
}

daqmx_option!(
    BusType, "bus_type" {
        Pci => "PCI" = DAQMX_VAL_PCI,
        PciE => "PCIe" = DAQMX_VAL_PCIE,
        Pxi => "PXI" = DAQMX_VAL_PXI,
        PxiE => "PXIe" = DAQMX_VAL_PXIE,
        Scxi => "SCXI" = DAQMX_VAL_SCXI,
        Scc => "SCC" = DAQMX_VAL_SCC,
        PcCard => "PCCard" = DAQMX_VAL_PCCARD,
        Usb => "USB" = DAQMX_VAL_USB,
        CompactDaq => "CompactDAQ" = DAQMX_VAL_COMPACTDAQ,
        TcpIp => "TCPIP" = DAQMX_VAL_TCPIP,
        SwitchBlock => "SwitchBlock" = DAQMX_VAL_SWITCHBLOCK,
        Unknown => "UNKNOWN" = DAQMX_VAL_UNKNOWN,
    }
);

daqmx_option!(
    /// Measurement type of AI channels, or output type of AO channels. All temperature sensors
    /// share the name `"temperature"`.
    MeasurementType, "measurement_type" {
        Voltage => "voltage" = DAQMX_VAL_VOLTAGE,
        Current => "current" = DAQMX_VAL_CURRENT,
        VoltageWithExcitation => "voltage_with_excitation" = DAQMX_VAL_VOLTAGE_CUSTOMWITHEXCITATION,
        FreqVoltage => "freq_voltage" = DAQMX_VAL_FREQ_VOLTAGE,
        Resistance => "resistance" = DAQMX_VAL_RESISTANCE,
        TemperatureTC => "temperature" = DAQMX_VAL_TEMP_TC,
        TemperatureThermistor => "temperature" = DAQMX_VAL_TEMP_THRMSTR,
        TemperatureRTD => "temperature" = DAQMX_VAL_TEMP_RTD,
        TemperatureBuiltIn => "temperature" = DAQMX_VAL_TEMP_BUILTINSENSOR,
        Strain => "strain" = DAQMX_VAL_STRAIN_GAGE,
        PositionLvdt => "position_lvdt" = DAQMX_VAL_POSITION_LVDT,
        PositionRvdt => "position_rvdt" = DAQMX_VAL_POSITION_RVDT,
        Acceleration => "acceleration" = DAQMX_VAL_ACCELEROMETER,
        Pressure => "pressure" = DAQMX_VAL_SOUNDPRESSURE_MICROPHONE,
        Teds => "TEDS" = DAQMX_VAL_TEDS_SENSOR,
    }
);

daqmx_option!(
    AutoZeroMode, "auto_zero_mode" {
        None => "none" = DAQMX_VAL_NONE,
        Once => "once" = DAQMX_VAL_ONCE,
        EverySample => "every_sample" = DAQMX_VAL_EVERYSAMPLE,
    }
);

daqmx_option!(
    DataTransferMechanism, "data_transfer_mechanism" {
        Dma => "dma" = DAQMX_VAL_DMA,
        Interrupts => "interrupts" = DAQMX_VAL_INTERRUPTS,
        ProgrammedIo => "programmed_io" = DAQMX_VAL_PROGRAMMEDIO,
        UsbBulk => "usb" = DAQMX_VAL_USBBULK,
    }
);

daqmx_option!(
    /// Event registration options. `"sync"` makes the driver invoke the callback in the thread
    /// that registered it.
    EventOptions, "options" {
        Default => "default" = 0,
        Sync => "sync" = DAQMX_VAL_SYNCHRONOUSEVENTCALLBACKS as i32,
    }
);

/// Parses an optional string option, falling back to `default` when absent.
pub fn parse_or<T: FromStr<Err = DaqmxError>>(s: Option<&str>, default: T) -> Result<T> {
    s.map_or(Ok(default), str::parse)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_and_values() {
        assert_eq!("falling".parse::<Edge>().unwrap(), Edge::Falling);
        assert_eq!(Edge::Falling.val(), 10171);
        assert_eq!(SampleMode::Finite.val(), 10178);
        assert_eq!("group_by_scan_number".parse::<FillMode>().unwrap().val(), 1);
        assert_eq!(TaskAction::Abort.val(), 6);
        assert_eq!(EventOptions::Sync.val(), 1);
    }

    #[test]
    fn invalid_option_lists_accepted_names() {
        let err = "sometimes".parse::<SampleMode>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected sample_mode finite|continuous|hwtimed but got \"sometimes\""
        );
    }

    #[test]
    fn terminal_any_case() {
        assert_eq!(TerminalConfig::parse_any_case("RSE").unwrap(), TerminalConfig::Rse);
        assert_eq!(TerminalConfig::parse_any_case("Default").unwrap().val(), -1);
        assert!("RSE".parse::<TerminalConfig>().is_err());
    }

    #[test]
    fn from_driver_values() {
        assert_eq!(ChannelType::from_val(10102).unwrap(), ChannelType::AO);
        assert_eq!(BusType::from_val(13612).unwrap().name(), "PCIe");
        assert_eq!(MeasurementType::from_val(10301).unwrap().name(), "temperature");
        assert!(matches!(
            AutoZeroMode::from_val(1),
            Err(DaqmxError::UnexpectedValue { label: "auto_zero_mode", value: 1 })
        ));
    }

    #[test]
    fn channel_io_types() {
        assert_eq!(ChannelType::AI.io_type(), IoType::Input);
        assert_eq!(ChannelType::CO.io_type(), IoType::Output);
        assert_eq!(ChannelType::DI.io_type().title(), "Input");
        assert!(ChannelType::DO.is_digital() && !ChannelType::DO.is_analog());
    }

    #[test]
    fn pause_when_depends_on_trigger() {
        assert_eq!(
            PauseWhen::parse_for(PauseTrigger::AnalogWindow, "outside").unwrap(),
            PauseWhen::Outside
        );
        let err = PauseWhen::parse_for(PauseTrigger::DigitalLevel, "above").unwrap_err();
        assert_eq!(err.to_string(), "Expected when high|low but got \"above\"");
    }

    #[test]
    fn optional_options() {
        assert_eq!(parse_or(None, PauseTrigger::Disabled).unwrap(), PauseTrigger::Disabled);
        assert_eq!(
            parse_or(Some("analog_level"), PauseTrigger::Disabled).unwrap(),
            PauseTrigger::AnalogLevel
        );
        assert!(parse_or(Some("level"), PauseTrigger::Disabled).is_err());
    }
}
