//! Integer constants of the NI-DAQmx C API (`NIDAQmx.h`) used by the binding.
//!
//! Names follow the `DAQmx_Val_*` macros of the vendor header, upper-cased. Only the values
//! reachable from an option in [`crate::options`] or from the back-end are listed.

pub type CInt32 = i32;

// Task control actions
pub const DAQMX_VAL_TASK_START: CInt32 = 0;
pub const DAQMX_VAL_TASK_STOP: CInt32 = 1;
pub const DAQMX_VAL_TASK_VERIFY: CInt32 = 2;
pub const DAQMX_VAL_TASK_COMMIT: CInt32 = 3;
pub const DAQMX_VAL_TASK_RESERVE: CInt32 = 4;
pub const DAQMX_VAL_TASK_UNRESERVE: CInt32 = 5;
pub const DAQMX_VAL_TASK_ABORT: CInt32 = 6;

// Edges and slopes
pub const DAQMX_VAL_RISING: CInt32 = 10280;
pub const DAQMX_VAL_FALLING: CInt32 = 10171;
pub const DAQMX_VAL_RISING_SLOPE: CInt32 = 10280;
pub const DAQMX_VAL_FALLING_SLOPE: CInt32 = 10171;

// Sample modes
pub const DAQMX_VAL_FINITESAMPS: CInt32 = 10178;
pub const DAQMX_VAL_CONTSAMPS: CInt32 = 10123;
pub const DAQMX_VAL_HWTIMEDSINGLEPOINT: CInt32 = 12522;

// Terminal configurations
pub const DAQMX_VAL_CFG_DEFAULT: CInt32 = -1;
pub const DAQMX_VAL_RSE: CInt32 = 10083;
pub const DAQMX_VAL_NRSE: CInt32 = 10078;
pub const DAQMX_VAL_DIFF: CInt32 = 10106;
pub const DAQMX_VAL_PSEUDODIFF: CInt32 = 12529;

// Units
pub const DAQMX_VAL_VOLTS: CInt32 = 10348;
pub const DAQMX_VAL_FROMCUSTOMSCALE: CInt32 = 10065;
pub const DAQMX_VAL_HZ: CInt32 = 10373;
pub const DAQMX_VAL_SECONDS: CInt32 = 10364;

// Data layout of read/write buffers
pub const DAQMX_VAL_GROUPBYCHANNEL: u32 = 0;
pub const DAQMX_VAL_GROUPBYSCANNUMBER: u32 = 1;

// Digital line grouping
pub const DAQMX_VAL_CHANPERLINE: CInt32 = 0;
pub const DAQMX_VAL_CHANFORALLLINES: CInt32 = 1;

// Timeouts
pub const DAQMX_VAL_WAITINFINITELY: f64 = -1.0;

// Events
pub const DAQMX_VAL_ACQUIRED_INTO_BUFFER: CInt32 = 1;
pub const DAQMX_VAL_TRANSFERRED_FROM_BUFFER: CInt32 = 2;
pub const DAQMX_VAL_SYNCHRONOUSEVENTCALLBACKS: u32 = 0x0001;

// Signals
pub const DAQMX_VAL_SAMPLECLOCK: CInt32 = 12487;
pub const DAQMX_VAL_SAMPLECOMPLETEEVENT: CInt32 = 12530;
pub const DAQMX_VAL_CHANGEDETECTIONEVENT: CInt32 = 12511;
pub const DAQMX_VAL_COUNTEROUTPUTEVENT: CInt32 = 12494;
pub const DAQMX_VAL_STARTTRIGGER: CInt32 = 12491;
pub const DAQMX_VAL_10MHZREFCLOCK: CInt32 = 12536;

// Trigger conditions
pub const DAQMX_VAL_ENTERINGWIN: CInt32 = 10163;
pub const DAQMX_VAL_LEAVINGWIN: CInt32 = 10208;
pub const DAQMX_VAL_PATTERNMATCHES: CInt32 = 10254;
pub const DAQMX_VAL_PATTERNDOESNOTMATCH: CInt32 = 10253;
pub const DAQMX_VAL_HIGH: CInt32 = 10192;
pub const DAQMX_VAL_LOW: CInt32 = 10214;
pub const DAQMX_VAL_ABOVELVL: CInt32 = 10093;
pub const DAQMX_VAL_BELOWLVL: CInt32 = 10107;
pub const DAQMX_VAL_INSIDEWIN: CInt32 = 10199;
pub const DAQMX_VAL_OUTSIDEWIN: CInt32 = 10251;

// Trigger types
pub const DAQMX_VAL_NONE: CInt32 = 10230;
pub const DAQMX_VAL_DIGEDGE: CInt32 = 10150;
pub const DAQMX_VAL_DIGLVL: CInt32 = 10152;
pub const DAQMX_VAL_ANLGLVL: CInt32 = 10101;
pub const DAQMX_VAL_ANLGWIN: CInt32 = 10103;

// Write regeneration
pub const DAQMX_VAL_ALLOWREGEN: CInt32 = 10097;
pub const DAQMX_VAL_DONOTALLOWREGEN: CInt32 = 10158;

// Counters
pub const DAQMX_VAL_COUNTUP: CInt32 = 10128;
pub const DAQMX_VAL_COUNTDOWN: CInt32 = 10124;
pub const DAQMX_VAL_EXTCONTROLLED: CInt32 = 10326;

// Channel types
pub const DAQMX_VAL_AI: CInt32 = 10100;
pub const DAQMX_VAL_AO: CInt32 = 10102;
pub const DAQMX_VAL_DI: CInt32 = 10151;
pub const DAQMX_VAL_DO: CInt32 = 10153;
pub const DAQMX_VAL_CI: CInt32 = 10131;
pub const DAQMX_VAL_CO: CInt32 = 10132;

// Bus types
pub const DAQMX_VAL_PCI: CInt32 = 12582;
pub const DAQMX_VAL_PCIE: CInt32 = 13612;
pub const DAQMX_VAL_PXI: CInt32 = 12583;
pub const DAQMX_VAL_PXIE: CInt32 = 14706;
pub const DAQMX_VAL_SCXI: CInt32 = 12584;
pub const DAQMX_VAL_SCC: CInt32 = 14707;
pub const DAQMX_VAL_PCCARD: CInt32 = 12585;
pub const DAQMX_VAL_USB: CInt32 = 12586;
pub const DAQMX_VAL_COMPACTDAQ: CInt32 = 14637;
pub const DAQMX_VAL_TCPIP: CInt32 = 14828;
pub const DAQMX_VAL_SWITCHBLOCK: CInt32 = 15870;
pub const DAQMX_VAL_UNKNOWN: CInt32 = 12588;

// Measurement and output types
pub const DAQMX_VAL_VOLTAGE: CInt32 = 10322;
pub const DAQMX_VAL_CURRENT: CInt32 = 10134;
pub const DAQMX_VAL_VOLTAGE_CUSTOMWITHEXCITATION: CInt32 = 10323;
pub const DAQMX_VAL_FREQ_VOLTAGE: CInt32 = 10181;
pub const DAQMX_VAL_RESISTANCE: CInt32 = 10278;
pub const DAQMX_VAL_TEMP_TC: CInt32 = 10303;
pub const DAQMX_VAL_TEMP_THRMSTR: CInt32 = 10302;
pub const DAQMX_VAL_TEMP_RTD: CInt32 = 10301;
pub const DAQMX_VAL_TEMP_BUILTINSENSOR: CInt32 = 10311;
pub const DAQMX_VAL_STRAIN_GAGE: CInt32 = 10300;
pub const DAQMX_VAL_POSITION_LVDT: CInt32 = 10352;
pub const DAQMX_VAL_POSITION_RVDT: CInt32 = 10353;
pub const DAQMX_VAL_ACCELEROMETER: CInt32 = 10356;
pub const DAQMX_VAL_SOUNDPRESSURE_MICROPHONE: CInt32 = 10354;
pub const DAQMX_VAL_TEDS_SENSOR: CInt32 = 12531;

// Auto zero modes
pub const DAQMX_VAL_ONCE: CInt32 = 10244;
pub const DAQMX_VAL_EVERYSAMPLE: CInt32 = 10164;

// Data transfer mechanisms
pub const DAQMX_VAL_DMA: CInt32 = 10054;
pub const DAQMX_VAL_INTERRUPTS: CInt32 = 10204;
pub const DAQMX_VAL_PROGRAMMEDIO: CInt32 = 10264;
pub const DAQMX_VAL_USBBULK: CInt32 = 12590;

/// Symbolic name (without the `DAQmxError`/`DAQmxWarning` prefix) of well-known driver status
/// codes. Codes missing here are reported by number only.
pub fn status_code_name(code: CInt32) -> Option<&'static str> {
    let name = match code {
        -50103 => "PALResourceReserved",
        -200077 => "InvalidAttributeValue",
        -200088 => "InvalidTask",
        -200170 => "PhysicalChanDoesNotExist",
        -200279 => "SamplesNoLongerAvailable",
        -200284 => "SamplesNotYetAvailable",
        -200290 => "GenStoppedToPreventRegenOfOldSamples",
        -200560 => "WaitUntilDoneDoesNotIndicateDone",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_status_codes() {
        assert_eq!(status_code_name(-200279), Some("SamplesNoLongerAvailable"));
        assert_eq!(status_code_name(-200088), Some("InvalidTask"));
        assert_eq!(status_code_name(0), None);
        assert_eq!(status_code_name(-1), None);
    }
}
