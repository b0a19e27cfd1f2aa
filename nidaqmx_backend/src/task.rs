//! # Task handles and the operations shared by every task type
//!
//! [`NiTask`] owns one DAQmx task handle. It is created with a fixed [`ChannelType`], and
//! cleared when dropped. The six typed tasks of this crate ([`crate::analog`],
//! [`crate::digital`], [`crate::counter`]) wrap an `NiTask`, dereference to it for the shared
//! operations implemented here, and add their own channel creation, read and write functions.
//!
//! ## Shared operations
//!
//! - **Lifecycle**: [`NiTask::start`], [`NiTask::stop`], [`NiTask::is_done`],
//!   [`NiTask::alter_state`], [`NiTask::wait_until_done`].
//! - **Introspection**: channel and device names, physical channel names, channel types.
//! - **Timing**: sample clock, change detection, handshaking and implicit timing. The last
//!   configured sample mode and samples per channel are remembered.
//! - **Triggers**: start triggers, arm start trigger and pause trigger.
//! - **Buffers and channel properties**: buffer size, analog limits and ranges, units,
//!   regeneration, and read/write positions.
//! - **Events**: see [`crate::events`].
//!
//! The Python classes get these operations through [`impl_task_boilerplate`], which generates
//! one `#[pymethods]` block per task type.
//!
//! ## Example
//!
//! ```ignore
//! let task = NiTask::new(Some("acquisition"), ChannelType::AI)?;
//! task.configure_timing_sample_clock("OnboardClock", 1e4, Edge::Rising, SampleMode::Finite, 1000)?;
//! task.start()?;
//! task.wait_until_done(-1.0)?;
//! ```

use log::{debug, error};
use pyo3::{ffi, Python};
use std::ffi::CString;

use nidaqmx_common::*;

use crate::device::Device;
use crate::events::EventRegistry;
use crate::nidaqmx::*;

/// Dispatches an analog channel property call to its AI or AO variant.
macro_rules! analog_call {
    ($self:ident, $ai:ident | $ao:ident ($($arg:expr),* $(,)?)) => {
        match $self.analog_type()? {
            ChannelType::AO => daqmx!($ao($($arg),*)),
            _ => daqmx!($ai($($arg),*)),
        }
    };
}

/// Dispatches a buffer call to its input or output variant.
macro_rules! io_call {
    ($self:ident, $input:ident | $output:ident ($($arg:expr),* $(,)?)) => {
        match $self.channel_io_type() {
            IoType::Input => daqmx!($input($($arg),*)),
            IoType::Output => daqmx!($output($($arg),*)),
        }
    };
}

pub struct NiTask {
    handle: TaskHandle,
    name: String,
    channel_type: ChannelType,
    sample_mode: Option<SampleMode>,
    samples_per_channel: Option<u64>,
    pause_trigger: Option<PauseTrigger>,
    pub(crate) events: EventRegistry,
}

// The handle is an opaque token and the DAQmx C API is thread-safe.
unsafe impl Send for NiTask {}
unsafe impl Sync for NiTask {}

impl NiTask {
    /// Creates a driver task holding channels of `channel_type`. An empty or missing `name`
    /// lets the driver assign one, which is read back.
    pub fn new(name: Option<&str>, channel_type: ChannelType) -> Result<Self> {
        let name_cstr = cstring(name.unwrap_or(""))?;
        let mut handle: TaskHandle = std::ptr::null_mut();
        daqmx!(CreateTask(name_cstr.as_ptr(), &mut handle))?;
        let mut task = NiTask {
            handle,
            name: String::new(),
            channel_type,
            sample_mode: None,
            samples_per_channel: None,
            pause_trigger: None,
            events: EventRegistry::default(),
        };
        // From here on a failure drops `task`, which clears the handle
        task.name = daqmx_string!(GetTaskName(handle))?;
        debug!("Created {} task {}", channel_type, task.name);
        Ok(task)
    }

    pub fn handle(&self) -> TaskHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    pub fn channel_io_type(&self) -> IoType {
        self.channel_type.io_type()
    }

    /// Sample mode of the last timing configuration.
    pub fn sample_mode(&self) -> Option<SampleMode> {
        self.sample_mode
    }

    /// Samples per channel of the last timing configuration.
    pub fn samples_per_channel(&self) -> Option<u64> {
        self.samples_per_channel
    }

    /// Clears the task now instead of at drop. Registered callbacks are released after the
    /// driver has forgotten them.
    pub fn clear(&mut self) -> Result<()> {
        if self.handle.is_null() {
            return Ok(());
        }
        let handle = std::mem::replace(&mut self.handle, std::ptr::null_mut());
        if let Err(e) = daqmx!(ClearTask(handle)) {
            // The driver may still hold the callback pointers
            std::mem::forget(std::mem::take(&mut self.events));
            return Err(e);
        }
        self.events = EventRegistry::default();
        debug!("Cleared task {}", self.name);
        Ok(())
    }

    pub fn start(&self) -> Result<()> {
        daqmx!(StartTask(self.handle))?;
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        daqmx!(StopTask(self.handle))?;
        Ok(())
    }

    pub fn is_done(&self) -> Result<bool> {
        let mut done: CBool32 = 0;
        daqmx!(IsTaskDone(self.handle, &mut done))?;
        Ok(done != 0)
    }

    /// Moves the task through the driver state model (`verify`, `commit`, `reserve`, ...).
    pub fn alter_state(&self, action: TaskAction) -> Result<()> {
        daqmx!(TaskControl(self.handle, action.val()))?;
        Ok(())
    }

    /// Waits for the measurement or generation to complete. A negative `timeout` waits forever.
    pub fn wait_until_done(&self, timeout: f64) -> Result<()> {
        let timeout = if timeout < 0.0 { DAQMX_VAL_WAITINFINITELY } else { timeout };
        daqmx!(WaitUntilTaskDone(self.handle, timeout))?;
        Ok(())
    }

    pub fn get_number_of_channels(&self) -> Result<u32> {
        let mut count: CUint32 = 0;
        daqmx!(GetTaskNumChans(self.handle, &mut count))?;
        let names = self.get_names_of_channels()?;
        if names.len() != count as usize {
            return Err(DaqmxError::UnexpectedValue {
                label: "number of channels",
                value: count as i32,
            });
        }
        Ok(count)
    }

    pub fn get_names_of_channels(&self) -> Result<Vec<String>> {
        Ok(split_names(&daqmx_string!(GetTaskChannels(self.handle))?))
    }

    pub fn get_devices(&self) -> Result<Vec<String>> {
        Ok(split_names(&daqmx_string!(GetTaskDevices(self.handle))?))
    }

    pub fn get_physical_channel_name(&self, channel: &str) -> Result<String> {
        let c = cstring(channel)?;
        daqmx_string!(GetPhysicalChanName(self.handle, c.as_ptr()))
    }

    /// Channel type of a virtual channel as reported by the driver.
    pub fn get_channel_type_of(&self, channel: &str) -> Result<ChannelType> {
        let c = cstring(channel)?;
        let mut val: CInt32 = 0;
        daqmx!(GetChanType(self.handle, c.as_ptr(), &mut val))?;
        ChannelType::from_val(val)
    }

    pub fn is_channel_global(&self, channel: &str) -> Result<bool> {
        let c = cstring(channel)?;
        let mut val: CBool32 = 0;
        daqmx!(GetChanIsGlobal(self.handle, c.as_ptr(), &mut val))?;
        Ok(val != 0)
    }

    /// Checks that the most recently created channel has the task's channel type.
    pub(crate) fn verify_last_channel(&self) -> Result<()> {
        let names = self.get_names_of_channels()?;
        let Some(last) = names.last() else {
            return Ok(());
        };
        let got = self.get_channel_type_of(last)?;
        if got != self.channel_type {
            return Err(DaqmxError::ChannelTypeMismatch {
                expected: self.channel_type.to_string(),
                got: got.to_string(),
            });
        }
        Ok(())
    }

    fn record_timing(&mut self, sample_mode: SampleMode, samples_per_channel: u64) {
        self.sample_mode = Some(sample_mode);
        self.samples_per_channel = Some(samples_per_channel);
    }

    /// Sets the source of the sample clock, its rate and the number of samples to acquire or
    /// generate.
    ///
    /// # Parameters
    ///
    /// * `source`: Terminal of the sample clock. An empty string or `"OnboardClock"` uses the
    ///   device's internal clock.
    /// * `rate`: Samples per second per channel. With an external clock, its maximum expected rate.
    /// * `active_edge`: Edge of the clock on which samples are taken.
    /// * `sample_mode`: Finite, continuous or hardware-timed single point.
    /// * `samples_per_channel`: Samples to acquire or generate in finite mode. In continuous
    ///   mode, the driver uses it to size the buffer.
    ///
    /// The sample mode and count are remembered for [`NiTask::get_info`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut task = AnalogInputTask::new(None)?;
    /// task.create_voltage_channel("Dev1/ai0", "", TerminalConfig::Rse, -10.0, 10.0, VoltageUnits::Volts, None)?;
    /// task.configure_timing_sample_clock("", 1e3, Edge::Rising, SampleMode::Finite, 100)?;
    /// ```
    pub fn configure_timing_sample_clock(
        &mut self,
        source: &str,
        rate: f64,
        active_edge: Edge,
        sample_mode: SampleMode,
        samples_per_channel: u64,
    ) -> Result<()> {
        let source = cstring(source)?;
        daqmx!(CfgSampClkTiming(
            self.handle,
            source.as_ptr(),
            rate,
            active_edge.val(),
            sample_mode.val(),
            samples_per_channel,
        ))?;
        self.record_timing(sample_mode, samples_per_channel);
        Ok(())
    }

    /// Samples on rising or falling edges of the given digital lines or ports. An empty channel
    /// string disables detection on that edge.
    pub fn configure_timing_change_detection(
        &mut self,
        rising_edge_channel: &str,
        falling_edge_channel: &str,
        sample_mode: SampleMode,
        samples_per_channel: u64,
    ) -> Result<()> {
        let rising = cstring(rising_edge_channel)?;
        let falling = cstring(falling_edge_channel)?;
        daqmx!(CfgChangeDetectionTiming(
            self.handle,
            rising.as_ptr(),
            falling.as_ptr(),
            sample_mode.val(),
            samples_per_channel,
        ))?;
        self.record_timing(sample_mode, samples_per_channel);
        Ok(())
    }

    pub fn configure_timing_handshaking(
        &mut self,
        sample_mode: SampleMode,
        samples_per_channel: u64,
    ) -> Result<()> {
        daqmx!(CfgHandshakingTiming(self.handle, sample_mode.val(), samples_per_channel))?;
        self.record_timing(sample_mode, samples_per_channel);
        Ok(())
    }

    /// Timing without a sample clock, e.g. counter outputs whose pulses set the pace.
    pub fn configure_timing_implicit(
        &mut self,
        sample_mode: SampleMode,
        samples_per_channel: u64,
    ) -> Result<()> {
        daqmx!(CfgImplicitTiming(self.handle, sample_mode.val(), samples_per_channel))?;
        self.record_timing(sample_mode, samples_per_channel);
        Ok(())
    }

    pub fn configure_trigger_analog_edge_start(
        &self,
        source: &str,
        slope: Slope,
        level: f64,
    ) -> Result<()> {
        let source = cstring(source)?;
        daqmx!(CfgAnlgEdgeStartTrig(self.handle, source.as_ptr(), slope.val(), level))?;
        Ok(())
    }

    pub fn configure_trigger_analog_window_start(
        &self,
        source: &str,
        when: WindowTrigger,
        top: f64,
        bottom: f64,
    ) -> Result<()> {
        let source = cstring(source)?;
        daqmx!(CfgAnlgWindowStartTrig(self.handle, source.as_ptr(), when.val(), top, bottom))?;
        Ok(())
    }

    pub fn configure_trigger_digital_edge_start(&self, source: &str, edge: Edge) -> Result<()> {
        let source = cstring(source)?;
        daqmx!(CfgDigEdgeStartTrig(self.handle, source.as_ptr(), edge.val()))?;
        Ok(())
    }

    /// Starts the task when the digital `pattern` (e.g. `"10XX"`) matches or stops matching.
    pub fn configure_trigger_digital_pattern_start(
        &self,
        source: &str,
        pattern: &str,
        when: PatternTrigger,
    ) -> Result<()> {
        let source = cstring(source)?;
        let pattern = cstring(pattern)?;
        daqmx!(CfgDigPatternStartTrig(
            self.handle,
            source.as_ptr(),
            pattern.as_ptr(),
            when.val(),
        ))?;
        Ok(())
    }

    pub fn configure_trigger_disable_start(&self) -> Result<()> {
        daqmx!(DisableStartTrig(self.handle))?;
        Ok(())
    }

    pub fn set_arm_start_trigger(&self, trigger_type: ArmStartTrigger) -> Result<()> {
        daqmx!(SetArmStartTrigType(self.handle, trigger_type.val()))?;
        Ok(())
    }

    pub fn get_arm_start_trigger(&self) -> Result<ArmStartTrigger> {
        let mut val: CInt32 = 0;
        daqmx!(GetArmStartTrigType(self.handle, &mut val))?;
        ArmStartTrigger::from_val(val)
    }

    pub fn reset_arm_start_trigger(&self) -> Result<()> {
        daqmx!(ResetArmStartTrigType(self.handle))?;
        Ok(())
    }

    pub fn set_arm_start_trigger_source(&self, source: &str) -> Result<()> {
        let source = cstring(source)?;
        daqmx!(SetDigEdgeArmStartTrigSrc(self.handle, source.as_ptr()))?;
        Ok(())
    }

    pub fn set_arm_start_trigger_edge(&self, edge: Edge) -> Result<()> {
        daqmx!(SetDigEdgeArmStartTrigEdge(self.handle, edge.val()))?;
        Ok(())
    }

    /// Selects the pause trigger type. Source and condition are set afterwards with
    /// [`NiTask::set_pause_trigger_source`] and [`NiTask::set_pause_trigger_when`].
    pub fn set_pause_trigger(&mut self, trigger_type: PauseTrigger) -> Result<()> {
        daqmx!(SetPauseTrigType(self.handle, trigger_type.val()))?;
        self.pause_trigger = match trigger_type {
            PauseTrigger::Disabled => None,
            t => Some(t),
        };
        Ok(())
    }

    pub fn pause_trigger(&self) -> Option<PauseTrigger> {
        self.pause_trigger
    }

    pub fn set_pause_trigger_source(&self, source: &str) -> Result<()> {
        let source = cstring(source)?;
        match self.pause_trigger {
            Some(PauseTrigger::DigitalLevel) => {
                daqmx!(SetDigLvlPauseTrigSrc(self.handle, source.as_ptr()))
            }
            Some(PauseTrigger::AnalogLevel) => {
                daqmx!(SetAnlgLvlPauseTrigSrc(self.handle, source.as_ptr()))
            }
            Some(PauseTrigger::AnalogWindow) => {
                daqmx!(SetAnlgWinPauseTrigSrc(self.handle, source.as_ptr()))
            }
            _ => Err(DaqmxError::PauseTriggerUnset),
        }?;
        Ok(())
    }

    /// Sets the pause condition. `when` must be one of the conditions of the selected pause
    /// trigger type.
    pub fn set_pause_trigger_when(&self, when: PauseWhen) -> Result<()> {
        let trigger = self.pause_trigger.ok_or(DaqmxError::PauseTriggerUnset)?;
        let when = PauseWhen::parse_for(trigger, when.name())?;
        match trigger {
            PauseTrigger::DigitalLevel => daqmx!(SetDigLvlPauseTrigWhen(self.handle, when.val())),
            PauseTrigger::AnalogLevel => daqmx!(SetAnlgLvlPauseTrigWhen(self.handle, when.val())),
            PauseTrigger::AnalogWindow => daqmx!(SetAnlgWinPauseTrigWhen(self.handle, when.val())),
            PauseTrigger::Disabled => Err(DaqmxError::PauseTriggerUnset),
        }?;
        Ok(())
    }

    /// Overrides the automatic buffer allocation. Zero samples means no buffer.
    pub fn set_buffer(&self, samples_per_channel: u32) -> Result<()> {
        io_call!(self, CfgInputBuffer | CfgOutputBuffer(self.handle, samples_per_channel))?;
        Ok(())
    }

    /// Buffer size in samples per channel, or the size of the on-board buffer of the device.
    pub fn get_buffer_size(&self, on_board: bool) -> Result<u32> {
        let mut size: CUint32 = 0;
        if on_board {
            io_call!(self, GetBufInputOnbrdBufSize | GetBufOutputOnbrdBufSize(self.handle, &mut size))?;
        } else {
            io_call!(self, GetBufInputBufSize | GetBufOutputBufSize(self.handle, &mut size))?;
        }
        Ok(size)
    }

    pub fn set_buffer_size(&self, size: u32) -> Result<()> {
        io_call!(self, SetBufInputBufSize | SetBufOutputBufSize(self.handle, size))?;
        Ok(())
    }

    pub fn reset_buffer_size(&self) -> Result<()> {
        io_call!(self, ResetBufInputBufSize | ResetBufOutputBufSize(self.handle))?;
        Ok(())
    }

    fn analog_type(&self) -> Result<ChannelType> {
        if self.channel_type.is_analog() {
            Ok(self.channel_type)
        } else {
            Err(DaqmxError::Unsupported(format!(
                "{} tasks have no analog channel properties",
                self.channel_type
            )))
        }
    }

    fn analog_f64<F>(&self, channel: &str, get: F) -> Result<f64>
    where
        F: FnOnce(&CString, &mut f64) -> Result<CInt32>,
    {
        let c = cstring(channel)?;
        let mut val = 0.0;
        get(&c, &mut val)?;
        Ok(val)
    }

    pub fn get_max(&self, channel: &str) -> Result<f64> {
        self.analog_f64(channel, |c, v| {
            analog_call!(self, GetAIMax | GetAOMax(self.handle, c.as_ptr(), v))
        })
    }

    pub fn set_max(&self, channel: &str, value: f64) -> Result<()> {
        let c = cstring(channel)?;
        analog_call!(self, SetAIMax | SetAOMax(self.handle, c.as_ptr(), value))?;
        Ok(())
    }

    pub fn reset_max(&self, channel: &str) -> Result<()> {
        let c = cstring(channel)?;
        analog_call!(self, ResetAIMax | ResetAOMax(self.handle, c.as_ptr()))?;
        Ok(())
    }

    pub fn get_min(&self, channel: &str) -> Result<f64> {
        self.analog_f64(channel, |c, v| {
            analog_call!(self, GetAIMin | GetAOMin(self.handle, c.as_ptr(), v))
        })
    }

    pub fn set_min(&self, channel: &str, value: f64) -> Result<()> {
        let c = cstring(channel)?;
        analog_call!(self, SetAIMin | SetAOMin(self.handle, c.as_ptr(), value))?;
        Ok(())
    }

    pub fn reset_min(&self, channel: &str) -> Result<()> {
        let c = cstring(channel)?;
        analog_call!(self, ResetAIMin | ResetAOMin(self.handle, c.as_ptr()))?;
        Ok(())
    }

    /// Upper limit of the input range (AI) or of the DAC range (AO).
    pub fn get_high(&self, channel: &str) -> Result<f64> {
        self.analog_f64(channel, |c, v| {
            analog_call!(self, GetAIRngHigh | GetAODACRngHigh(self.handle, c.as_ptr(), v))
        })
    }

    pub fn get_low(&self, channel: &str) -> Result<f64> {
        self.analog_f64(channel, |c, v| {
            analog_call!(self, GetAIRngLow | GetAODACRngLow(self.handle, c.as_ptr(), v))
        })
    }

    pub fn get_gain(&self, channel: &str) -> Result<f64> {
        self.analog_f64(channel, |c, v| {
            analog_call!(self, GetAIGain | GetAOGain(self.handle, c.as_ptr(), v))
        })
    }

    /// Measurement type of an AI channel, or output type of an AO channel.
    pub fn get_measurement_type(&self, channel: &str) -> Result<MeasurementType> {
        let c = cstring(channel)?;
        let mut val: CInt32 = 0;
        analog_call!(self, GetAIMeasType | GetAOOutputType(self.handle, c.as_ptr(), &mut val))?;
        MeasurementType::from_val(val)
    }

    /// Units of a voltage channel. Other measurement types are not supported.
    pub fn get_units(&self, channel: &str) -> Result<VoltageUnits> {
        let measurement = self.get_measurement_type(channel)?;
        if measurement != MeasurementType::Voltage {
            return Err(DaqmxError::Unsupported(format!(
                "units of {} channel {}",
                measurement, channel
            )));
        }
        let c = cstring(channel)?;
        let mut val: CInt32 = 0;
        analog_call!(self, GetAIVoltageUnits | GetAOVoltageUnits(self.handle, c.as_ptr(), &mut val))?;
        VoltageUnits::from_val(val)
    }

    pub fn get_auto_zero_mode(&self, channel: &str) -> Result<AutoZeroMode> {
        if self.channel_type != ChannelType::AI {
            return Err(DaqmxError::Unsupported(format!(
                "auto zero mode of {} channels",
                self.channel_type
            )));
        }
        let c = cstring(channel)?;
        let mut val: CInt32 = 0;
        daqmx!(GetAIAutoZeroMode(self.handle, c.as_ptr(), &mut val))?;
        AutoZeroMode::from_val(val)
    }

    pub fn get_data_transfer_mechanism(&self, channel: &str) -> Result<DataTransferMechanism> {
        let c = cstring(channel)?;
        let mut val: CInt32 = 0;
        analog_call!(self, GetAIDataXferMech | GetAODataXferMech(self.handle, c.as_ptr(), &mut val))?;
        DataTransferMechanism::from_val(val)
    }

    /// Whether the output buffer may be generated again once every sample was written.
    pub fn get_regeneration(&self) -> Result<bool> {
        let mut val: CInt32 = 0;
        daqmx!(GetWriteRegenMode(self.handle, &mut val))?;
        match val {
            DAQMX_VAL_ALLOWREGEN => Ok(true),
            DAQMX_VAL_DONOTALLOWREGEN => Ok(false),
            value => Err(DaqmxError::UnexpectedValue {
                label: "regeneration mode",
                value,
            }),
        }
    }

    pub fn set_regeneration(&self, allow: bool) -> Result<()> {
        let mode = if allow { DAQMX_VAL_ALLOWREGEN } else { DAQMX_VAL_DONOTALLOWREGEN };
        daqmx!(SetWriteRegenMode(self.handle, mode))?;
        Ok(())
    }

    pub fn reset_regeneration(&self) -> Result<()> {
        daqmx!(ResetWriteRegenMode(self.handle))?;
        Ok(())
    }

    pub fn get_read_current_position(&self) -> Result<u64> {
        let mut val: CUint64 = 0;
        daqmx!(GetReadCurrReadPos(self.handle, &mut val))?;
        Ok(val)
    }

    pub fn get_samples_per_channel_available(&self) -> Result<u32> {
        let mut val: CUint32 = 0;
        daqmx!(GetReadAvailSampPerChan(self.handle, &mut val))?;
        Ok(val)
    }

    pub fn get_samples_per_channel_acquired(&self) -> Result<u64> {
        let mut val: CUint64 = 0;
        daqmx!(GetReadTotalSampPerChanAcquired(self.handle, &mut val))?;
        Ok(val)
    }

    pub fn get_write_current_position(&self) -> Result<u64> {
        let mut val: CUint64 = 0;
        daqmx!(GetWriteCurrWritePos(self.handle, &mut val))?;
        Ok(val)
    }

    pub fn get_samples_per_channel_generated(&self) -> Result<u64> {
        let mut val: CUint64 = 0;
        daqmx!(GetWriteTotalSampPerChanGenerated(self.handle, &mut val))?;
        Ok(val)
    }

    /// Routes a task signal to an output terminal, e.g. the start trigger to `"PXI_Trig0"`.
    pub fn export_signal(&self, signal: ExportSignal, terminal: &str) -> Result<()> {
        let terminal = cstring(terminal)?;
        daqmx!(ExportSignal(self.handle, signal.val(), terminal.as_ptr()))?;
        Ok(())
    }

    pub fn set_ref_clock_source(&self, source: &str) -> Result<()> {
        let source = cstring(source)?;
        daqmx!(SetRefClkSrc(self.handle, source.as_ptr()))?;
        Ok(())
    }

    pub fn set_ref_clock_rate(&self, rate: f64) -> Result<()> {
        daqmx!(SetRefClkRate(self.handle, rate))?;
        Ok(())
    }

    fn channel_info(&self, channel: &str) -> Result<ChannelInfo> {
        let channel_type = self.get_channel_type_of(channel)?;
        let mut info = ChannelInfo {
            name: channel.to_string(),
            physical_name: self.get_physical_channel_name(channel)?,
            channel_type: channel_type.to_string(),
            is_global: self.is_channel_global(channel)?,
            ..Default::default()
        };
        if channel_type.is_analog() {
            let units = match self.get_units(channel) {
                Ok(units) => units.to_string(),
                Err(DaqmxError::Unsupported(_)) => String::new(),
                Err(e) => return Err(e),
            };
            info.measurement_type = Some(self.get_measurement_type(channel)?.to_string());
            info.limits = Some((self.get_min(channel)?, self.get_max(channel)?, units));
            info.data_transfer_mechanism =
                Some(self.get_data_transfer_mechanism(channel)?.to_string());
        }
        if channel_type == ChannelType::AI {
            info.range = Some((self.get_high(channel)?, self.get_low(channel)?));
            info.auto_zero_mode = Some(self.get_auto_zero_mode(channel)?.to_string());
        }
        Ok(info)
    }

    /// Snapshot of the task and its channels, optionally with the system and device report.
    pub fn get_info(&self, global_info: bool) -> Result<TaskInfo> {
        let system = if global_info {
            Some(system_info()?)
        } else {
            None
        };
        let channels = self
            .get_names_of_channels()?
            .iter()
            .map(|c| self.channel_info(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(TaskInfo {
            name: self.name.clone(),
            devices: self.get_devices()?,
            channel_type: self.channel_type.to_string(),
            channel_io_type: self.channel_io_type().to_string(),
            buffer_size: self.get_buffer_size(false)?,
            channels,
            system,
        })
    }

    pub fn get_info_str(&self, global_info: bool) -> Result<String> {
        Ok(self.get_info(global_info)?.to_string())
    }
}

/// Version, saved tasks and channels, and every installed device.
pub fn system_info() -> Result<SystemInfo> {
    let mut info = SystemInfo {
        version: get_version()?,
        global_channels: get_system_global_channels()?,
        tasks: get_system_tasks()?,
        ..Default::default()
    };
    for name in get_system_devices()? {
        let device = Device::new(&name);
        info.devices.insert(name, device.get_info()?);
    }
    Ok(info)
}

/// Runs `f` with the GIL released when the calling thread holds it.
///
/// `ClearTask` and `StopTask` wait for running event callbacks, and python callbacks need the
/// GIL, so a driver call made while holding it can deadlock.
pub fn without_gil<T: Send>(f: impl FnOnce() -> T + Send) -> T {
    let holds_gil = unsafe { ffi::Py_IsInitialized() != 0 && ffi::PyGILState_Check() == 1 };
    if holds_gil {
        // SAFETY: checked above that this thread holds the GIL
        let py = unsafe { Python::assume_gil_acquired() };
        py.allow_threads(f)
    } else {
        f()
    }
}

impl Drop for NiTask {
    fn drop(&mut self) {
        // Python objects are dropped with the GIL held
        if let Err(e) = without_gil(|| self.clear()) {
            error!("Failed to clear task {}: {}", self.name, e);
        }
    }
}

/// Generates, for a typed task struct with a `task: NiTask` field:
/// - `Deref`/`DerefMut` to [`NiTask`], so Rust callers use the shared operations directly;
/// - a Rust constructor `new(name)` fixing the channel type;
/// - the `#[pymethods]` block exposing the shared operations to Python, with string options
///   and defaults.
macro_rules! impl_task_boilerplate {
    ($task_type:ty, $channel_type:expr) => {
        impl std::ops::Deref for $task_type {
            type Target = $crate::task::NiTask;
            fn deref(&self) -> &Self::Target {
                &self.task
            }
        }

        impl std::ops::DerefMut for $task_type {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.task
            }
        }

        impl $task_type {
            pub fn new(name: Option<&str>) -> nidaqmx_common::Result<Self> {
                Ok(Self {
                    task: $crate::task::NiTask::new(name, $channel_type)?,
                })
            }
        }

        #[pymethods]
        impl $task_type {
            #[new]
            #[pyo3(signature = (name = None))]
            fn py_new(name: Option<&str>) -> PyResult<Self> {
                Ok(Self::new(name)?)
            }

            fn __repr__(&self) -> String {
                format!("{}({:?})", stringify!($task_type), self.task.name())
            }

            #[getter(name)]
            fn py_name(&self) -> String {
                self.task.name().to_string()
            }

            #[getter(channel_type)]
            fn py_channel_type(&self) -> &'static str {
                self.task.channel_type().name()
            }

            #[getter(channel_io_type)]
            fn py_channel_io_type(&self) -> &'static str {
                self.task.channel_io_type().name()
            }

            #[pyo3(name = "clear")]
            fn py_clear(&mut self, py: Python<'_>) -> PyResult<bool> {
                py.allow_threads(|| self.task.clear())?;
                Ok(true)
            }

            #[pyo3(name = "start")]
            fn py_start(&self, py: Python<'_>) -> PyResult<bool> {
                py.allow_threads(|| self.task.start())?;
                Ok(true)
            }

            #[pyo3(name = "stop")]
            fn py_stop(&self, py: Python<'_>) -> PyResult<bool> {
                py.allow_threads(|| self.task.stop())?;
                Ok(true)
            }

            #[pyo3(name = "is_done")]
            fn py_is_done(&self, py: Python<'_>) -> PyResult<bool> {
                Ok(py.allow_threads(|| self.task.is_done())?)
            }

            #[pyo3(name = "alter_state")]
            fn py_alter_state(&self, py: Python<'_>, state: &str) -> PyResult<bool> {
                py.allow_threads(|| self.task.alter_state(state.parse()?))?;
                Ok(true)
            }

            #[pyo3(name = "wait_until_done", signature = (timeout = -1.0))]
            fn py_wait_until_done(&self, py: Python<'_>, timeout: f64) -> PyResult<bool> {
                py.allow_threads(|| self.task.wait_until_done(timeout))?;
                Ok(true)
            }

            #[pyo3(name = "get_number_of_channels")]
            fn py_get_number_of_channels(&self, py: Python<'_>) -> PyResult<u32> {
                Ok(py.allow_threads(|| self.task.get_number_of_channels())?)
            }

            #[pyo3(name = "get_names_of_channels")]
            fn py_get_names_of_channels(&self, py: Python<'_>) -> PyResult<Vec<String>> {
                Ok(py.allow_threads(|| self.task.get_names_of_channels())?)
            }

            #[pyo3(name = "get_devices")]
            fn py_get_devices(&self, py: Python<'_>) -> PyResult<Vec<String>> {
                Ok(py.allow_threads(|| self.task.get_devices())?)
            }

            #[pyo3(name = "get_physical_channel_name")]
            fn py_get_physical_channel_name(&self, py: Python<'_>, channel_name: &str) -> PyResult<String> {
                Ok(py.allow_threads(|| self.task.get_physical_channel_name(channel_name))?)
            }

            #[pyo3(name = "get_channel_type")]
            fn py_get_channel_type(&self, py: Python<'_>, channel_name: &str) -> PyResult<&'static str> {
                Ok(py.allow_threads(|| self.task.get_channel_type_of(channel_name))?.name())
            }

            #[pyo3(name = "is_channel_global")]
            fn py_is_channel_global(&self, py: Python<'_>, channel_name: &str) -> PyResult<bool> {
                Ok(py.allow_threads(|| self.task.is_channel_global(channel_name))?)
            }

            #[pyo3(
                name = "configure_timing_sample_clock",
                signature = (
                    source = "OnboardClock",
                    rate = 1.0,
                    active_edge = "rising",
                    sample_mode = "continuous",
                    samples_per_channel = 1000
                )
            )]
            fn py_configure_timing_sample_clock(
                &mut self,
                py: Python<'_>,
                source: &str,
                rate: f64,
                active_edge: &str,
                sample_mode: &str,
                samples_per_channel: u64,
            ) -> PyResult<bool> {
                py.allow_threads(|| {
                    self.task.configure_timing_sample_clock(
                        source,
                        rate,
                        active_edge.parse()?,
                        sample_mode.parse()?,
                        samples_per_channel,
                    )
                })?;
                Ok(true)
            }

            #[pyo3(
                name = "configure_timing_change_detection",
                signature = (
                    rising_edge_channel = "",
                    falling_edge_channel = "",
                    sample_mode = "continuous",
                    samples_per_channel = 1000
                )
            )]
            fn py_configure_timing_change_detection(
                &mut self,
                py: Python<'_>,
                rising_edge_channel: &str,
                falling_edge_channel: &str,
                sample_mode: &str,
                samples_per_channel: u64,
            ) -> PyResult<bool> {
                py.allow_threads(|| {
                    self.task.configure_timing_change_detection(
                        rising_edge_channel,
                        falling_edge_channel,
                        sample_mode.parse()?,
                        samples_per_channel,
                    )
                })?;
                Ok(true)
            }

            #[pyo3(
                name = "configure_timing_handshaking",
                signature = (sample_mode = "continuous", samples_per_channel = 1000)
            )]
            fn py_configure_timing_handshaking(
                &mut self,
                py: Python<'_>,
                sample_mode: &str,
                samples_per_channel: u64,
            ) -> PyResult<bool> {
                py.allow_threads(|| {
                    self.task.configure_timing_handshaking(
                        sample_mode.parse()?,
                        samples_per_channel,
                    )
                })?;
                Ok(true)
            }

            #[pyo3(
                name = "configure_timing_implicit",
                signature = (sample_mode = "continuous", samples_per_channel = 1000)
            )]
            fn py_configure_timing_implicit(
                &mut self,
                py: Python<'_>,
                sample_mode: &str,
                samples_per_channel: u64,
            ) -> PyResult<bool> {
                py.allow_threads(|| {
                    self.task.configure_timing_implicit(sample_mode.parse()?, samples_per_channel)
                })?;
                Ok(true)
            }

            #[pyo3(
                name = "configure_trigger_analog_edge_start",
                signature = (source, slope = "rising", level = 1.0)
            )]
            fn py_configure_trigger_analog_edge_start(
                &self,
                py: Python<'_>,
                source: &str,
                slope: &str,
                level: f64,
            ) -> PyResult<bool> {
                py.allow_threads(|| {
                    self.task.configure_trigger_analog_edge_start(source, slope.parse()?, level)
                })?;
                Ok(true)
            }

            #[pyo3(
                name = "configure_trigger_analog_window_start",
                signature = (source, when = "entering", top = 1.0, bottom = -1.0)
            )]
            fn py_configure_trigger_analog_window_start(
                &self,
                py: Python<'_>,
                source: &str,
                when: &str,
                top: f64,
                bottom: f64,
            ) -> PyResult<bool> {
                py.allow_threads(|| {
                    self.task.configure_trigger_analog_window_start(
                        source,
                        when.parse()?,
                        top,
                        bottom,
                    )
                })?;
                Ok(true)
            }

            #[pyo3(
                name = "configure_trigger_digital_edge_start",
                signature = (source, edge = "rising")
            )]
            fn py_configure_trigger_digital_edge_start(
                &self,
                py: Python<'_>,
                source: &str,
                edge: &str,
            ) -> PyResult<bool> {
                py.allow_threads(|| {
                    self.task.configure_trigger_digital_edge_start(source, edge.parse()?)
                })?;
                Ok(true)
            }

            #[pyo3(
                name = "configure_trigger_digital_pattern_start",
                signature = (source, pattern, when = "matches")
            )]
            fn py_configure_trigger_digital_pattern_start(
                &self,
                py: Python<'_>,
                source: &str,
                pattern: &str,
                when: &str,
            ) -> PyResult<bool> {
                py.allow_threads(|| {
                    self.task.configure_trigger_digital_pattern_start(
                        source,
                        pattern,
                        when.parse()?,
                    )
                })?;
                Ok(true)
            }

            #[pyo3(name = "configure_trigger_disable_start")]
            fn py_configure_trigger_disable_start(&self, py: Python<'_>) -> PyResult<bool> {
                py.allow_threads(|| self.task.configure_trigger_disable_start())?;
                Ok(true)
            }

            #[pyo3(name = "set_arm_start_trigger", signature = (trigger_type = "digital_edge"))]
            fn py_set_arm_start_trigger(&self, py: Python<'_>, trigger_type: &str) -> PyResult<bool> {
                py.allow_threads(|| self.task.set_arm_start_trigger(trigger_type.parse()?))?;
                Ok(true)
            }

            #[pyo3(name = "get_arm_start_trigger")]
            fn py_get_arm_start_trigger(&self, py: Python<'_>) -> PyResult<&'static str> {
                Ok(py.allow_threads(|| self.task.get_arm_start_trigger())?.name())
            }

            #[pyo3(name = "reset_arm_start_trigger")]
            fn py_reset_arm_start_trigger(&self, py: Python<'_>) -> PyResult<bool> {
                py.allow_threads(|| self.task.reset_arm_start_trigger())?;
                Ok(true)
            }

            #[pyo3(name = "set_arm_start_trigger_source")]
            fn py_set_arm_start_trigger_source(&self, py: Python<'_>, source: &str) -> PyResult<bool> {
                py.allow_threads(|| self.task.set_arm_start_trigger_source(source))?;
                Ok(true)
            }

            #[pyo3(name = "set_arm_start_trigger_edge", signature = (edge = "rising"))]
            fn py_set_arm_start_trigger_edge(&self, py: Python<'_>, edge: &str) -> PyResult<bool> {
                py.allow_threads(|| self.task.set_arm_start_trigger_edge(edge.parse()?))?;
                Ok(true)
            }

            #[pyo3(name = "set_pause_trigger", signature = (trigger_type = None))]
            fn py_set_pause_trigger(&mut self, py: Python<'_>, trigger_type: Option<&str>) -> PyResult<bool> {
                let trigger_type = nidaqmx_common::parse_or(
                    trigger_type,
                    nidaqmx_common::PauseTrigger::Disabled,
                )?;
                py.allow_threads(|| self.task.set_pause_trigger(trigger_type))?;
                Ok(true)
            }

            #[pyo3(name = "set_pause_trigger_source")]
            fn py_set_pause_trigger_source(&self, py: Python<'_>, source: &str) -> PyResult<bool> {
                py.allow_threads(|| self.task.set_pause_trigger_source(source))?;
                Ok(true)
            }

            #[pyo3(name = "set_pause_trigger_when")]
            fn py_set_pause_trigger_when(&self, py: Python<'_>, when: &str) -> PyResult<bool> {
                let trigger = self
                    .task
                    .pause_trigger()
                    .ok_or(nidaqmx_common::DaqmxError::PauseTriggerUnset)?;
                let when = nidaqmx_common::PauseWhen::parse_for(trigger, when)?;
                py.allow_threads(|| self.task.set_pause_trigger_when(when))?;
                Ok(true)
            }

            #[pyo3(name = "set_buffer")]
            fn py_set_buffer(&self, py: Python<'_>, samples_per_channel: u32) -> PyResult<bool> {
                py.allow_threads(|| self.task.set_buffer(samples_per_channel))?;
                Ok(true)
            }

            #[pyo3(name = "get_buffer_size", signature = (on_board = false))]
            fn py_get_buffer_size(&self, py: Python<'_>, on_board: bool) -> PyResult<u32> {
                Ok(py.allow_threads(|| self.task.get_buffer_size(on_board))?)
            }

            #[pyo3(name = "set_buffer_size")]
            fn py_set_buffer_size(&self, py: Python<'_>, size: u32) -> PyResult<bool> {
                py.allow_threads(|| self.task.set_buffer_size(size))?;
                Ok(true)
            }

            #[pyo3(name = "reset_buffer_size")]
            fn py_reset_buffer_size(&self, py: Python<'_>) -> PyResult<bool> {
                py.allow_threads(|| self.task.reset_buffer_size())?;
                Ok(true)
            }

            #[pyo3(name = "get_max")]
            fn py_get_max(&self, py: Python<'_>, channel_name: &str) -> PyResult<f64> {
                Ok(py.allow_threads(|| self.task.get_max(channel_name))?)
            }

            #[pyo3(name = "set_max")]
            fn py_set_max(&self, py: Python<'_>, channel_name: &str, value: f64) -> PyResult<bool> {
                py.allow_threads(|| self.task.set_max(channel_name, value))?;
                Ok(true)
            }

            #[pyo3(name = "reset_max")]
            fn py_reset_max(&self, py: Python<'_>, channel_name: &str) -> PyResult<bool> {
                py.allow_threads(|| self.task.reset_max(channel_name))?;
                Ok(true)
            }

            #[pyo3(name = "get_min")]
            fn py_get_min(&self, py: Python<'_>, channel_name: &str) -> PyResult<f64> {
                Ok(py.allow_threads(|| self.task.get_min(channel_name))?)
            }

            #[pyo3(name = "set_min")]
            fn py_set_min(&self, py: Python<'_>, channel_name: &str, value: f64) -> PyResult<bool> {
                py.allow_threads(|| self.task.set_min(channel_name, value))?;
                Ok(true)
            }

            #[pyo3(name = "reset_min")]
            fn py_reset_min(&self, py: Python<'_>, channel_name: &str) -> PyResult<bool> {
                py.allow_threads(|| self.task.reset_min(channel_name))?;
                Ok(true)
            }

            #[pyo3(name = "get_high")]
            fn py_get_high(&self, py: Python<'_>, channel_name: &str) -> PyResult<f64> {
                Ok(py.allow_threads(|| self.task.get_high(channel_name))?)
            }

            #[pyo3(name = "get_low")]
            fn py_get_low(&self, py: Python<'_>, channel_name: &str) -> PyResult<f64> {
                Ok(py.allow_threads(|| self.task.get_low(channel_name))?)
            }

            #[pyo3(name = "get_gain")]
            fn py_get_gain(&self, py: Python<'_>, channel_name: &str) -> PyResult<f64> {
                Ok(py.allow_threads(|| self.task.get_gain(channel_name))?)
            }

            #[pyo3(name = "get_measurement_type")]
            fn py_get_measurement_type(&self, py: Python<'_>, channel_name: &str) -> PyResult<&'static str> {
                Ok(py.allow_threads(|| self.task.get_measurement_type(channel_name))?.name())
            }

            #[pyo3(name = "get_units")]
            fn py_get_units(&self, py: Python<'_>, channel_name: &str) -> PyResult<&'static str> {
                Ok(py.allow_threads(|| self.task.get_units(channel_name))?.name())
            }

            #[pyo3(name = "get_auto_zero_mode")]
            fn py_get_auto_zero_mode(&self, py: Python<'_>, channel_name: &str) -> PyResult<&'static str> {
                Ok(py.allow_threads(|| self.task.get_auto_zero_mode(channel_name))?.name())
            }

            #[pyo3(name = "get_data_transfer_mechanism")]
            fn py_get_data_transfer_mechanism(&self, py: Python<'_>, channel_name: &str) -> PyResult<&'static str> {
                Ok(py.allow_threads(|| self.task.get_data_transfer_mechanism(channel_name))?.name())
            }

            #[pyo3(name = "get_regeneration")]
            fn py_get_regeneration(&self, py: Python<'_>) -> PyResult<bool> {
                Ok(py.allow_threads(|| self.task.get_regeneration())?)
            }

            #[pyo3(name = "set_regeneration", signature = (allow = true))]
            fn py_set_regeneration(&self, py: Python<'_>, allow: bool) -> PyResult<bool> {
                py.allow_threads(|| self.task.set_regeneration(allow))?;
                Ok(true)
            }

            #[pyo3(name = "reset_regeneration")]
            fn py_reset_regeneration(&self, py: Python<'_>) -> PyResult<bool> {
                py.allow_threads(|| self.task.reset_regeneration())?;
                Ok(true)
            }

            #[pyo3(name = "get_read_current_position")]
            fn py_get_read_current_position(&self, py: Python<'_>) -> PyResult<u64> {
                Ok(py.allow_threads(|| self.task.get_read_current_position())?)
            }

            #[pyo3(name = "get_samples_per_channel_available")]
            fn py_get_samples_per_channel_available(&self, py: Python<'_>) -> PyResult<u32> {
                Ok(py.allow_threads(|| self.task.get_samples_per_channel_available())?)
            }

            #[pyo3(name = "get_samples_per_channel_acquired")]
            fn py_get_samples_per_channel_acquired(&self, py: Python<'_>) -> PyResult<u64> {
                Ok(py.allow_threads(|| self.task.get_samples_per_channel_acquired())?)
            }

            #[pyo3(name = "get_write_current_position")]
            fn py_get_write_current_position(&self, py: Python<'_>) -> PyResult<u64> {
                Ok(py.allow_threads(|| self.task.get_write_current_position())?)
            }

            #[pyo3(name = "get_samples_per_channel_generated")]
            fn py_get_samples_per_channel_generated(&self, py: Python<'_>) -> PyResult<u64> {
                Ok(py.allow_threads(|| self.task.get_samples_per_channel_generated())?)
            }

            #[pyo3(name = "export_signal")]
            fn py_export_signal(&self, py: Python<'_>, signal: &str, terminal: &str) -> PyResult<bool> {
                py.allow_threads(|| self.task.export_signal(signal.parse()?, terminal))?;
                Ok(true)
            }

            #[pyo3(name = "set_ref_clock_source")]
            fn py_set_ref_clock_source(&self, py: Python<'_>, source: &str) -> PyResult<bool> {
                py.allow_threads(|| self.task.set_ref_clock_source(source))?;
                Ok(true)
            }

            #[pyo3(name = "set_ref_clock_rate")]
            fn py_set_ref_clock_rate(&self, py: Python<'_>, rate: f64) -> PyResult<bool> {
                py.allow_threads(|| self.task.set_ref_clock_rate(rate))?;
                Ok(true)
            }

            #[pyo3(name = "get_info_str", signature = (global_info = false))]
            fn py_get_info_str(&self, py: Python<'_>, global_info: bool) -> PyResult<String> {
                Ok(py.allow_threads(|| self.task.get_info_str(global_info))?)
            }

            #[pyo3(
                name = "register_every_n_samples_event",
                signature = (func, samples = 1, options = None, cb_data = None)
            )]
            fn py_register_every_n_samples_event(
                &mut self,
                py: Python<'_>,
                func: Option<PyObject>,
                samples: u32,
                options: Option<&str>,
                cb_data: Option<PyObject>,
            ) -> PyResult<bool> {
                let options = nidaqmx_common::parse_or(options, nidaqmx_common::EventOptions::Default)?;
                let func = func.map(|f| $crate::events::py_every_n_samples(f, cb_data));
                py.allow_threads(|| {
                    self.task.register_every_n_samples_event(func, samples, options)
                })?;
                Ok(true)
            }

            #[pyo3(
                name = "register_done_event",
                signature = (func, options = None, cb_data = None)
            )]
            fn py_register_done_event(
                &mut self,
                py: Python<'_>,
                func: Option<PyObject>,
                options: Option<&str>,
                cb_data: Option<PyObject>,
            ) -> PyResult<bool> {
                let options = nidaqmx_common::parse_or(options, nidaqmx_common::EventOptions::Default)?;
                let func = func.map(|f| $crate::events::py_done(f, cb_data));
                py.allow_threads(|| self.task.register_done_event(func, options))?;
                Ok(true)
            }

            #[pyo3(
                name = "register_signal_event",
                signature = (func, signal, options = None, cb_data = None)
            )]
            fn py_register_signal_event(
                &mut self,
                py: Python<'_>,
                func: Option<PyObject>,
                signal: &str,
                options: Option<&str>,
                cb_data: Option<PyObject>,
            ) -> PyResult<bool> {
                let options = nidaqmx_common::parse_or(options, nidaqmx_common::EventOptions::Default)?;
                let func = func.map(|f| $crate::events::py_signal(f, cb_data));
                py.allow_threads(|| {
                    self.task.register_signal_event(func, signal.parse()?, options)
                })?;
                Ok(true)
            }
        }
    };
}

pub(crate) use impl_task_boilerplate;
