//! Analog input and output tasks.
//!
//! [`AnalogInputTask`] measures voltages into `f64` arrays, [`AnalogOutputTask`] generates
//! voltages from them. Shared task operations come from [`NiTask`] through `Deref`.
//!
//! ## Example
//!
//! ```ignore
//! let mut task = AnalogInputTask::new(None)?;
//! task.create_voltage_channel("Dev1/ai0:3", "", TerminalConfig::Rse, -10.0, 10.0, VoltageUnits::Volts, None)?;
//! task.configure_timing_sample_clock("OnboardClock", 1e3, Edge::Rising, SampleMode::Finite, 1000)?;
//! task.start()?;
//! let data = task.read(Some(1000), 10.0, FillMode::GroupByScanNumber)?; // shape (1000, 4)
//! ```

use ndarray::{Array2, ArrayViewD, Ix0};
use pyo3::prelude::*;
use std::ffi::CString;

use nidaqmx_common::*;

use crate::nidaqmx::*;
use crate::task::{impl_task_boilerplate, NiTask};
use crate::utils::{as_array, to_pyarray};

#[pyclass]
pub struct AnalogInputTask {
    task: NiTask,
}

#[pyclass]
pub struct AnalogOutputTask {
    task: NiTask,
}

impl_task_boilerplate!(AnalogInputTask, ChannelType::AI);
impl_task_boilerplate!(AnalogOutputTask, ChannelType::AO);

// Custom units need a scale; the scale name is passed as NULL otherwise.
fn custom_scale(units: VoltageUnits, custom_scale_name: Option<&str>) -> Result<Option<CString>> {
    if units == VoltageUnits::Custom && custom_scale_name.is_none() {
        return Err(DaqmxError::MissingCustomScale);
    }
    custom_scale_name.map(cstring).transpose()
}

fn c_ptr_or_null(s: &Option<CString>) -> CConstStr {
    s.as_ref().map_or(std::ptr::null(), |s| s.as_ptr())
}

impl AnalogInputTask {
    /// Creates voltage measurement channel(s) on `phys_channel` (e.g. `"Dev1/ai0:3"`). An empty
    /// `channel_name` names the channels after their physical channels.
    #[allow(clippy::too_many_arguments)]
    pub fn create_voltage_channel(
        &mut self,
        phys_channel: &str,
        channel_name: &str,
        terminal: TerminalConfig,
        min_val: f64,
        max_val: f64,
        units: VoltageUnits,
        custom_scale_name: Option<&str>,
    ) -> Result<()> {
        let scale = custom_scale(units, custom_scale_name)?;
        let phys = cstring(phys_channel)?;
        let name = cstring(channel_name)?;
        daqmx!(CreateAIVoltageChan(
            self.handle(),
            phys.as_ptr(),
            name.as_ptr(),
            terminal.val(),
            min_val,
            max_val,
            units.val(),
            c_ptr_or_null(&scale),
        ))?;
        self.verify_last_channel()
    }

    /// Reads `samples_per_channel` samples of every channel, or all currently available samples
    /// when `None`. The result is cut to the samples actually read.
    ///
    /// # Parameters
    ///
    /// * `timeout`: Seconds to wait for the samples, [`DAQMX_VAL_WAITINFINITELY`] to wait
    ///   forever.
    /// * `fill_mode`: [`FillMode::GroupByChannel`] returns one row per channel,
    ///   [`FillMode::GroupByScanNumber`] one row per sample.
    ///
    /// # Errors
    ///
    /// Fails if the request does not fit the driver's 32-bit counts, or with the driver error,
    /// e.g. a timeout before all samples were read.
    pub fn read(
        &self,
        samples_per_channel: Option<u32>,
        timeout: f64,
        fill_mode: FillMode,
    ) -> Result<Array2<f64>> {
        let samples = match samples_per_channel {
            Some(n) => n,
            None => self.get_samples_per_channel_available()?,
        };
        let samples_c = c_int32("samples per channel", samples as usize)?;
        let channels = self.get_number_of_channels()? as usize;
        let shape = read_shape(samples as usize, channels, fill_mode);
        let size = c_uint32("read buffer size", shape.0 * shape.1)?;
        let mut data = Array2::<f64>::zeros(shape);
        let mut samples_read: CInt32 = 0;
        daqmx!(ReadAnalogF64(
            self.handle(),
            samples_c,
            timeout,
            fill_mode.val() as CBool32,
            data.as_mut_ptr(),
            size,
            &mut samples_read,
            std::ptr::null_mut(),
        ))?;
        Ok(truncate_read(data, samples_read.max(0) as usize, fill_mode))
    }
}

impl AnalogOutputTask {
    /// Creates voltage generation channel(s) on `phys_channel` (e.g. `"Dev1/ao0:1"`).
    pub fn create_voltage_channel(
        &mut self,
        phys_channel: &str,
        channel_name: &str,
        min_val: f64,
        max_val: f64,
        units: VoltageUnits,
        custom_scale_name: Option<&str>,
    ) -> Result<()> {
        let scale = custom_scale(units, custom_scale_name)?;
        let phys = cstring(phys_channel)?;
        let name = cstring(channel_name)?;
        daqmx!(CreateAOVoltageChan(
            self.handle(),
            phys.as_ptr(),
            name.as_ptr(),
            min_val,
            max_val,
            units.val(),
            c_ptr_or_null(&scale),
        ))?;
        self.verify_last_channel()
    }

    /// Writes a single value to a task with one channel.
    pub fn write_scalar(&self, value: f64, auto_start: bool, timeout: f64) -> Result<()> {
        daqmx!(WriteAnalogScalarF64(
            self.handle(),
            auto_start as CBool32,
            timeout,
            value,
            std::ptr::null_mut(),
        ))?;
        Ok(())
    }

    /// Writes samples to the task's channels and returns the number of samples written per
    /// channel. 0-d data goes through [`AnalogOutputTask::write_scalar`]; 1-D and 2-D data are
    /// laid out as described in [`write_buffer`].
    pub fn write(
        &self,
        data: ArrayViewD<f64>,
        auto_start: bool,
        timeout: f64,
        layout: FillMode,
    ) -> Result<usize> {
        if let Ok(scalar) = data.view().into_dimensionality::<Ix0>() {
            self.write_scalar(*scalar.into_scalar(), auto_start, timeout)?;
            return Ok(1);
        }
        let channels = self.get_number_of_channels()? as usize;
        let (buffer, samples) = write_buffer(data, channels, layout)?;
        let samples = c_int32("samples per channel", samples)?;
        let mut written: CInt32 = 0;
        daqmx!(WriteAnalogF64(
            self.handle(),
            samples,
            auto_start as CBool32,
            timeout,
            layout.val() as CBool32,
            buffer.as_ptr(),
            &mut written,
            std::ptr::null_mut(),
        ))?;
        Ok(written.max(0) as usize)
    }
}

#[pymethods]
impl AnalogInputTask {
    #[pyo3(
        name = "create_voltage_channel",
        signature = (
            phys_channel,
            channel_name = "",
            terminal = "default",
            min_val = -1.0,
            max_val = 1.0,
            units = "volts",
            custom_scale_name = None
        )
    )]
    #[allow(clippy::too_many_arguments)]
    fn py_create_voltage_channel(
        &mut self,
        py: Python<'_>,
        phys_channel: &str,
        channel_name: &str,
        terminal: &str,
        min_val: f64,
        max_val: f64,
        units: &str,
        custom_scale_name: Option<&str>,
    ) -> PyResult<bool> {
        py.allow_threads(|| {
            self.create_voltage_channel(
                phys_channel,
                channel_name,
                TerminalConfig::parse_any_case(terminal)?,
                min_val,
                max_val,
                units.parse()?,
                custom_scale_name,
            )
        })?;
        Ok(true)
    }

    #[pyo3(
        name = "read",
        signature = (samples_per_channel = None, timeout = 10.0, fill_mode = "group_by_scan_number")
    )]
    fn py_read(
        &self,
        py: Python<'_>,
        samples_per_channel: Option<u32>,
        timeout: f64,
        fill_mode: &str,
    ) -> PyResult<PyObject> {
        let data = py.allow_threads(|| {
            self.read(samples_per_channel, timeout, fill_mode.parse()?)
        })?;
        Ok(to_pyarray(py, data))
    }
}

#[pymethods]
impl AnalogOutputTask {
    #[pyo3(
        name = "create_voltage_channel",
        signature = (
            phys_channel,
            channel_name = "",
            min_val = -1.0,
            max_val = 1.0,
            units = "volts",
            custom_scale_name = None
        )
    )]
    fn py_create_voltage_channel(
        &mut self,
        py: Python<'_>,
        phys_channel: &str,
        channel_name: &str,
        min_val: f64,
        max_val: f64,
        units: &str,
        custom_scale_name: Option<&str>,
    ) -> PyResult<bool> {
        py.allow_threads(|| {
            self.create_voltage_channel(
                phys_channel,
                channel_name,
                min_val,
                max_val,
                units.parse()?,
                custom_scale_name,
            )
        })?;
        Ok(true)
    }

    #[pyo3(
        name = "write",
        signature = (data, auto_start = true, timeout = 10.0, layout = "group_by_scan_number")
    )]
    fn py_write(
        &self,
        py: Python<'_>,
        data: &PyAny,
        auto_start: bool,
        timeout: f64,
        layout: &str,
    ) -> PyResult<usize> {
        let layout = layout.parse()?;
        // Copied, numpy buffers must not be read without the GIL
        let data = as_array::<f64>(py, data, "float64")?.readonly().as_array().to_owned();
        Ok(py.allow_threads(|| self.write(data.view(), auto_start, timeout, layout))?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn custom_units_need_a_scale() {
        assert!(matches!(
            custom_scale(VoltageUnits::Custom, None),
            Err(DaqmxError::MissingCustomScale)
        ));
        let scale = custom_scale(VoltageUnits::Custom, Some("thermo")).unwrap();
        assert_eq!(scale.as_deref().map(|s| s.to_bytes()), Some(&b"thermo"[..]));
    }

    #[test]
    fn volts_pass_a_null_scale() {
        let scale = custom_scale(VoltageUnits::Volts, None).unwrap();
        assert!(c_ptr_or_null(&scale).is_null());
    }
}
