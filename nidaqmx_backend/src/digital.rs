//! Digital input and output tasks.
//!
//! Line data is one byte per line: a channel created with `for_all_lines` grouping spans several
//! lines, so every sample of it is several bytes. Reads therefore return a 3-D array whose last
//! axis holds the line states of one sample. Port writes ([`DigitalOutputTask::write_port`])
//! take one `u32` per port instead.

use ndarray::{Array2, Array3, ArrayViewD, Axis, Ix0, Slice};
use pyo3::prelude::*;

use nidaqmx_common::*;

use crate::nidaqmx::*;
use crate::task::{impl_task_boilerplate, NiTask};
use crate::utils::{as_array, to_pyarray};

#[pyclass]
pub struct DigitalInputTask {
    task: NiTask,
}

#[pyclass]
pub struct DigitalOutputTask {
    task: NiTask,
}

impl_task_boilerplate!(DigitalInputTask, ChannelType::DI);
impl_task_boilerplate!(DigitalOutputTask, ChannelType::DO);

impl NiTask {
    /// Number of digital lines in a DI or DO channel.
    pub fn get_number_of_lines(&self, channel: &str) -> Result<u32> {
        let c = cstring(channel)?;
        let mut lines: CUint32 = 0;
        match self.channel_type() {
            ChannelType::DI => daqmx!(GetDINumLines(self.handle(), c.as_ptr(), &mut lines)),
            ChannelType::DO => daqmx!(GetDONumLines(self.handle(), c.as_ptr(), &mut lines)),
            other => Err(DaqmxError::Unsupported(format!(
                "{} tasks have no digital lines",
                other
            ))),
        }?;
        Ok(lines)
    }
}

impl DigitalInputTask {
    /// Creates digital input channel(s) on `lines` (e.g. `"Dev1/port0/line0:7"`, or a whole port
    /// with `for_all_lines` grouping).
    pub fn create_channel(&mut self, lines: &str, name: &str, grouping: LineGrouping) -> Result<()> {
        let lines = cstring(lines)?;
        let name = cstring(name)?;
        daqmx!(CreateDIChan(self.handle(), lines.as_ptr(), name.as_ptr(), grouping.val()))?;
        self.verify_last_channel()
    }

    /// Reads line states, one byte per line. Returns the data, cut to the samples and bytes per
    /// sample actually read, and the bytes per sample reported by the driver.
    pub fn read(
        &self,
        samples_per_channel: Option<u32>,
        timeout: f64,
        fill_mode: FillMode,
    ) -> Result<(Array3<u8>, usize)> {
        let samples = match samples_per_channel {
            Some(n) => n,
            None => self.get_samples_per_channel_available()?,
        };
        let samples_c = c_int32("samples per channel", samples as usize)?;
        // Channels of one task may mix groupings, the widest one sizes the buffer
        let line_counts = self
            .get_names_of_channels()?
            .iter()
            .map(|c| self.get_number_of_lines(c))
            .collect::<Result<Vec<_>>>()?;
        let bytes = digital_bytes_per_sample(&line_counts);
        let (rows, cols) = read_shape(samples as usize, line_counts.len(), fill_mode);
        let size = c_uint32("read buffer size", rows * cols * bytes)?;
        let mut data = Array3::<u8>::zeros((rows, cols, bytes));
        let mut samples_read: CInt32 = 0;
        let mut bytes_per_sample: CInt32 = 0;
        daqmx!(ReadDigitalLines(
            self.handle(),
            samples_c,
            timeout,
            fill_mode.val() as CBool32,
            data.as_mut_ptr(),
            size,
            &mut samples_read,
            &mut bytes_per_sample,
            std::ptr::null_mut(),
        ))?;
        let bytes_per_sample = (bytes_per_sample.max(0) as usize).min(bytes);
        let mut data = truncate_read(data, samples_read.max(0) as usize, fill_mode);
        data.slice_axis_inplace(Axis(2), Slice::from(..bytes_per_sample));
        Ok((data, bytes_per_sample))
    }
}

impl DigitalOutputTask {
    pub fn create_channel(&mut self, lines: &str, name: &str, grouping: LineGrouping) -> Result<()> {
        let lines = cstring(lines)?;
        let name = cstring(name)?;
        daqmx!(CreateDOChan(self.handle(), lines.as_ptr(), name.as_ptr(), grouping.val()))?;
        self.verify_last_channel()
    }

    // 0-d data is one sample of the same value on every channel
    fn output_buffer<A: Clone>(
        &self,
        data: ArrayViewD<A>,
        layout: FillMode,
    ) -> Result<(Array2<A>, usize)> {
        let channels = self.get_number_of_channels()? as usize;
        match data.view().into_dimensionality::<Ix0>() {
            Ok(scalar) => Ok((scalar_buffer(scalar.into_scalar().clone(), channels, layout), 1)),
            Err(_) => write_buffer(data, channels, layout),
        }
    }

    /// Writes line states (zero is low, anything else high) and returns the number of samples
    /// written per channel.
    pub fn write(
        &self,
        data: ArrayViewD<u8>,
        auto_start: bool,
        timeout: f64,
        layout: FillMode,
    ) -> Result<usize> {
        let (buffer, samples) = self.output_buffer(data, layout)?;
        let samples = c_int32("samples per channel", samples)?;
        let mut written: CInt32 = 0;
        daqmx!(WriteDigitalLines(
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

    /// Writes whole ports, one `u32` per port and sample.
    pub fn write_port(
        &self,
        data: ArrayViewD<u32>,
        auto_start: bool,
        timeout: f64,
        layout: FillMode,
    ) -> Result<usize> {
        let (buffer, samples) = self.output_buffer(data, layout)?;
        let samples = c_int32("samples per channel", samples)?;
        let mut written: CInt32 = 0;
        daqmx!(WriteDigitalU32(
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
impl DigitalInputTask {
    #[pyo3(name = "create_channel", signature = (lines, name = "", grouping = "per_line"))]
    fn py_create_channel(
        &mut self,
        py: Python<'_>,
        lines: &str,
        name: &str,
        grouping: &str,
    ) -> PyResult<bool> {
        py.allow_threads(|| self.create_channel(lines, name, grouping.parse()?))?;
        Ok(true)
    }

    #[pyo3(name = "get_number_of_lines")]
    fn py_get_number_of_lines(&self, py: Python<'_>, channel: &str) -> PyResult<u32> {
        Ok(py.allow_threads(|| self.get_number_of_lines(channel))?)
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
    ) -> PyResult<(PyObject, usize)> {
        let (data, bytes_per_sample) = py.allow_threads(|| {
            self.read(samples_per_channel, timeout, fill_mode.parse()?)
        })?;
        Ok((to_pyarray(py, data), bytes_per_sample))
    }
}

#[pymethods]
impl DigitalOutputTask {
    #[pyo3(name = "create_channel", signature = (lines, name = "", grouping = "per_line"))]
    fn py_create_channel(
        &mut self,
        py: Python<'_>,
        lines: &str,
        name: &str,
        grouping: &str,
    ) -> PyResult<bool> {
        py.allow_threads(|| self.create_channel(lines, name, grouping.parse()?))?;
        Ok(true)
    }

    #[pyo3(name = "get_number_of_lines")]
    fn py_get_number_of_lines(&self, py: Python<'_>, channel: &str) -> PyResult<u32> {
        Ok(py.allow_threads(|| self.get_number_of_lines(channel))?)
    }

    #[pyo3(
        name = "write",
        signature = (data, auto_start = true, timeout = 10.0, layout = "group_by_channel")
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
        let data = as_array::<u8>(py, data, "uint8")?.readonly().as_array().to_owned();
        Ok(py.allow_threads(|| self.write(data.view(), auto_start, timeout, layout))?)
    }

    #[pyo3(
        name = "write_port",
        signature = (data, auto_start = true, timeout = 10.0, layout = "group_by_channel")
    )]
    fn py_write_port(
        &self,
        py: Python<'_>,
        data: &PyAny,
        auto_start: bool,
        timeout: f64,
        layout: &str,
    ) -> PyResult<usize> {
        let layout = layout.parse()?;
        // Copied, numpy buffers must not be read without the GIL
        let data = as_array::<u32>(py, data, "uint32")?.readonly().as_array().to_owned();
        Ok(py.allow_threads(|| self.write_port(data.view(), auto_start, timeout, layout))?)
    }
}
