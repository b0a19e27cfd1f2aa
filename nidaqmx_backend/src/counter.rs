//! Counter input and output tasks.
//!
//! A counter task holds a single counter channel. [`CounterInputTask`] counts edges,
//! [`CounterOutputTask`] generates pulse trains described by frequency, ticks or time.

use ndarray::{Array1, Slice};
use pyo3::prelude::*;

use nidaqmx_common::*;

use crate::nidaqmx::*;
use crate::task::{impl_task_boilerplate, NiTask};
use crate::utils::to_pyarray;

#[pyclass]
pub struct CounterInputTask {
    task: NiTask,
}

#[pyclass]
pub struct CounterOutputTask {
    task: NiTask,
}

impl_task_boilerplate!(CounterInputTask, ChannelType::CI);
impl_task_boilerplate!(CounterOutputTask, ChannelType::CO);

impl CounterInputTask {
    /// Counts `edge`s of a digital signal on `counter` (e.g. `"Dev1/ctr0"`), starting at `init`.
    pub fn create_channel_count_edges(
        &mut self,
        counter: &str,
        name: &str,
        edge: Edge,
        init: u32,
        direction: CountDirection,
    ) -> Result<()> {
        let counter = cstring(counter)?;
        let name = cstring(name)?;
        daqmx!(CreateCICountEdgesChan(
            self.handle(),
            counter.as_ptr(),
            name.as_ptr(),
            edge.val(),
            init,
            direction.val(),
        ))?;
        self.verify_last_channel()
    }

    /// Input terminal of the signal to count.
    pub fn set_terminal_count_edges(&self, channel: &str, terminal: &str) -> Result<()> {
        let channel = cstring(channel)?;
        let terminal = cstring(terminal)?;
        daqmx!(SetCICountEdgesTerm(self.handle(), channel.as_ptr(), terminal.as_ptr()))?;
        Ok(())
    }

    /// Reads counts, all currently available ones when `samples_per_channel` is `None`.
    pub fn read(&self, samples_per_channel: Option<u32>, timeout: f64) -> Result<Array1<u32>> {
        let samples = match samples_per_channel {
            Some(n) => n,
            None => self.get_samples_per_channel_available()?,
        };
        let samples_c = c_int32("samples per channel", samples as usize)?;
        let size = c_uint32("read buffer size", samples as usize)?;
        let mut data = Array1::<u32>::zeros(samples as usize);
        let mut samples_read: CInt32 = 0;
        daqmx!(ReadCounterU32(
            self.handle(),
            samples_c,
            timeout,
            data.as_mut_ptr(),
            size,
            &mut samples_read,
            std::ptr::null_mut(),
        ))?;
        let read = (samples_read.max(0) as usize).min(data.len());
        data.slice_axis_inplace(ndarray::Axis(0), Slice::from(..read));
        Ok(data)
    }
}

impl CounterOutputTask {
    /// Pulses at `freq` with the given duty cycle, after an initial `delay`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_channel_frequency(
        &mut self,
        counter: &str,
        name: &str,
        units: FrequencyUnits,
        idle_state: IdleState,
        delay: f64,
        freq: f64,
        duty_cycle: f64,
    ) -> Result<()> {
        let counter = cstring(counter)?;
        let name = cstring(name)?;
        daqmx!(CreateCOPulseChanFreq(
            self.handle(),
            counter.as_ptr(),
            name.as_ptr(),
            units.val(),
            idle_state.val(),
            delay,
            freq,
            duty_cycle,
        ))?;
        self.verify_last_channel()
    }

    /// Pulses counted in ticks of the timebase on `source`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_channel_ticks(
        &mut self,
        counter: &str,
        name: &str,
        source: &str,
        idle_state: IdleState,
        delay: i32,
        low_ticks: i32,
        high_ticks: i32,
    ) -> Result<()> {
        let counter = cstring(counter)?;
        let name = cstring(name)?;
        let source = cstring(source)?;
        daqmx!(CreateCOPulseChanTicks(
            self.handle(),
            counter.as_ptr(),
            name.as_ptr(),
            source.as_ptr(),
            idle_state.val(),
            delay,
            low_ticks,
            high_ticks,
        ))?;
        self.verify_last_channel()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_channel_time(
        &mut self,
        counter: &str,
        name: &str,
        units: TimeUnits,
        idle_state: IdleState,
        delay: f64,
        low_time: f64,
        high_time: f64,
    ) -> Result<()> {
        let counter = cstring(counter)?;
        let name = cstring(name)?;
        daqmx!(CreateCOPulseChanTime(
            self.handle(),
            counter.as_ptr(),
            name.as_ptr(),
            units.val(),
            idle_state.val(),
            delay,
            low_time,
            high_time,
        ))?;
        self.verify_last_channel()
    }

    /// Terminal on which the pulses are generated.
    pub fn set_terminal_pulse(&self, channel: &str, terminal: &str) -> Result<()> {
        let channel = cstring(channel)?;
        let terminal = cstring(terminal)?;
        daqmx!(SetCOPulseTerm(self.handle(), channel.as_ptr(), terminal.as_ptr()))?;
        Ok(())
    }
}

#[pymethods]
impl CounterInputTask {
    #[pyo3(
        name = "create_channel_count_edges",
        signature = (counter, name = "", edge = "rising", init = 0, direction = "up")
    )]
    fn py_create_channel_count_edges(
        &mut self,
        py: Python<'_>,
        counter: &str,
        name: &str,
        edge: &str,
        init: u32,
        direction: &str,
    ) -> PyResult<bool> {
        py.allow_threads(|| {
            self.create_channel_count_edges(counter, name, edge.parse()?, init, direction.parse()?)
        })?;
        Ok(true)
    }

    #[pyo3(name = "set_terminal_count_edges")]
    fn py_set_terminal_count_edges(
        &self,
        py: Python<'_>,
        channel: &str,
        terminal: &str,
    ) -> PyResult<bool> {
        py.allow_threads(|| self.set_terminal_count_edges(channel, terminal))?;
        Ok(true)
    }

    #[pyo3(name = "read", signature = (samples_per_channel = None, timeout = 10.0))]
    fn py_read(
        &self,
        py: Python<'_>,
        samples_per_channel: Option<u32>,
        timeout: f64,
    ) -> PyResult<PyObject> {
        Ok(to_pyarray(py, py.allow_threads(|| self.read(samples_per_channel, timeout))?))
    }
}

#[pymethods]
impl CounterOutputTask {
    #[pyo3(
        name = "create_channel_frequency",
        signature = (
            counter,
            name = "",
            units = "hertz",
            idle_state = "low",
            delay = 0.0,
            freq = 1.0,
            duty_cycle = 0.5
        )
    )]
    #[allow(clippy::too_many_arguments)]
    fn py_create_channel_frequency(
        &mut self,
        py: Python<'_>,
        counter: &str,
        name: &str,
        units: &str,
        idle_state: &str,
        delay: f64,
        freq: f64,
        duty_cycle: f64,
    ) -> PyResult<bool> {
        py.allow_threads(|| {
            self.create_channel_frequency(
                counter,
                name,
                units.parse()?,
                idle_state.parse()?,
                delay,
                freq,
                duty_cycle,
            )
        })?;
        Ok(true)
    }

    #[pyo3(
        name = "create_channel_ticks",
        signature = (
            counter,
            name = "",
            source = "",
            idle_state = "low",
            delay = 0,
            low_ticks = 1,
            high_ticks = 1
        )
    )]
    #[allow(clippy::too_many_arguments)]
    fn py_create_channel_ticks(
        &mut self,
        py: Python<'_>,
        counter: &str,
        name: &str,
        source: &str,
        idle_state: &str,
        delay: i32,
        low_ticks: i32,
        high_ticks: i32,
    ) -> PyResult<bool> {
        py.allow_threads(|| {
            self.create_channel_ticks(
                counter,
                name,
                source,
                idle_state.parse()?,
                delay,
                low_ticks,
                high_ticks,
            )
        })?;
        Ok(true)
    }

    #[pyo3(
        name = "create_channel_time",
        signature = (
            counter,
            name = "",
            units = "seconds",
            idle_state = "low",
            delay = 0.0,
            low_time = 1.0,
            high_time = 1.0
        )
    )]
    #[allow(clippy::too_many_arguments)]
    fn py_create_channel_time(
        &mut self,
        py: Python<'_>,
        counter: &str,
        name: &str,
        units: &str,
        idle_state: &str,
        delay: f64,
        low_time: f64,
        high_time: f64,
    ) -> PyResult<bool> {
        py.allow_threads(|| {
            self.create_channel_time(
                counter,
                name,
                units.parse()?,
                idle_state.parse()?,
                delay,
                low_time,
                high_time,
            )
        })?;
        Ok(true)
    }

    #[pyo3(name = "set_terminal_pulse")]
    fn py_set_terminal_pulse(
        &self,
        py: Python<'_>,
        channel: &str,
        terminal: &str,
    ) -> PyResult<bool> {
        py.allow_threads(|| self.set_terminal_pulse(channel, terminal))?;
        Ok(true)
    }
}
