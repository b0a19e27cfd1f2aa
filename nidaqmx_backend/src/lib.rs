//! Python bindings for the National Instruments DAQmx driver.
//!
//! The vendor library is loaded at first use (see [`nidaqmx`]). Tasks are typed by the kind of
//! channel they hold: [`analog`], [`digital`] and [`counter`] define one class per channel type,
//! all sharing the operations of [`task::NiTask`].
//!
//! ## Example
//!
//! ```python
//! from nidaqmx_backend import AnalogInputTask, get_system_devices
//!
//! print(get_system_devices())
//! task = AnalogInputTask()
//! task.create_voltage_channel("Dev1/ai0", terminal="rse", min_val=-10, max_val=10)
//! task.configure_timing_sample_clock(rate=1000.0, sample_mode="finite", samples_per_channel=100)
//! task.start()
//! data = task.read(100)
//! ```

use log::{debug, LevelFilter};
use pyo3::prelude::*;

use nidaqmx_common::DaqmxError;

pub mod analog;
pub mod counter;
pub mod device;
pub mod digital;
pub mod events;
pub mod nidaqmx;
pub mod task;
pub mod utils;

pub use crate::analog::{AnalogInputTask, AnalogOutputTask};
pub use crate::counter::{CounterInputTask, CounterOutputTask};
pub use crate::device::Device;
pub use crate::digital::{DigitalInputTask, DigitalOutputTask};
pub use crate::task::{system_info, NiTask};

const LOG_LEVELS: &str = "off|error|warn|info|debug|trace";

/// Sets the log level ("off", "error", "warn", "info", "debug" or "trace"), installing the stderr
/// logger first if no logger is set yet.
///
/// # Example
///
/// ```no_run
/// nidaqmx_backend::init_logger("debug").unwrap();
/// assert_eq!(log::max_level(), log::LevelFilter::Debug);
/// ```
pub fn init_logger(level: &str) -> nidaqmx_common::Result<()> {
    let level = parse_level(level)?;
    if let Err(e) = install_logger() {
        debug!("Keeping the installed logger: {}", e);
    }
    log::set_max_level(level);
    Ok(())
}

fn parse_level(level: &str) -> nidaqmx_common::Result<LevelFilter> {
    level.parse().map_err(|_| DaqmxError::InvalidOption {
        label: "log level",
        expected: LOG_LEVELS.to_string(),
        got: level.to_string(),
    })
}

// Filters nothing itself, `log::max_level` decides
fn install_logger() -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, msg, record| {
            out.finish(format_args!(
                "[{:5}][{}] {}",
                record.level(),
                record.target(),
                msg
            ))
        })
        .chain(std::io::stderr())
        .apply()
}

// Driver warnings show up without any setup. A logger set by the host is left alone.
fn install_default_logger() {
    if install_logger().is_ok() {
        log::set_max_level(LevelFilter::Warn);
    }
}

#[pyfunction]
#[pyo3(name = "init_logging", signature = (level = "info"))]
fn py_init_logging(level: &str) -> PyResult<()> {
    Ok(init_logger(level)?)
}

#[pyfunction]
#[pyo3(name = "get_version")]
fn py_get_version(py: Python<'_>) -> PyResult<String> {
    Ok(py.allow_threads(nidaqmx::get_version)?)
}

#[pyfunction]
#[pyo3(name = "get_system_devices")]
fn py_get_system_devices(py: Python<'_>) -> PyResult<Vec<String>> {
    Ok(py.allow_threads(nidaqmx::get_system_devices)?)
}

#[pyfunction]
#[pyo3(name = "get_system_tasks")]
fn py_get_system_tasks(py: Python<'_>) -> PyResult<Vec<String>> {
    Ok(py.allow_threads(nidaqmx::get_system_tasks)?)
}

#[pyfunction]
#[pyo3(name = "get_system_global_channels")]
fn py_get_system_global_channels(py: Python<'_>) -> PyResult<Vec<String>> {
    Ok(py.allow_threads(nidaqmx::get_system_global_channels)?)
}

#[pyfunction]
#[pyo3(name = "reset_device")]
fn py_reset_device(py: Python<'_>, name: &str) -> PyResult<bool> {
    py.allow_threads(|| nidaqmx::reset_device(name))?;
    Ok(true)
}

#[pyfunction]
#[pyo3(name = "get_system_info")]
fn py_get_system_info(py: Python<'_>) -> PyResult<String> {
    Ok(py.allow_threads(system_info)?.to_string())
}

#[pyfunction]
#[pyo3(name = "make_pattern")]
fn py_make_pattern(paths: Vec<String>) -> PyResult<String> {
    Ok(nidaqmx_common::make_pattern(&paths)?)
}

#[pymodule]
fn nidaqmx_backend(_py: Python, m: &PyModule) -> PyResult<()> {
    install_default_logger();
    m.add_class::<AnalogInputTask>()?;
    m.add_class::<AnalogOutputTask>()?;
    m.add_class::<DigitalInputTask>()?;
    m.add_class::<DigitalOutputTask>()?;
    m.add_class::<CounterInputTask>()?;
    m.add_class::<CounterOutputTask>()?;
    m.add_class::<Device>()?;
    m.add_function(wrap_pyfunction!(py_init_logging, m)?)?;
    m.add_function(wrap_pyfunction!(py_get_version, m)?)?;
    m.add_function(wrap_pyfunction!(py_get_system_devices, m)?)?;
    m.add_function(wrap_pyfunction!(py_get_system_tasks, m)?)?;
    m.add_function(wrap_pyfunction!(py_get_system_global_channels, m)?)?;
    m.add_function(wrap_pyfunction!(py_reset_device, m)?)?;
    m.add_function(wrap_pyfunction!(py_get_system_info, m)?)?;
    m.add_function(wrap_pyfunction!(py_make_pattern, m)?)?;
    m.add("WAIT_INFINITELY", nidaqmx_common::DAQMX_VAL_WAITINFINITELY)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn log_levels() {
        // First logger of the process: warnings are on by default
        install_default_logger();
        assert_eq!(log::max_level(), LevelFilter::Warn);

        let err = init_logger("verbose").unwrap_err();
        assert!(matches!(err, DaqmxError::InvalidOption { label: "log level", .. }));
        assert_eq!(log::max_level(), LevelFilter::Warn);

        init_logger("DEBUG").unwrap();
        assert_eq!(log::max_level(), LevelFilter::Debug);
        init_logger("off").unwrap();
        assert_eq!(log::max_level(), LevelFilter::Off);

        // Importing again keeps the chosen level
        install_default_logger();
        assert_eq!(log::max_level(), LevelFilter::Off);
    }

    #[test]
    fn unknown_levels_are_value_errors() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let err: PyErr = parse_level("loud").unwrap_err().into();
            assert!(err.is_instance_of::<pyo3::exceptions::PyValueError>(py));
            assert!(err.to_string().contains("off|error|warn|info|debug|trace"));
        });
    }
}
