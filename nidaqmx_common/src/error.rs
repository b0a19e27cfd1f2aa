//! Error type shared by both crates, and its translation into python exceptions.
//!
//! Every DAQmx C-function returns an `int32` status code: zero is success, negative codes are
//! errors and positive codes are warnings. Errors become [`DaqmxError::Driver`]; warnings are
//! only logged by the back-end and never reach this type.

use pyo3::exceptions::{PyNotImplementedError, PyRuntimeError, PyTypeError, PyValueError};
use pyo3::PyErr;
use thiserror::Error;

use crate::constants::status_code_name;

pub type Result<T> = std::result::Result<T, DaqmxError>;

#[derive(Debug, Error)]
pub enum DaqmxError {
    #[error("{func} failed with error {name}={code}: {message}", name = code_name(.code))]
    Driver {
        func: String,
        code: i32,
        message: String,
    },

    #[error("failed to load NI-DAQmx library {path}: {message}. Make sure that NI-DAQmx is installed or set NIDAQMX_LIBRARY")]
    Load { path: String, message: String },

    #[error("NI-DAQmx library does not export {symbol}: {message}")]
    MissingSymbol { symbol: String, message: String },

    #[error("Expected {label} {expected} but got {got:?}")]
    InvalidOption {
        label: &'static str,
        expected: String,
        got: String,
    },

    #[error("driver returned unexpected {label} value {value}")]
    UnexpectedValue { label: &'static str, value: i32 },

    #[error("Expected channel type {expected} but got {got}")]
    ChannelTypeMismatch { expected: String, got: String },

    #[error("data of shape {shape:?} does not fit {channels} channel(s) with layout {layout}")]
    Shape {
        shape: Vec<usize>,
        channels: usize,
        layout: String,
    },

    #[error("Must specify custom_scale_name for custom scale.")]
    MissingCustomScale,

    #[error("pause trigger type is not specified")]
    PauseTriggerUnset,

    #[error("{0}")]
    Unsupported(String),

    #[error("cannot compress names into a pattern: {0}")]
    Pattern(String),

    #[error("string argument contains an interior NUL byte: {0}")]
    Nul(#[from] std::ffi::NulError),
}

fn code_name(code: &i32) -> &'static str {
    status_code_name(*code).unwrap_or("Unknown")
}

impl DaqmxError {
    /// Driver status code, if the error came from the driver.
    pub fn code(&self) -> Option<i32> {
        match self {
            DaqmxError::Driver { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<DaqmxError> for PyErr {
    fn from(err: DaqmxError) -> PyErr {
        let msg = err.to_string();
        match err {
            DaqmxError::InvalidOption { .. }
            | DaqmxError::Shape { .. }
            | DaqmxError::MissingCustomScale
            | DaqmxError::Pattern(_)
            | DaqmxError::Nul(_) => PyValueError::new_err(msg),
            DaqmxError::ChannelTypeMismatch { .. } | DaqmxError::PauseTriggerUnset => {
                PyTypeError::new_err(msg)
            }
            DaqmxError::Unsupported(_) => PyNotImplementedError::new_err(msg),
            _ => PyRuntimeError::new_err(msg),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn driver_error_message() {
        let err = DaqmxError::Driver {
            func: "DAQmxReadAnalogF64".to_string(),
            code: -200279,
            message: "Attempted to read samples that are no longer available.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "DAQmxReadAnalogF64 failed with error SamplesNoLongerAvailable=-200279: \
             Attempted to read samples that are no longer available."
        );
        assert_eq!(err.code(), Some(-200279));
    }

    #[test]
    fn unknown_driver_code() {
        let err = DaqmxError::Driver {
            func: "DAQmxStartTask".to_string(),
            code: -1,
            message: String::new(),
        };
        assert!(err.to_string().starts_with("DAQmxStartTask failed with error Unknown=-1"));
    }

    #[test]
    fn option_error_message() {
        let err = DaqmxError::InvalidOption {
            label: "edge",
            expected: "rising|falling".to_string(),
            got: "up".to_string(),
        };
        assert_eq!(err.to_string(), "Expected edge rising|falling but got \"up\"");
        assert_eq!(err.code(), None);
    }
}
