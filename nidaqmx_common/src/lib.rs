//! Driver-independent building blocks of the NI-DAQmx binding.
//!
//! - [`constants`]: vendor `DAQmx_Val_*` values and status code names.
//! - [`options`]: typed string options and their vendor values.
//! - [`error`]: [`DaqmxError`] and its mapping to python exceptions.
//! - [`pattern`]: [`make_pattern`], the channel-name range compressor.
//! - [`layout`]: read/write buffer shapes.
//! - [`info`]: task and system reports.
//!
//! Nothing here calls into the driver, so the crate builds and tests on machines without
//! NI-DAQmx installed. The driver-facing half lives in `nidaqmx_backend`.

pub mod constants;
pub mod error;
pub mod info;
pub mod layout;
pub mod options;
pub mod pattern;

pub use constants::*;
pub use error::*;
pub use info::*;
pub use layout::*;
pub use options::*;
pub use pattern::*;
