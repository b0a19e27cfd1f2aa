//! Provides access to the NI-DAQmx C library.
//!
//! ## Overview
//!
//! The driver is loaded at first use with [`libloading`], the same way a scripting language
//! would `dlopen` it, so this crate builds, links and tests on machines without NI-DAQmx.
//! Every entry point the binding needs is resolved once into the [`DaqmxApi`] function table.
//! The library location is taken from the `NIDAQMX_LIBRARY` environment variable, or the
//! platform default install location.
//!
//! ## Return codes
//!
//! Every DAQmx C-function returns an `int32` status. [`daqmx_call`] (usually through the
//! [`daqmx!`] macro) applies the vendor convention:
//! - `0` is success;
//! - positive codes are warnings: logged with [`log::warn!`], the call still succeeds;
//! - negative codes are errors: the extended error text is fetched from the driver, appended to
//!   the error log file (`nidaqmx_error.logs` in the directory of the calling shell, see
//!   [`error_log_path`]) and returned as [`DaqmxError::Driver`].
//!
//! ## Example
//!
//! ```ignore
//! # use nidaqmx_backend::nidaqmx::*;
//! println!("NI-DAQmx {}", get_version()?);
//! for dev in get_system_devices()? {
//!     reset_device(&dev)?;
//! }
//! ```
//!
//! For more details on the C functions, refer to the
//! [NI-DAQmx C Reference](https://www.ni.com/docs/en-US/bundle/ni-daqmx-c-api-ref/page/cdaqmx/help_file_title.html).

use libc;
use libloading::Library;
use log::{error, warn};
use std::ffi::{CStr, CString};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub use nidaqmx_common::CInt32;
use nidaqmx_common::{status_code_name, DaqmxError, Result};

pub type CConstStr = *const libc::c_char;
pub type CCharBuf = *mut libc::c_char;
pub type CFloat64 = libc::c_double;
pub type CUint32 = libc::c_uint;
pub type CUint64 = libc::c_ulonglong;
pub type CBool32 = libc::c_uint;
pub type TaskHandle = *mut libc::c_void;

pub type EveryNSamplesCallback =
    unsafe extern "C" fn(TaskHandle, CInt32, CUint32, *mut libc::c_void) -> CInt32;
pub type DoneCallback = unsafe extern "C" fn(TaskHandle, CInt32, *mut libc::c_void) -> CInt32;
pub type SignalCallback = unsafe extern "C" fn(TaskHandle, CInt32, *mut libc::c_void) -> CInt32;

/// Environment variable overriding the driver library location.
pub const LIBRARY_ENV: &str = "NIDAQMX_LIBRARY";
/// Environment variable overriding the error log file. Set it empty to disable the log file.
pub const ERROR_LOG_ENV: &str = "NIDAQMX_ERROR_LOG";
pub const DEFAULT_ERROR_LOG: &str = "nidaqmx_error.logs";

#[cfg(target_os = "windows")]
const DEFAULT_LIBRARIES: &[&str] = &["nicaiu.dll"];
#[cfg(target_os = "macos")]
const DEFAULT_LIBRARIES: &[&str] = &["/Library/Frameworks/nidaqmx.framework/nidaqmx"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const DEFAULT_LIBRARIES: &[&str] = &["libnidaqmx.so", "libnidaqmx.so.1"];

macro_rules! daqmx_api {
    ($( fn $name:ident($($arg:ident: $ty:ty),* $(,)?); )+) => {
        /// Function table of the loaded NI-DAQmx library. Field names are the C-function names
        /// without the `DAQmx` prefix.
        #[allow(non_snake_case)]
        pub struct DaqmxApi {
            _lib: Library,
            $( pub $name: unsafe extern "C" fn($($arg: $ty),*) -> CInt32, )+
        }

        impl DaqmxApi {
            #[allow(non_snake_case)]
            unsafe fn from_library(lib: Library) -> Result<Self> {
                $(
                    let symbol = concat!("DAQmx", stringify!($name));
                    let $name = *lib
                        .get::<unsafe extern "C" fn($($arg: $ty),*) -> CInt32>(symbol.as_bytes())
                        .map_err(|e| DaqmxError::MissingSymbol {
                            symbol: symbol.to_string(),
                            message: e.to_string(),
                        })?;
                )+
                Ok(Self { _lib: lib, $( $name ),+ })
            }
        }
    };
}

daqmx_api! {
    // System and errors
    fn GetSysNIDAQMajorVersion(data: *mut CUint32);
    fn GetSysNIDAQMinorVersion(data: *mut CUint32);
    fn GetSysDevNames(data: CCharBuf, buffer_size: CUint32);
    fn GetSysTasks(data: CCharBuf, buffer_size: CUint32);
    fn GetSysGlobalChans(data: CCharBuf, buffer_size: CUint32);
    fn ResetDevice(device: CConstStr);
    fn GetErrorString(error_code: CInt32, error_string: CCharBuf, buffer_size: CUint32);
    fn GetExtendedErrorInfo(error_string: CCharBuf, buffer_size: CUint32);

    // Devices
    fn GetDevProductType(device: CConstStr, data: CCharBuf, buffer_size: CUint32);
    fn GetDevProductNum(device: CConstStr, data: *mut CUint32);
    fn GetDevSerialNum(device: CConstStr, data: *mut CUint32);
    fn GetDevAIPhysicalChans(device: CConstStr, data: CCharBuf, buffer_size: CUint32);
    fn GetDevAOPhysicalChans(device: CConstStr, data: CCharBuf, buffer_size: CUint32);
    fn GetDevDILines(device: CConstStr, data: CCharBuf, buffer_size: CUint32);
    fn GetDevDIPorts(device: CConstStr, data: CCharBuf, buffer_size: CUint32);
    fn GetDevDOLines(device: CConstStr, data: CCharBuf, buffer_size: CUint32);
    fn GetDevDOPorts(device: CConstStr, data: CCharBuf, buffer_size: CUint32);
    fn GetDevCIPhysicalChans(device: CConstStr, data: CCharBuf, buffer_size: CUint32);
    fn GetDevCOPhysicalChans(device: CConstStr, data: CCharBuf, buffer_size: CUint32);
    fn GetDevBusType(device: CConstStr, data: *mut CInt32);
    fn GetDevPCIBusNum(device: CConstStr, data: *mut CUint32);
    fn GetDevPCIDevNum(device: CConstStr, data: *mut CUint32);
    fn GetDevPXISlotNum(device: CConstStr, data: *mut CUint32);
    fn GetDevPXIChassisNum(device: CConstStr, data: *mut CUint32);

    // Task lifecycle
    fn CreateTask(task_name: CConstStr, handle: *mut TaskHandle);
    fn GetTaskName(handle: TaskHandle, data: CCharBuf, buffer_size: CUint32);
    fn ClearTask(handle: TaskHandle);
    fn StartTask(handle: TaskHandle);
    fn StopTask(handle: TaskHandle);
    fn IsTaskDone(handle: TaskHandle, is_task_done: *mut CBool32);
    fn TaskControl(handle: TaskHandle, action: CInt32);
    fn WaitUntilTaskDone(handle: TaskHandle, time_to_wait: CFloat64);
    fn GetTaskNumChans(handle: TaskHandle, data: *mut CUint32);
    fn GetTaskChannels(handle: TaskHandle, data: CCharBuf, buffer_size: CUint32);
    fn GetTaskDevices(handle: TaskHandle, data: CCharBuf, buffer_size: CUint32);

    // Events
    fn RegisterEveryNSamplesEvent(
        handle: TaskHandle,
        event_type: CInt32,
        n_samples: CUint32,
        options: CUint32,
        callback: Option<EveryNSamplesCallback>,
        callback_data: *mut libc::c_void,
    );
    fn RegisterDoneEvent(
        handle: TaskHandle,
        options: CUint32,
        callback: Option<DoneCallback>,
        callback_data: *mut libc::c_void,
    );
    fn RegisterSignalEvent(
        handle: TaskHandle,
        signal_id: CInt32,
        options: CUint32,
        callback: Option<SignalCallback>,
        callback_data: *mut libc::c_void,
    );

    // Timing
    fn CfgSampClkTiming(
        handle: TaskHandle,
        source: CConstStr,
        rate: CFloat64,
        active_edge: CInt32,
        sample_mode: CInt32,
        samps_per_chan: CUint64,
    );
    fn CfgChangeDetectionTiming(
        handle: TaskHandle,
        rising_edge_chan: CConstStr,
        falling_edge_chan: CConstStr,
        sample_mode: CInt32,
        samps_per_chan: CUint64,
    );
    fn CfgHandshakingTiming(handle: TaskHandle, sample_mode: CInt32, samps_per_chan: CUint64);
    fn CfgImplicitTiming(handle: TaskHandle, sample_mode: CInt32, samps_per_chan: CUint64);

    // Triggers
    fn CfgAnlgEdgeStartTrig(handle: TaskHandle, source: CConstStr, slope: CInt32, level: CFloat64);
    fn CfgAnlgWindowStartTrig(
        handle: TaskHandle,
        source: CConstStr,
        when: CInt32,
        top: CFloat64,
        bottom: CFloat64,
    );
    fn CfgDigEdgeStartTrig(handle: TaskHandle, source: CConstStr, edge: CInt32);
    fn CfgDigPatternStartTrig(handle: TaskHandle, source: CConstStr, pattern: CConstStr, when: CInt32);
    fn DisableStartTrig(handle: TaskHandle);
    fn SetArmStartTrigType(handle: TaskHandle, data: CInt32);
    fn GetArmStartTrigType(handle: TaskHandle, data: *mut CInt32);
    fn ResetArmStartTrigType(handle: TaskHandle);
    fn SetDigEdgeArmStartTrigSrc(handle: TaskHandle, data: CConstStr);
    fn SetDigEdgeArmStartTrigEdge(handle: TaskHandle, data: CInt32);
    fn SetPauseTrigType(handle: TaskHandle, data: CInt32);
    fn SetDigLvlPauseTrigSrc(handle: TaskHandle, data: CConstStr);
    fn SetAnlgLvlPauseTrigSrc(handle: TaskHandle, data: CConstStr);
    fn SetAnlgWinPauseTrigSrc(handle: TaskHandle, data: CConstStr);
    fn SetDigLvlPauseTrigWhen(handle: TaskHandle, data: CInt32);
    fn SetAnlgLvlPauseTrigWhen(handle: TaskHandle, data: CInt32);
    fn SetAnlgWinPauseTrigWhen(handle: TaskHandle, data: CInt32);

    // Buffers
    fn CfgInputBuffer(handle: TaskHandle, num_samps_per_chan: CUint32);
    fn CfgOutputBuffer(handle: TaskHandle, num_samps_per_chan: CUint32);
    fn GetBufInputBufSize(handle: TaskHandle, data: *mut CUint32);
    fn GetBufOutputBufSize(handle: TaskHandle, data: *mut CUint32);
    fn GetBufInputOnbrdBufSize(handle: TaskHandle, data: *mut CUint32);
    fn GetBufOutputOnbrdBufSize(handle: TaskHandle, data: *mut CUint32);
    fn SetBufInputBufSize(handle: TaskHandle, data: CUint32);
    fn SetBufOutputBufSize(handle: TaskHandle, data: CUint32);
    fn ResetBufInputBufSize(handle: TaskHandle);
    fn ResetBufOutputBufSize(handle: TaskHandle);

    // Channel properties
    fn GetPhysicalChanName(handle: TaskHandle, channel: CConstStr, data: CCharBuf, buffer_size: CUint32);
    fn GetChanType(handle: TaskHandle, channel: CConstStr, data: *mut CInt32);
    fn GetChanIsGlobal(handle: TaskHandle, channel: CConstStr, data: *mut CBool32);
    fn GetAIMax(handle: TaskHandle, channel: CConstStr, data: *mut CFloat64);
    fn GetAOMax(handle: TaskHandle, channel: CConstStr, data: *mut CFloat64);
    fn SetAIMax(handle: TaskHandle, channel: CConstStr, data: CFloat64);
    fn SetAOMax(handle: TaskHandle, channel: CConstStr, data: CFloat64);
    fn ResetAIMax(handle: TaskHandle, channel: CConstStr);
    fn ResetAOMax(handle: TaskHandle, channel: CConstStr);
    fn GetAIMin(handle: TaskHandle, channel: CConstStr, data: *mut CFloat64);
    fn GetAOMin(handle: TaskHandle, channel: CConstStr, data: *mut CFloat64);
    fn SetAIMin(handle: TaskHandle, channel: CConstStr, data: CFloat64);
    fn SetAOMin(handle: TaskHandle, channel: CConstStr, data: CFloat64);
    fn ResetAIMin(handle: TaskHandle, channel: CConstStr);
    fn ResetAOMin(handle: TaskHandle, channel: CConstStr);
    fn GetAIRngHigh(handle: TaskHandle, channel: CConstStr, data: *mut CFloat64);
    fn GetAODACRngHigh(handle: TaskHandle, channel: CConstStr, data: *mut CFloat64);
    fn GetAIRngLow(handle: TaskHandle, channel: CConstStr, data: *mut CFloat64);
    fn GetAODACRngLow(handle: TaskHandle, channel: CConstStr, data: *mut CFloat64);
    fn GetAIGain(handle: TaskHandle, channel: CConstStr, data: *mut CFloat64);
    fn GetAOGain(handle: TaskHandle, channel: CConstStr, data: *mut CFloat64);
    fn GetAIMeasType(handle: TaskHandle, channel: CConstStr, data: *mut CInt32);
    fn GetAOOutputType(handle: TaskHandle, channel: CConstStr, data: *mut CInt32);
    fn GetAIVoltageUnits(handle: TaskHandle, channel: CConstStr, data: *mut CInt32);
    fn GetAOVoltageUnits(handle: TaskHandle, channel: CConstStr, data: *mut CInt32);
    fn GetAIAutoZeroMode(handle: TaskHandle, channel: CConstStr, data: *mut CInt32);
    fn GetAIDataXferMech(handle: TaskHandle, channel: CConstStr, data: *mut CInt32);
    fn GetAODataXferMech(handle: TaskHandle, channel: CConstStr, data: *mut CInt32);
    fn GetDINumLines(handle: TaskHandle, channel: CConstStr, data: *mut CUint32);
    fn GetDONumLines(handle: TaskHandle, channel: CConstStr, data: *mut CUint32);

    // Write and read status
    fn GetWriteRegenMode(handle: TaskHandle, data: *mut CInt32);
    fn SetWriteRegenMode(handle: TaskHandle, data: CInt32);
    fn ResetWriteRegenMode(handle: TaskHandle);
    fn GetReadCurrReadPos(handle: TaskHandle, data: *mut CUint64);
    fn GetReadAvailSampPerChan(handle: TaskHandle, data: *mut CUint32);
    fn GetReadTotalSampPerChanAcquired(handle: TaskHandle, data: *mut CUint64);
    fn GetWriteCurrWritePos(handle: TaskHandle, data: *mut CUint64);
    fn GetWriteTotalSampPerChanGenerated(handle: TaskHandle, data: *mut CUint64);

    // Routing and clocks
    fn ExportSignal(handle: TaskHandle, signal_id: CInt32, output_terminal: CConstStr);
    fn SetRefClkSrc(handle: TaskHandle, data: CConstStr);
    fn SetRefClkRate(handle: TaskHandle, data: CFloat64);

    // Channel creation
    fn CreateAIVoltageChan(
        handle: TaskHandle,
        physical_channel: CConstStr,
        name_to_assign: CConstStr,
        terminal_config: CInt32,
        min_val: CFloat64,
        max_val: CFloat64,
        units: CInt32,
        custom_scale_name: CConstStr,
    );
    fn CreateAOVoltageChan(
        handle: TaskHandle,
        physical_channel: CConstStr,
        name_to_assign: CConstStr,
        min_val: CFloat64,
        max_val: CFloat64,
        units: CInt32,
        custom_scale_name: CConstStr,
    );
    fn CreateDIChan(handle: TaskHandle, lines: CConstStr, name_to_assign: CConstStr, line_grouping: CInt32);
    fn CreateDOChan(handle: TaskHandle, lines: CConstStr, name_to_assign: CConstStr, line_grouping: CInt32);
    fn CreateCICountEdgesChan(
        handle: TaskHandle,
        counter: CConstStr,
        name_to_assign: CConstStr,
        edge: CInt32,
        initial_count: CUint32,
        count_direction: CInt32,
    );
    fn SetCICountEdgesTerm(handle: TaskHandle, channel: CConstStr, data: CConstStr);
    fn CreateCOPulseChanFreq(
        handle: TaskHandle,
        counter: CConstStr,
        name_to_assign: CConstStr,
        units: CInt32,
        idle_state: CInt32,
        initial_delay: CFloat64,
        freq: CFloat64,
        duty_cycle: CFloat64,
    );
    fn CreateCOPulseChanTicks(
        handle: TaskHandle,
        counter: CConstStr,
        name_to_assign: CConstStr,
        source_terminal: CConstStr,
        idle_state: CInt32,
        initial_delay: CInt32,
        low_ticks: CInt32,
        high_ticks: CInt32,
    );
    fn CreateCOPulseChanTime(
        handle: TaskHandle,
        counter: CConstStr,
        name_to_assign: CConstStr,
        units: CInt32,
        idle_state: CInt32,
        initial_delay: CFloat64,
        low_time: CFloat64,
        high_time: CFloat64,
    );
    fn SetCOPulseTerm(handle: TaskHandle, channel: CConstStr, data: CConstStr);

    // Buffered read and write
    fn ReadAnalogF64(
        handle: TaskHandle,
        num_samps_per_chan: CInt32,
        timeout: CFloat64,
        fill_mode: CBool32,
        read_array: *mut CFloat64,
        array_size_in_samps: CUint32,
        samps_per_chan_read: *mut CInt32,
        reserved: *mut CBool32,
    );
    fn WriteAnalogF64(
        handle: TaskHandle,
        num_samps_per_chan: CInt32,
        auto_start: CBool32,
        timeout: CFloat64,
        data_layout: CBool32,
        write_array: *const CFloat64,
        samps_per_chan_written: *mut CInt32,
        reserved: *mut CBool32,
    );
    fn WriteAnalogScalarF64(
        handle: TaskHandle,
        auto_start: CBool32,
        timeout: CFloat64,
        value: CFloat64,
        reserved: *mut CBool32,
    );
    fn ReadDigitalLines(
        handle: TaskHandle,
        num_samps_per_chan: CInt32,
        timeout: CFloat64,
        fill_mode: CBool32,
        read_array: *mut u8,
        array_size_in_bytes: CUint32,
        samps_per_chan_read: *mut CInt32,
        num_bytes_per_samp: *mut CInt32,
        reserved: *mut CBool32,
    );
    fn WriteDigitalLines(
        handle: TaskHandle,
        num_samps_per_chan: CInt32,
        auto_start: CBool32,
        timeout: CFloat64,
        data_layout: CBool32,
        write_array: *const u8,
        samps_per_chan_written: *mut CInt32,
        reserved: *mut CBool32,
    );
    fn WriteDigitalU32(
        handle: TaskHandle,
        num_samps_per_chan: CInt32,
        auto_start: CBool32,
        timeout: CFloat64,
        data_layout: CBool32,
        write_array: *const u32,
        samps_per_chan_written: *mut CInt32,
        reserved: *mut CBool32,
    );
    fn ReadCounterU32(
        handle: TaskHandle,
        num_samps_per_chan: CInt32,
        timeout: CFloat64,
        read_array: *mut u32,
        array_size_in_samps: CUint32,
        samps_per_chan_read: *mut CInt32,
        reserved: *mut CBool32,
    );
}

/// Calls a DAQmx C-function through the function table and checks its status, e.g.
/// `daqmx!(StartTask(handle))?`. Expands to [`daqmx_call`] with the full C-function name.
macro_rules! daqmx {
    ($func:ident($($arg:expr),* $(,)?)) => {
        $crate::nidaqmx::daqmx_call(concat!("DAQmx", stringify!($func)), |api| unsafe {
            (api.$func)($($arg),*)
        })
    };
}

/// Like [`daqmx!`] for C-functions filling a string buffer: the trailing `(buffer, size)`
/// arguments are supplied by [`daqmx_string`].
macro_rules! daqmx_string_macro {
    ($func:ident($($arg:expr),* $(,)?)) => {
        $crate::nidaqmx::daqmx_string(concat!("DAQmx", stringify!($func)), |api, buf, size| unsafe {
            (api.$func)($($arg,)* buf, size)
        })
    };
}

pub(crate) use daqmx;
pub(crate) use daqmx_string_macro as daqmx_string;

impl DaqmxApi {
    /// Opens the first loadable library in `paths` and resolves all entry points.
    pub fn open(paths: &[PathBuf]) -> Result<Self> {
        let mut last_err = DaqmxError::Load {
            path: String::new(),
            message: "no library path to try".to_string(),
        };
        for path in paths {
            match unsafe { Library::new(path) } {
                Ok(lib) => return unsafe { Self::from_library(lib) },
                Err(e) => {
                    last_err = DaqmxError::Load {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    }
                }
            }
        }
        Err(last_err)
    }

    /// Driver description of a status code.
    pub fn error_string(&self, code: CInt32) -> String {
        let mut buf = vec![0u8; ERROR_BUF_SIZE];
        unsafe {
            (self.GetErrorString)(code, buf.as_mut_ptr() as CCharBuf, ERROR_BUF_SIZE as CUint32);
        }
        c_buf_to_string(&buf)
    }

    /// Extended description of the last error raised in the calling thread.
    pub fn extended_error_info(&self) -> String {
        let mut buf = vec![0u8; ERROR_BUF_SIZE];
        unsafe {
            (self.GetExtendedErrorInfo)(buf.as_mut_ptr() as CCharBuf, ERROR_BUF_SIZE as CUint32);
        }
        c_buf_to_string(&buf)
    }
}

const ERROR_BUF_SIZE: usize = 2048;

/// Library locations to try: `NIDAQMX_LIBRARY` if set, else the platform defaults.
pub fn library_paths() -> Vec<PathBuf> {
    match std::env::var_os(LIBRARY_ENV) {
        Some(path) if !path.is_empty() => vec![PathBuf::from(path)],
        _ => DEFAULT_LIBRARIES.iter().map(PathBuf::from).collect(),
    }
}

/// Destination of the driver error log, `None` when disabled.
pub fn error_log_path() -> Option<PathBuf> {
    match std::env::var_os(ERROR_LOG_ENV) {
        Some(path) if path.is_empty() => None,
        Some(path) => Some(PathBuf::from(path)),
        None => Some(PathBuf::from(DEFAULT_ERROR_LOG)),
    }
}

static API: OnceLock<DaqmxApi> = OnceLock::new();

/// The process-wide function table, loading the library on first use. A failed load is not
/// cached, so it is retried on the next call.
pub fn api() -> Result<&'static DaqmxApi> {
    if let Some(api) = API.get() {
        return Ok(api);
    }
    let loaded = DaqmxApi::open(&library_paths())?;
    Ok(API.get_or_init(|| loaded))
}

/// Calls a DAQmx C-function and handles its status code.
///
/// Every DAQmx C-function returns an `int32` status: zero on success, positive for warnings and
/// negative for errors. All [`NiTask`](crate::task::NiTask) and [`Device`](crate::device::Device)
/// operations go through this function, usually via the `daqmx!` macro.
///
/// # Parameters
///
/// * `func_name`: Name of the C-function, used in log lines and errors.
/// * `func`: A closure receiving the loaded function table and returning the status of the call.
///
/// # Behavior
///
/// The library is loaded on the first call. A warning is logged with `warn!` and returned as
/// `Ok(code)`. An error is logged with `error!`, appended to the error log file (see
/// [`error_log_path`]) and returned with the driver's extended error information.
///
/// # Examples
///
/// ```ignore
/// daqmx_call("DAQmxStartTask", |api| unsafe { (api.StartTask)(handle) })?;
/// // Same call through the macro
/// daqmx!(StartTask(handle))?;
/// ```
///
/// # Errors
///
/// * [`DaqmxError::Load`] or [`DaqmxError::MissingSymbol`] if the library cannot be loaded.
/// * [`DaqmxError::Driver`] if the call returns a negative status.
pub fn daqmx_call<F: FnOnce(&DaqmxApi) -> CInt32>(func_name: &str, func: F) -> Result<CInt32> {
    let api = api()?;
    let code = func(api);
    check_status(api, func_name, code)
}

/// Applies the DAQmx return-code convention to `code`, returned by `func_name`.
pub fn check_status(api: &DaqmxApi, func_name: &str, code: CInt32) -> Result<CInt32> {
    let status = classify_status(
        func_name,
        code,
        |code| api.error_string(code),
        || api.extended_error_info(),
    );
    if let Err(err) = &status {
        log_driver_error(err, error_log_path().as_deref());
    }
    status
}

/// Zero and positive (warning) codes are `Ok`, warnings are logged with the driver's
/// `error_string`. Negative codes become [`DaqmxError::Driver`] carrying the
/// `extended_info` of the failed call, or the `error_string` of the code when it is empty.
pub fn classify_status(
    func_name: &str,
    code: CInt32,
    error_string: impl Fn(CInt32) -> String,
    extended_info: impl FnOnce() -> String,
) -> Result<CInt32> {
    if code == 0 {
        return Ok(code);
    }
    if code > 0 {
        warn!(
            "{} warning {}={}: {}",
            func_name,
            status_code_name(code).unwrap_or("Unknown"),
            code,
            error_string(code)
        );
        return Ok(code);
    }
    let mut message = extended_info();
    if message.is_empty() {
        message = error_string(code);
    }
    Err(DaqmxError::Driver {
        func: func_name.to_string(),
        code,
        message,
    })
}

/// Logs a driver error and appends it to the error log file at `path`, if any.
pub fn log_driver_error(err: &DaqmxError, path: Option<&Path>) {
    error!("DAQmx Error: {}", err);
    let Some(path) = path else {
        return;
    };
    let written = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .and_then(|mut file| writeln!(file, "DAQmx Error: {}", err));
    if let Err(e) = written {
        warn!("Failed to write DAQmx error to {}: {}", path.display(), e);
    }
}

/// Calls a DAQmx C-function that fills a string buffer.
///
/// The function is called once with an empty buffer to learn the required size, then again with
/// a buffer of that size.
pub fn daqmx_string<F>(func_name: &str, func: F) -> Result<String>
where
    F: Fn(&DaqmxApi, CCharBuf, CUint32) -> CInt32,
{
    let api = api()?;
    fill_string(
        |buf, size| func(api, buf, size),
        |code| check_status(api, func_name, code),
    )
}

// `call(NULL, 0)` returns the buffer size the string needs
fn fill_string(
    call: impl Fn(CCharBuf, CUint32) -> CInt32,
    check: impl Fn(CInt32) -> Result<CInt32>,
) -> Result<String> {
    let needed = call(std::ptr::null_mut(), 0);
    if needed < 0 {
        check(needed)?;
    }
    let size = (needed.max(0) as usize).max(1);
    let mut buf = vec![0u8; size];
    check(call(buf.as_mut_ptr() as CCharBuf, size as CUint32))?;
    Ok(c_buf_to_string(&buf))
}

/// Reads a NUL-terminated string out of a driver-filled buffer.
pub fn c_buf_to_string(buf: &[u8]) -> String {
    match CStr::from_bytes_until_nul(buf) {
        Ok(s) => s.to_string_lossy().into_owned(),
        Err(_) => String::from_utf8_lossy(buf).into_owned(),
    }
}

/// Splits a driver name list (`"Dev1/ai0, Dev1/ai1"`) into trimmed, non-empty names.
pub fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .collect()
}

pub fn cstring(s: &str) -> Result<CString> {
    Ok(CString::new(s)?)
}

/// `n` as a C `int32` count. Fails instead of wrapping when `n` does not fit.
pub fn c_int32(label: &'static str, n: usize) -> Result<CInt32> {
    CInt32::try_from(n).map_err(|_| too_large(label, CInt32::MAX as u64, n))
}

/// `n` as a C `uInt32` buffer size. Fails instead of wrapping when `n` does not fit.
pub fn c_uint32(label: &'static str, n: usize) -> Result<CUint32> {
    CUint32::try_from(n).map_err(|_| too_large(label, CUint32::MAX as u64, n))
}

fn too_large(label: &'static str, max: u64, n: usize) -> DaqmxError {
    DaqmxError::InvalidOption {
        label,
        expected: format!("at most {}", max),
        got: n.to_string(),
    }
}

/// Version of the installed NI-DAQmx driver as `"major.minor"`.
pub fn get_version() -> Result<String> {
    let (mut major, mut minor): (CUint32, CUint32) = (0, 0);
    daqmx!(GetSysNIDAQMajorVersion(&mut major))?;
    daqmx!(GetSysNIDAQMinorVersion(&mut minor))?;
    Ok(format!("{}.{}", major, minor))
}

/// Names of all devices installed in the system.
pub fn get_system_devices() -> Result<Vec<String>> {
    Ok(split_names(&daqmx_string!(GetSysDevNames())?))
}

/// Names of all tasks saved on the system.
pub fn get_system_tasks() -> Result<Vec<String>> {
    Ok(split_names(&daqmx_string!(GetSysTasks())?))
}

/// Names of all global channels saved on the system.
pub fn get_system_global_channels() -> Result<Vec<String>> {
    Ok(split_names(&daqmx_string!(GetSysGlobalChans())?))
}

/// Resets a device, aborting its tasks and returning it to its initialized state.
///
/// # Parameters
///
/// * `name`: Device name as listed by [`get_system_devices`], e.g. `"PXI1Slot3"`.
///
/// # Example
/// ```ignore
/// # use nidaqmx_backend::nidaqmx::*;
/// reset_device("PXI1Slot3")?;
/// ```
pub fn reset_device(name: &str) -> Result<()> {
    let name_cstr = cstring(name)?;
    daqmx!(ResetDevice(name_cstr.as_ptr()))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_are_split_and_trimmed() {
        assert_eq!(
            split_names("Dev1/ai0, Dev1/ai1,,Dev2/ao0 "),
            vec!["Dev1/ai0", "Dev1/ai1", "Dev2/ao0"]
        );
        assert!(split_names("").is_empty());
        assert!(split_names(" , ").is_empty());
    }

    #[test]
    fn c_buffers() {
        assert_eq!(c_buf_to_string(b"PCIe-6259\0\0\0"), "PCIe-6259");
        assert_eq!(c_buf_to_string(b"\0garbage"), "");
        assert_eq!(c_buf_to_string(b"unterminated"), "unterminated");
    }

    #[test]
    fn missing_library_is_a_load_error() {
        let paths = vec![PathBuf::from("/nonexistent/libnidaqmx-missing.so")];
        match DaqmxApi::open(&paths) {
            Err(DaqmxError::Load { path, .. }) => {
                assert_eq!(path, "/nonexistent/libnidaqmx-missing.so")
            }
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("loaded a library that does not exist"),
        }
        assert!(matches!(DaqmxApi::open(&[]), Err(DaqmxError::Load { .. })));
    }

    fn no_text(_: CInt32) -> String {
        String::new()
    }

    #[test]
    fn success_and_warnings_are_ok() {
        assert_eq!(classify_status("DAQmxStartTask", 0, no_text, String::new).unwrap(), 0);
        let warning = classify_status(
            "DAQmxReadAnalogF64",
            200010,
            |_| "Finite acquisition or generation has been stopped before the requested \
                 number of samples were acquired or generated."
                .to_string(),
            || panic!("warnings do not fetch extended error info"),
        );
        assert_eq!(warning.unwrap(), 200010);
    }

    #[test]
    fn errors_carry_the_driver_text() {
        let err = classify_status(
            "DAQmxStartTask",
            -200088,
            |_| "Task specified is invalid or does not exist.".to_string(),
            || "Task specified is invalid or does not exist.\nStatus Code: -200088".to_string(),
        )
        .unwrap_err();
        match err {
            DaqmxError::Driver {
                func,
                code,
                message,
            } => {
                assert_eq!(func, "DAQmxStartTask");
                assert_eq!(code, -200088);
                assert!(message.ends_with("Status Code: -200088"));
            }
            e => panic!("unexpected error {}", e),
        }

        // No extended info: the code's description is used
        let err = classify_status("DAQmxStopTask", -200088, |_| "invalid task".to_string(), String::new)
            .unwrap_err();
        assert!(err.to_string().ends_with(": invalid task"));
    }

    #[test]
    fn errors_are_appended_to_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nidaqmx_error.logs");
        let err = classify_status("DAQmxClearTask", -200088, no_text, || "gone".to_string())
            .unwrap_err();
        log_driver_error(&err, Some(path.as_path()));
        log_driver_error(&err, Some(path.as_path()));
        let logged = std::fs::read_to_string(&path).unwrap();
        assert_eq!(logged.lines().count(), 2);
        assert!(logged.starts_with("DAQmx Error: DAQmxClearTask failed with error "));
        assert!(logged.lines().all(|l| l.ends_with(": gone")));

        // Disabled log: nothing to write
        log_driver_error(&err, None);
    }

    #[test]
    fn error_log_location() {
        std::env::set_var(ERROR_LOG_ENV, "/tmp/daq_errors.log");
        assert_eq!(error_log_path(), Some(PathBuf::from("/tmp/daq_errors.log")));
        std::env::set_var(ERROR_LOG_ENV, "");
        assert_eq!(error_log_path(), None);
        std::env::remove_var(ERROR_LOG_ENV);
        assert_eq!(error_log_path(), Some(PathBuf::from(DEFAULT_ERROR_LOG)));
    }

    // Fake driver function filling `text` the way DAQmxGetSysDevNames does
    fn fill_with(text: &'static str) -> impl Fn(CCharBuf, CUint32) -> CInt32 {
        move |buf, size| {
            let needed = text.len() + 1;
            if size == 0 {
                return needed as CInt32;
            }
            let n = text.len().min(size as usize - 1);
            unsafe {
                std::ptr::copy_nonoverlapping(text.as_ptr(), buf as *mut u8, n);
                *buf.add(n) = 0;
            }
            0
        }
    }

    #[test]
    fn string_buffers_are_sized_by_the_driver() {
        let ok = |code: CInt32| classify_status("DAQmxGetSysDevNames", code, no_text, String::new);
        assert_eq!(fill_string(fill_with("Dev1, PXI1Slot3"), ok).unwrap(), "Dev1, PXI1Slot3");
        assert_eq!(fill_string(fill_with(""), ok).unwrap(), "");

        let calls = std::cell::Cell::new(0);
        let failing = |_: CCharBuf, _: CUint32| {
            calls.set(calls.get() + 1);
            -200220
        };
        let err = fill_string(failing, |code| {
            classify_status("DAQmxGetDevProductType", code, no_text, || "no device".to_string())
        })
        .unwrap_err();
        assert_eq!(err.code(), Some(-200220));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn counts_do_not_wrap() {
        assert_eq!(c_int32("samples per channel", 1000).unwrap(), 1000);
        assert_eq!(c_int32("samples per channel", i32::MAX as usize).unwrap(), i32::MAX);
        // 2^31 samples would reach the driver as a negative count
        let err = c_int32("samples per channel", 1 << 31).unwrap_err();
        assert!(matches!(err, DaqmxError::InvalidOption { label: "samples per channel", .. }));
        assert!(err.to_string().contains("at most 2147483647"));

        assert_eq!(c_uint32("read buffer size", u32::MAX as usize).unwrap(), u32::MAX);
        assert!(c_uint32("read buffer size", u32::MAX as usize + 1).is_err());
    }

    #[test]
    fn interior_nul_is_rejected() {
        assert!(matches!(cstring("Dev1\0ai0"), Err(DaqmxError::Nul(_))));
        assert_eq!(cstring("Dev1/ai0").unwrap().as_bytes(), b"Dev1/ai0");
    }
}
