//! Driver event callbacks.
//!
//! The driver calls back through plain C function pointers from its own threads. Each
//! registration boxes the user callback together with the task name into a [`Slot`] and hands
//! the driver a pointer to it; the `extern "C"` trampolines below turn that pointer back into the
//! closure and call it.
//!
//! Slots live in the task's [`EventRegistry`] for as long as the driver may call them. Replacing
//! a callback unregisters the old one first, and the task clears its handle before the registry
//! is dropped. Panics are caught in the trampolines and reported to the driver as `-1`.

use log::error;
use parking_lot::Mutex;
use pyo3::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};

use nidaqmx_common::*;

use crate::nidaqmx::*;
use crate::task::NiTask;

/// `func(task_name, event_type, samples)`
pub type EveryNSamplesFn = Box<dyn FnMut(&str, i32, u32) -> i32 + Send>;
/// `func(task_name, status)`
pub type DoneFn = Box<dyn FnMut(&str, i32) -> i32 + Send>;
/// `func(task_name, signal_id)`
pub type SignalFn = Box<dyn FnMut(&str, i32) -> i32 + Send>;

pub struct Slot<F> {
    task_name: String,
    func: Mutex<F>,
}

impl<F> Slot<F> {
    pub fn new(task_name: &str, func: F) -> Box<Self> {
        Box::new(Slot {
            task_name: task_name.to_string(),
            func: Mutex::new(func),
        })
    }

    fn as_callback_data(&self) -> *mut libc::c_void {
        self as *const Self as *mut libc::c_void
    }
}

/// Callbacks currently registered with the driver, with the arguments needed to unregister them.
#[derive(Default)]
pub struct EventRegistry {
    every_n_samples: Option<(CInt32, CUint32, Box<Slot<EveryNSamplesFn>>)>,
    done: Option<Box<Slot<DoneFn>>>,
    signal: Option<(Signal, Box<Slot<SignalFn>>)>,
}

impl EventRegistry {
    pub fn has_every_n_samples(&self) -> bool {
        self.every_n_samples.is_some()
    }

    pub fn has_done(&self) -> bool {
        self.done.is_some()
    }

    pub fn has_signal(&self) -> bool {
        self.signal.is_some()
    }
}

fn guarded<R>(kind: &str, default: R, f: impl FnOnce() -> R) -> R {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        error!("{} callback panicked", kind);
        default
    })
}

pub unsafe extern "C" fn every_n_samples_trampoline(
    _handle: TaskHandle,
    event_type: CInt32,
    n_samples: CUint32,
    callback_data: *mut libc::c_void,
) -> CInt32 {
    let slot = &*(callback_data as *const Slot<EveryNSamplesFn>);
    guarded("every N samples", -1, || {
        let mut func = slot.func.lock();
        (*func)(&slot.task_name, event_type, n_samples)
    })
}

pub unsafe extern "C" fn done_trampoline(
    _handle: TaskHandle,
    status: CInt32,
    callback_data: *mut libc::c_void,
) -> CInt32 {
    let slot = &*(callback_data as *const Slot<DoneFn>);
    guarded("done", -1, || {
        let mut func = slot.func.lock();
        (*func)(&slot.task_name, status)
    })
}

pub unsafe extern "C" fn signal_trampoline(
    _handle: TaskHandle,
    signal_id: CInt32,
    callback_data: *mut libc::c_void,
) -> CInt32 {
    let slot = &*(callback_data as *const Slot<SignalFn>);
    guarded("signal", -1, || {
        let mut func = slot.func.lock();
        (*func)(&slot.task_name, signal_id)
    })
}

impl NiTask {
    /// Calls `func` every time `samples` samples were acquired into (input tasks) or
    /// transferred from (output tasks) the buffer. `None` unregisters the current callback.
    ///
    /// # Parameters
    ///
    /// * `func`: Receives the task name, the event type and `samples`. Its return value is
    ///   passed back to the driver.
    /// * `samples`: Number of samples per channel between two calls.
    /// * `options`: Whether the driver calls `func` on its own thread or queues it.
    ///
    /// # Behavior
    ///
    /// A callback registered before is unregistered first, so at most one is active. `func`
    /// runs on a driver thread and must not block on anything the registering thread holds.
    /// A panic in `func` is caught and logged, and the driver gets `-1`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// task.register_every_n_samples_event(
    ///     Some(Box::new(|name, _event_type, n| {
    ///         println!("{}: {} more samples", name, n);
    ///         0
    ///     })),
    ///     1000,
    ///     EventOptions::Sync,
    /// )?;
    /// ```
    pub fn register_every_n_samples_event(
        &mut self,
        func: Option<EveryNSamplesFn>,
        samples: u32,
        options: EventOptions,
    ) -> Result<()> {
        if let Some((event_type, n, _)) = &self.events.every_n_samples {
            daqmx!(RegisterEveryNSamplesEvent(
                self.handle(),
                *event_type,
                *n,
                0,
                None,
                std::ptr::null_mut(),
            ))?;
            self.events.every_n_samples = None;
        }
        let Some(func) = func else {
            return Ok(());
        };
        let event_type = match self.channel_io_type() {
            IoType::Input => DAQMX_VAL_ACQUIRED_INTO_BUFFER,
            IoType::Output => DAQMX_VAL_TRANSFERRED_FROM_BUFFER,
        };
        let slot = Slot::new(self.name(), func);
        daqmx!(RegisterEveryNSamplesEvent(
            self.handle(),
            event_type,
            samples,
            options.val() as CUint32,
            Some(every_n_samples_trampoline),
            slot.as_callback_data(),
        ))?;
        self.events.every_n_samples = Some((event_type, samples, slot));
        Ok(())
    }

    /// Calls `func` with the task status when the task stops, either after completing or on
    /// error. `None` unregisters the current callback.
    pub fn register_done_event(&mut self, func: Option<DoneFn>, options: EventOptions) -> Result<()> {
        if self.events.done.is_some() {
            daqmx!(RegisterDoneEvent(self.handle(), 0, None, std::ptr::null_mut()))?;
            self.events.done = None;
        }
        let Some(func) = func else {
            return Ok(());
        };
        let slot = Slot::new(self.name(), func);
        daqmx!(RegisterDoneEvent(
            self.handle(),
            options.val() as CUint32,
            Some(done_trampoline),
            slot.as_callback_data(),
        ))?;
        self.events.done = Some(slot);
        Ok(())
    }

    /// Calls `func` every time `signal` occurs. `None` unregisters the current callback.
    pub fn register_signal_event(
        &mut self,
        func: Option<SignalFn>,
        signal: Signal,
        options: EventOptions,
    ) -> Result<()> {
        if let Some((registered, _)) = &self.events.signal {
            daqmx!(RegisterSignalEvent(
                self.handle(),
                registered.val(),
                0,
                None,
                std::ptr::null_mut(),
            ))?;
            self.events.signal = None;
        }
        let Some(func) = func else {
            return Ok(());
        };
        let slot = Slot::new(self.name(), func);
        daqmx!(RegisterSignalEvent(
            self.handle(),
            signal.val(),
            options.val() as CUint32,
            Some(signal_trampoline),
            slot.as_callback_data(),
        ))?;
        self.events.signal = Some((signal, slot));
        Ok(())
    }
}

// Python callbacks: run with the GIL held. An exception is printed and reported as -1, a
// non-integer return value counts as success.
fn call_py(func: &PyObject, args: impl IntoPy<Py<pyo3::types::PyTuple>>) -> i32 {
    Python::with_gil(|py| match func.call1(py, args) {
        Ok(ret) => ret.extract::<i32>(py).unwrap_or(0),
        Err(e) => {
            e.print(py);
            -1
        }
    })
}

fn cb_data_or_none(py: Python<'_>, cb_data: &Option<PyObject>) -> PyObject {
    match cb_data {
        Some(data) => data.clone_ref(py),
        None => py.None(),
    }
}

/// Wraps `func(task_name, event_type, samples, cb_data)`.
pub fn py_every_n_samples(func: PyObject, cb_data: Option<PyObject>) -> EveryNSamplesFn {
    Box::new(move |task_name, event_type, samples| {
        let data = Python::with_gil(|py| cb_data_or_none(py, &cb_data));
        call_py(&func, (task_name.to_string(), event_type, samples, data))
    })
}

/// Wraps `func(task_name, status, cb_data)`.
pub fn py_done(func: PyObject, cb_data: Option<PyObject>) -> DoneFn {
    Box::new(move |task_name, status| {
        let data = Python::with_gil(|py| cb_data_or_none(py, &cb_data));
        call_py(&func, (task_name.to_string(), status, data))
    })
}

/// Wraps `func(task_name, signal_id, cb_data)`.
pub fn py_signal(func: PyObject, cb_data: Option<PyObject>) -> SignalFn {
    Box::new(move |task_name, signal_id| {
        let data = Python::with_gil(|py| cb_data_or_none(py, &cb_data));
        call_py(&func, (task_name.to_string(), signal_id, data))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::task::without_gil;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn every_n_samples_reaches_closure() {
        let total = Arc::new(AtomicU32::new(0));
        let seen = total.clone();
        let func: EveryNSamplesFn = Box::new(move |name, event_type, samples| {
            assert_eq!(name, "acq");
            assert_eq!(event_type, DAQMX_VAL_ACQUIRED_INTO_BUFFER);
            seen.fetch_add(samples, Ordering::SeqCst);
            0
        });
        let slot = Slot::new("acq", func);
        for _ in 0..3 {
            let ret = unsafe {
                every_n_samples_trampoline(
                    std::ptr::null_mut(),
                    DAQMX_VAL_ACQUIRED_INTO_BUFFER,
                    100,
                    slot.as_callback_data(),
                )
            };
            assert_eq!(ret, 0);
        }
        assert_eq!(total.load(Ordering::SeqCst), 300);
    }

    #[test]
    fn closures_keep_state_between_calls() {
        let mut calls = 0;
        let func: DoneFn = Box::new(move |_, status| {
            calls += 1;
            if status < 0 {
                status
            } else {
                calls
            }
        });
        let slot = Slot::new("gen", func);
        let data = slot.as_callback_data();
        assert_eq!(unsafe { done_trampoline(std::ptr::null_mut(), 0, data) }, 1);
        assert_eq!(unsafe { done_trampoline(std::ptr::null_mut(), 0, data) }, 2);
        assert_eq!(unsafe { done_trampoline(std::ptr::null_mut(), -200279, data) }, -200279);
    }

    #[test]
    fn panics_do_not_cross_the_boundary() {
        let func: SignalFn = Box::new(|_, _| panic!("callback failure"));
        let slot = Slot::new("sig", func);
        let ret = unsafe {
            signal_trampoline(std::ptr::null_mut(), DAQMX_VAL_SAMPLECLOCK, slot.as_callback_data())
        };
        assert_eq!(ret, -1);
    }

    #[test]
    fn python_callbacks_run_while_the_caller_waits() {
        pyo3::prepare_freethreaded_python();
        let on_done: PyObject = Python::with_gil(|py| {
            PyModule::from_code(
                py,
                "def on_done(task, status, cb_data):\n    return 7\n",
                "waiting.py",
                "waiting",
            )
            .unwrap()
            .getattr("on_done")
            .unwrap()
            .into()
        });
        let slot = Slot::new("gen", py_done(on_done, None));
        let data = slot.as_callback_data() as usize;

        // A Python caller blocks in a driver call (e.g. StopTask) while a driver thread runs the
        // callback
        let ret = Python::with_gil(|_py| {
            without_gil(move || {
                std::thread::spawn(move || unsafe {
                    done_trampoline(std::ptr::null_mut(), 0, data as *mut libc::c_void)
                })
                .join()
                .unwrap()
            })
        });
        assert_eq!(ret, 7);
        // Without the GIL there is nothing to release
        assert_eq!(without_gil(|| 2), 2);
    }

    #[test]
    fn python_callbacks() {
        pyo3::prepare_freethreaded_python();
        let (on_samples, failing, module) = Python::with_gil(|py| {
            let module = PyModule::from_code(
                py,
                "calls = []\n\
                 def on_samples(task, event_type, samples, cb_data):\n    \
                     calls.append((task, event_type, samples, cb_data))\n    \
                     return 0\n\
                 def failing(task, status, cb_data):\n    \
                     raise RuntimeError('boom')\n",
                "callbacks.py",
                "callbacks",
            )
            .unwrap();
            let on_samples: PyObject = module.getattr("on_samples").unwrap().into();
            let failing: PyObject = module.getattr("failing").unwrap().into();
            let module: PyObject = module.into();
            (on_samples, failing, module)
        });

        let cb_data: Option<PyObject> = Python::with_gil(|py| Some("extra".into_py(py)));
        let slot = Slot::new("acq", py_every_n_samples(on_samples, cb_data));
        let ret = unsafe {
            every_n_samples_trampoline(
                std::ptr::null_mut(),
                DAQMX_VAL_ACQUIRED_INTO_BUFFER,
                10,
                slot.as_callback_data(),
            )
        };
        assert_eq!(ret, 0);
        Python::with_gil(|py| {
            let calls: Vec<(String, i32, u32, String)> =
                module.getattr(py, "calls").unwrap().extract(py).unwrap();
            assert_eq!(
                calls,
                vec![("acq".to_string(), DAQMX_VAL_ACQUIRED_INTO_BUFFER, 10, "extra".to_string())]
            );
        });

        let slot = Slot::new("gen", py_done(failing, None));
        let ret = unsafe { done_trampoline(std::ptr::null_mut(), 0, slot.as_callback_data()) };
        assert_eq!(ret, -1);
    }

    #[test]
    fn empty_registry() {
        let registry = EventRegistry::default();
        assert!(!registry.has_every_n_samples());
        assert!(!registry.has_done());
        assert!(!registry.has_signal());
    }
}
