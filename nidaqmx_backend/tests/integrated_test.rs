use nidaqmx_backend::device::format_bus;
use nidaqmx_backend::nidaqmx::*;
use nidaqmx_backend::*;
use nidaqmx_common::*;

// Every test points the loader at the same missing file, so none of them touch a real driver.
fn without_driver() {
    std::env::set_var("NIDAQMX_LIBRARY", "/nonexistent/libnidaqmx.so");
    std::env::set_var("NIDAQMX_ERROR_LOG", "");
}

#[test]
fn system_queries_fail_to_load() {
    without_driver();
    assert!(matches!(get_version(), Err(DaqmxError::Load { .. })));
    assert!(matches!(get_system_devices(), Err(DaqmxError::Load { .. })));
    assert!(matches!(system_info(), Err(DaqmxError::Load { .. })));
    // Not cached: the next call tries again
    assert!(matches!(get_version(), Err(DaqmxError::Load { .. })));
}

#[test]
fn tasks_need_the_driver() {
    without_driver();
    assert!(matches!(AnalogInputTask::new(None), Err(DaqmxError::Load { .. })));
    assert!(matches!(CounterOutputTask::new(Some("pulses")), Err(DaqmxError::Load { .. })));
    assert!(matches!(NiTask::new(None, ChannelType::DO), Err(DaqmxError::Load { .. })));
}

#[test]
fn devices_are_lazy() {
    without_driver();
    // Creating a device never calls the driver, its getters do
    let dev = Device::new("Dev1");
    assert_eq!(dev.to_string(), "Dev1");
    assert!(matches!(dev.get_serial_number(), Err(DaqmxError::Load { .. })));
    assert!(matches!(dev.get_analog_input_channels(), Err(DaqmxError::Load { .. })));
}

#[test]
fn load_errors_reach_python() {
    without_driver();
    pyo3::prepare_freethreaded_python();
    pyo3::Python::with_gil(|py| {
        let err: pyo3::PyErr = get_version().unwrap_err().into();
        assert!(err.to_string().contains("libnidaqmx"));
        assert!(err.is_instance_of::<pyo3::exceptions::PyRuntimeError>(py));
    });
}

#[test]
fn device_report_lines() {
    let bus = format_bus(BusType::PciE, Some((5, 0)));
    let channels = ["PXI1Slot3/ao0", "PXI1Slot3/ao1", "PXI1Slot3/ao2"];
    assert_eq!(make_pattern(&channels).unwrap(), "PXI1Slot3/ao0:2");
    assert_eq!(bus, "PCIe (bus=5, device=0)");
}
