use ndarray::{arr2, Array2};
use nidaqmx_common::*;

#[test]
fn options_roundtrip_driver_values() {
    // Every value the driver can report back maps to the name python callers pass in
    for name in SampleMode::NAMES {
        let mode: SampleMode = name.parse().unwrap();
        assert_eq!(SampleMode::from_val(mode.val()).unwrap(), mode);
    }
    for name in ChannelType::NAMES {
        let t: ChannelType = name.parse().unwrap();
        assert_eq!(t.to_string(), *name);
    }
}

#[test]
fn analog_write_then_read_shapes() {
    // Two-channel AO write with interleaved samples
    let data = arr2(&[[0.0, 1.0], [0.5, -0.5], [1.0, 0.0]]).into_dyn();
    let (buf, samples) = write_buffer(data.view(), 2, FillMode::GroupByScanNumber).unwrap();
    assert_eq!(samples, 3);
    assert_eq!(buf.shape(), &[3, 2]);

    // Matching AI read buffer: the driver filled only two of three samples
    let (rows, cols) = read_shape(3, 2, FillMode::GroupByScanNumber);
    let read: Array2<f64> = Array2::zeros((rows, cols));
    let read = truncate_read(read, 2, FillMode::GroupByScanNumber);
    assert_eq!(read.shape(), &[2, 2]);
}

#[test]
fn mismatched_write_is_a_shape_error() {
    let data = arr2(&[[0.0, 1.0], [0.5, -0.5]]).into_dyn();
    match write_buffer(data.view(), 3, FillMode::GroupByScanNumber) {
        Err(DaqmxError::Shape {
            shape, channels, ..
        }) => {
            assert_eq!(shape, vec![2, 2]);
            assert_eq!(channels, 3);
        }
        other => panic!("expected a shape error, got {:?}", other.map(|(_, n)| n)),
    }
}

#[test]
fn device_report() {
    let mut system = SystemInfo {
        version: "23.5".to_string(),
        ..Default::default()
    };
    system.devices.insert(
        "PXI1Slot3".to_string(),
        DeviceInfo {
            product_type: "PXIe-6739".to_string(),
            bus: "PXI (chassis=1, slot=3)".to_string(),
            ao_channels: (0..64).map(|i| format!("PXI1Slot3/ao{}", i)).collect(),
            ..Default::default()
        },
    );
    let text = system.to_string();
    assert!(text.contains("System devices: PXI1Slot3"));
    assert!(text.contains("Analog output channels: PXI1Slot3/ao0:63"));
    assert!(text.contains("Analog input channels: None"));
}

#[test]
fn errors_become_python_exception_kinds() {
    use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
    use pyo3::PyErr;

    pyo3::prepare_freethreaded_python();
    pyo3::Python::with_gil(|py| {
        let err: PyErr = "sideways".parse::<Edge>().unwrap_err().into();
        assert!(err.is_instance_of::<PyValueError>(py));

        let err: PyErr = DaqmxError::PauseTriggerUnset.into();
        assert!(err.is_instance_of::<PyTypeError>(py));

        let err: PyErr = DaqmxError::Driver {
            func: "DAQmxStartTask".to_string(),
            code: -200088,
            message: "Task specified is invalid or does not exist.".to_string(),
        }
        .into();
        assert!(err.is_instance_of::<PyRuntimeError>(py));
    });
}
