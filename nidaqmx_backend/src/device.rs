//! Device properties.
//!
//! A [`Device`] is only a name: every getter queries the driver. Physical channel getters
//! return the driver's comma-separated lists split into names.

use pyo3::prelude::*;
use std::fmt;

use nidaqmx_common::*;

use crate::nidaqmx::*;

#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    name: String,
}

/// Expands to a getter of a string-list device property.
macro_rules! channel_list {
    ($(#[$meta:meta])* $fn_name:ident, $daqmx_fn:ident) => {
        $(#[$meta])*
        pub fn $fn_name(&self) -> Result<Vec<String>> {
            let name = cstring(&self.name)?;
            Ok(split_names(&daqmx_string!($daqmx_fn(name.as_ptr()))?))
        }
    };
}

macro_rules! device_u32 {
    ($fn_name:ident, $daqmx_fn:ident) => {
        pub fn $fn_name(&self) -> Result<u32> {
            let name = cstring(&self.name)?;
            let mut val: CUint32 = 0;
            daqmx!($daqmx_fn(name.as_ptr(), &mut val))?;
            Ok(val)
        }
    };
}

/// Human-readable bus location: PCI buses show bus and device number, PXI buses chassis and
/// slot number, other buses only their type.
pub fn format_bus(bus_type: BusType, location: Option<(u32, u32)>) -> String {
    match (bus_type, location) {
        (BusType::Pci | BusType::PciE, Some((bus, device))) => {
            format!("{} (bus={}, device={})", bus_type, bus, device)
        }
        (BusType::Pxi | BusType::PxiE, Some((chassis, slot))) => {
            format!("{} (chassis={}, slot={})", bus_type, chassis, slot)
        }
        _ => bus_type.to_string(),
    }
}

impl Device {
    pub fn new(name: &str) -> Self {
        Device {
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_product_type(&self) -> Result<String> {
        let name = cstring(&self.name)?;
        daqmx_string!(GetDevProductType(name.as_ptr()))
    }

    device_u32!(get_product_number, GetDevProductNum);
    device_u32!(get_serial_number, GetDevSerialNum);
    device_u32!(get_pci_bus_number, GetDevPCIBusNum);
    device_u32!(get_pci_device_number, GetDevPCIDevNum);
    device_u32!(get_pxi_slot_number, GetDevPXISlotNum);
    device_u32!(get_pxi_chassis_number, GetDevPXIChassisNum);

    channel_list!(get_analog_input_channels, GetDevAIPhysicalChans);
    channel_list!(get_analog_output_channels, GetDevAOPhysicalChans);
    channel_list!(
        /// Digital input lines, e.g. `Dev1/port0/line0`.
        get_digital_input_lines,
        GetDevDILines
    );
    channel_list!(get_digital_input_ports, GetDevDIPorts);
    channel_list!(get_digital_output_lines, GetDevDOLines);
    channel_list!(get_digital_output_ports, GetDevDOPorts);
    channel_list!(get_counter_input_channels, GetDevCIPhysicalChans);
    channel_list!(get_counter_output_channels, GetDevCOPhysicalChans);

    pub fn get_bus_type(&self) -> Result<BusType> {
        let name = cstring(&self.name)?;
        let mut val: CInt32 = 0;
        daqmx!(GetDevBusType(name.as_ptr(), &mut val))?;
        BusType::from_val(val)
    }

    pub fn get_bus(&self) -> Result<String> {
        let bus_type = self.get_bus_type()?;
        let location = match bus_type {
            BusType::Pci | BusType::PciE => {
                Some((self.get_pci_bus_number()?, self.get_pci_device_number()?))
            }
            BusType::Pxi | BusType::PxiE => {
                Some((self.get_pxi_chassis_number()?, self.get_pxi_slot_number()?))
            }
            _ => None,
        };
        Ok(format_bus(bus_type, location))
    }

    /// Resets the device, aborting all of its tasks.
    pub fn reset(&self) -> Result<()> {
        reset_device(&self.name)
    }

    pub fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo {
            product_type: self.get_product_type()?,
            product_number: self.get_product_number()?,
            serial_number: self.get_serial_number()?,
            bus: self.get_bus()?,
            ai_channels: self.get_analog_input_channels()?,
            ao_channels: self.get_analog_output_channels()?,
            di_lines: self.get_digital_input_lines()?,
            di_ports: self.get_digital_input_ports()?,
            do_lines: self.get_digital_output_lines()?,
            do_ports: self.get_digital_output_ports()?,
            ci_channels: self.get_counter_input_channels()?,
            co_channels: self.get_counter_output_channels()?,
        })
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[pymethods]
impl Device {
    #[new]
    fn py_new(name: &str) -> Self {
        Device::new(name)
    }

    fn __str__(&self) -> String {
        self.name.clone()
    }

    fn __repr__(&self) -> String {
        format!("Device({:?})", self.name)
    }

    #[getter(name)]
    fn py_name(&self) -> String {
        self.name.clone()
    }

    #[pyo3(name = "get_product_type")]
    fn py_get_product_type(&self, py: Python<'_>) -> PyResult<String> {
        Ok(py.allow_threads(|| self.get_product_type())?)
    }

    #[pyo3(name = "get_product_number")]
    fn py_get_product_number(&self, py: Python<'_>) -> PyResult<u32> {
        Ok(py.allow_threads(|| self.get_product_number())?)
    }

    #[pyo3(name = "get_serial_number")]
    fn py_get_serial_number(&self, py: Python<'_>) -> PyResult<u32> {
        Ok(py.allow_threads(|| self.get_serial_number())?)
    }

    #[pyo3(name = "get_analog_input_channels")]
    fn py_get_analog_input_channels(&self, py: Python<'_>) -> PyResult<Vec<String>> {
        Ok(py.allow_threads(|| self.get_analog_input_channels())?)
    }

    #[pyo3(name = "get_analog_output_channels")]
    fn py_get_analog_output_channels(&self, py: Python<'_>) -> PyResult<Vec<String>> {
        Ok(py.allow_threads(|| self.get_analog_output_channels())?)
    }

    #[pyo3(name = "get_digital_input_lines")]
    fn py_get_digital_input_lines(&self, py: Python<'_>) -> PyResult<Vec<String>> {
        Ok(py.allow_threads(|| self.get_digital_input_lines())?)
    }

    #[pyo3(name = "get_digital_input_ports")]
    fn py_get_digital_input_ports(&self, py: Python<'_>) -> PyResult<Vec<String>> {
        Ok(py.allow_threads(|| self.get_digital_input_ports())?)
    }

    #[pyo3(name = "get_digital_output_lines")]
    fn py_get_digital_output_lines(&self, py: Python<'_>) -> PyResult<Vec<String>> {
        Ok(py.allow_threads(|| self.get_digital_output_lines())?)
    }

    #[pyo3(name = "get_digital_output_ports")]
    fn py_get_digital_output_ports(&self, py: Python<'_>) -> PyResult<Vec<String>> {
        Ok(py.allow_threads(|| self.get_digital_output_ports())?)
    }

    #[pyo3(name = "get_counter_input_channels")]
    fn py_get_counter_input_channels(&self, py: Python<'_>) -> PyResult<Vec<String>> {
        Ok(py.allow_threads(|| self.get_counter_input_channels())?)
    }

    #[pyo3(name = "get_counter_output_channels")]
    fn py_get_counter_output_channels(&self, py: Python<'_>) -> PyResult<Vec<String>> {
        Ok(py.allow_threads(|| self.get_counter_output_channels())?)
    }

    #[pyo3(name = "get_bus_type")]
    fn py_get_bus_type(&self, py: Python<'_>) -> PyResult<&'static str> {
        Ok(py.allow_threads(|| self.get_bus_type())?.name())
    }

    #[pyo3(name = "get_pci_bus_number")]
    fn py_get_pci_bus_number(&self, py: Python<'_>) -> PyResult<u32> {
        Ok(py.allow_threads(|| self.get_pci_bus_number())?)
    }

    #[pyo3(name = "get_pci_device_number")]
    fn py_get_pci_device_number(&self, py: Python<'_>) -> PyResult<u32> {
        Ok(py.allow_threads(|| self.get_pci_device_number())?)
    }

    #[pyo3(name = "get_pxi_slot_number")]
    fn py_get_pxi_slot_number(&self, py: Python<'_>) -> PyResult<u32> {
        Ok(py.allow_threads(|| self.get_pxi_slot_number())?)
    }

    #[pyo3(name = "get_pxi_chassis_number")]
    fn py_get_pxi_chassis_number(&self, py: Python<'_>) -> PyResult<u32> {
        Ok(py.allow_threads(|| self.get_pxi_chassis_number())?)
    }

    #[pyo3(name = "get_bus")]
    fn py_get_bus(&self, py: Python<'_>) -> PyResult<String> {
        Ok(py.allow_threads(|| self.get_bus())?)
    }

    #[pyo3(name = "reset")]
    fn py_reset(&self, py: Python<'_>) -> PyResult<bool> {
        py.allow_threads(|| self.reset())?;
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bus_descriptions() {
        assert_eq!(format_bus(BusType::PciE, Some((3, 0))), "PCIe (bus=3, device=0)");
        assert_eq!(format_bus(BusType::Pxi, Some((1, 4))), "PXI (chassis=1, slot=4)");
        assert_eq!(format_bus(BusType::Usb, None), "USB");
        assert_eq!(format_bus(BusType::CompactDaq, Some((1, 1))), "CompactDAQ");
    }

    #[test]
    fn device_is_its_name() {
        let dev = Device::new("PXI1Slot3");
        assert_eq!(dev.to_string(), "PXI1Slot3");
        assert_eq!(dev.name(), "PXI1Slot3");
        assert_eq!(dev, Device::new("PXI1Slot3"));
    }
}
