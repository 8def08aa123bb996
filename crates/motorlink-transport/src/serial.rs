use serialport::{DataBits, FlowControl, Parity, SerialPortType, StopBits};
use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::{Result, TransportError};
use crate::traits::SerialStream;

/// Open and configure a serial port.
///
/// The line is always 8-N-1 without flow control; baud rate and read
/// timeout come from `config`. Bytes the driver buffered before the open
/// are discarded.
pub fn open(port: &str, config: &SerialConfig) -> Result<SerialStream> {
    let handle = serialport::new(port, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(config.read_timeout)
        .open()
        .map_err(|source| TransportError::Open {
            port: port.to_string(),
            source,
        })?;

    let stream = SerialStream::from_port(handle, port);
    if let Err(err) = stream.clear_input() {
        debug!(port, %err, "could not clear stale input");
    }

    info!(port, baud = config.baud_rate, "serial port open");
    Ok(stream)
}

/// Kind of hardware behind a serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Usb,
    Bluetooth,
    Pci,
    Unknown,
}

impl PortKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PortKind::Usb => "usb",
            PortKind::Bluetooth => "bluetooth",
            PortKind::Pci => "pci",
            PortKind::Unknown => "unknown",
        }
    }
}

/// A serial port discovered on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// System location, e.g. `/dev/ttyUSB0` or `COM3`.
    pub name: String,
    pub kind: PortKind,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// List the serial ports currently present, sorted by name.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .map_err(TransportError::Enumerate)?
        .into_iter()
        .map(port_info)
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(count = ports.len(), "enumerated serial ports");
    Ok(ports)
}

fn port_info(port: serialport::SerialPortInfo) -> PortInfo {
    let mut info = PortInfo {
        name: port.port_name,
        kind: PortKind::Unknown,
        vid: None,
        pid: None,
        serial_number: None,
        manufacturer: None,
        product: None,
    };

    match port.port_type {
        SerialPortType::UsbPort(usb) => {
            info.kind = PortKind::Usb;
            info.vid = Some(usb.vid);
            info.pid = Some(usb.pid);
            info.serial_number = usb.serial_number;
            info.manufacturer = usb.manufacturer;
            info.product = usb.product;
        }
        SerialPortType::BluetoothPort => info.kind = PortKind::Bluetooth,
        SerialPortType::PciPort => info.kind = PortKind::Pci,
        SerialPortType::Unknown => {}
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_port_reports_name() {
        let err = open("/dev/motorlink-does-not-exist", &SerialConfig::default()).unwrap_err();
        match err {
            TransportError::Open { port, .. } => {
                assert_eq!(port, "/dev/motorlink-does-not-exist")
            }
            other => panic!("expected open error, got {other:?}"),
        }
    }

    #[test]
    fn bluetooth_port_has_no_usb_ids() {
        let info = port_info(serialport::SerialPortInfo {
            port_name: "/dev/rfcomm0".to_string(),
            port_type: SerialPortType::BluetoothPort,
        });
        assert_eq!(info.kind, PortKind::Bluetooth);
        assert_eq!(info.vid, None);
        assert_eq!(info.kind.as_str(), "bluetooth");
    }
}
