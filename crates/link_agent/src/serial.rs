//! Transporte serial concreto via `serialport`.

use link_core::transport::{OpenOptions, PortHandle, SerialTransport, TransportError};
use link_core::types::PortDescriptor;
use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::io::{self, Write};

/// Portas seriais reais do sistema.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialPortTransport;

impl SerialTransport for SerialPortTransport {
    fn list_ports(&self) -> Result<Vec<PortDescriptor>, TransportError> {
        let ports = serialport::available_ports()
            .map_err(|e| TransportError::Enumerate(e.to_string()))?;
        Ok(ports.iter().map(describe).collect())
    }

    fn open(
        &self,
        address: &str,
        options: &OpenOptions,
    ) -> Result<Box<dyn PortHandle>, TransportError> {
        let port = serialport::new(address, options.baud_rate)
            .timeout(options.timeout)
            .open()
            .map_err(|e| TransportError::Open {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Box::new(SerialHandle { port }))
    }
}

struct SerialHandle {
    port: Box<dyn SerialPort>,
}

impl Write for SerialHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl PortHandle for SerialHandle {
    fn close(self: Box<Self>) -> Result<(), TransportError> {
        // serialport fecha o descritor no drop
        drop(self.port);
        Ok(())
    }
}

/// Nome amigável no formato `"<descrição> (<porta>)"`.
fn describe(info: &SerialPortInfo) -> PortDescriptor {
    let short = info
        .port_name
        .rsplit('/')
        .next()
        .unwrap_or(&info.port_name);

    let kind = match &info.port_type {
        SerialPortType::UsbPort(usb) => usb
            .product
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "USB Serial".into()),
        SerialPortType::BluetoothPort => "Bluetooth".into(),
        SerialPortType::PciPort => "PCI Serial".into(),
        SerialPortType::Unknown => "Serial".into(),
    };

    PortDescriptor::new(format!("{kind} ({short})"), info.port_name.clone())
}
