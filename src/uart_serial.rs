//! Hardware UART adapter for the RG-15 link.
//!
//! Opens the configured device with the sensor's fixed frame format
//! (8 data bits, no parity, 1 stop bit) and adapts the `serialport` handle
//! to the core's byte-oriented [`SerialTransport`] trait. A short port
//! timeout keeps single-byte reads from blocking past the line reader's own
//! deadline.

use anyhow::Context;
use rain_gauge_lib::config::SerialConfig;
use rain_gauge_lib::transport::SerialTransport;
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;

pub struct UartSerial {
    port: Box<dyn SerialPort>,
}

impl UartSerial {
    pub fn open(config: &SerialConfig) -> anyhow::Result<Self> {
        let port = serialport::new(&config.device, config.baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(Duration::from_millis(50))
            .open()
            .with_context(|| format!("open serial port {}", config.device))?;
        Ok(UartSerial { port })
    }
}

impl SerialTransport for UartSerial {
    fn bytes_available(&mut self) -> bool {
        self.port.bytes_to_read().map(|n| n > 0).unwrap_or(false)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if !self.bytes_available() {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }
}
