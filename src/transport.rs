//! # Serial Transport Seam
//!
//! The core only needs three byte-oriented primitives from the serial link:
//! an availability check, a single-byte receive, and a send. Everything else
//! (framing, timeouts, parsing) is built on top of this trait, which keeps
//! the pipeline testable without hardware and keeps the UART handle an
//! explicit value instead of a process-wide global.
//!
//! Two implementations exist:
//! - the real UART adapter in the binary (behind the `hardware` feature)
//! - [`ScriptedTransport`], an in-memory double used by tests and by the
//!   binary's `--demo` development mode

use std::collections::VecDeque;
use std::io;

/// Byte-oriented serial access, single reader and single writer.
///
/// The RG-15 link is half-duplex in practice: the monitor sends a one-letter
/// command and then drains whatever the sensor answers. No locking is needed
/// because exactly one task touches the transport.
pub trait SerialTransport {
    /// True when at least one received byte is waiting.
    fn bytes_available(&mut self) -> bool;

    /// Receive one byte if available. `Ok(None)` means nothing waiting.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Transmit raw bytes to the sensor.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Drain and discard any pending input (stale data, startup banners).
    fn flush_input(&mut self) -> io::Result<()> {
        while self.bytes_available() {
            self.read_byte()?;
        }
        Ok(())
    }
}

/// In-memory transport scripted with canned sensor responses.
///
/// Each call to [`SerialTransport::send`] records the command and releases
/// the next scripted response into the receive buffer, mimicking the RG-15's
/// request/response behavior. An empty response entry scripts a cycle where
/// the sensor stays silent.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: VecDeque<Vec<u8>>,
    pending: VecDeque<u8>,
    sent: Vec<Vec<u8>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the sensor's response to the next command sent.
    pub fn push_response(&mut self, response: &str) {
        self.responses.push_back(response.as_bytes().to_vec());
    }

    /// Queue a command the sensor answers with silence.
    pub fn push_silence(&mut self) {
        self.responses.push_back(Vec::new());
    }

    /// Place bytes directly in the receive buffer, before any command is
    /// sent (startup banner noise).
    pub fn push_pending(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes.iter().copied());
    }

    /// Commands sent so far, in order.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// True once every scripted response has been released.
    pub fn is_exhausted(&self) -> bool {
        self.responses.is_empty()
    }
}

impl SerialTransport for ScriptedTransport {
    fn bytes_available(&mut self) -> bool {
        !self.pending.is_empty()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.pending.pop_front())
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sent.push(bytes.to_vec());
        if let Some(response) = self.responses.pop_front() {
            self.pending.extend(response);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_transport_releases_one_response_per_command() {
        let mut t = ScriptedTransport::new();
        t.push_response("first\n");
        t.push_response("second\n");

        t.send(b"R\n").unwrap();
        let mut got = Vec::new();
        while let Some(b) = t.read_byte().unwrap() {
            got.push(b);
        }
        assert_eq!(got, b"first\n");

        // Second response only appears after the second command
        assert!(!t.bytes_available());
        t.send(b"R\n").unwrap();
        assert!(t.bytes_available());
        assert!(t.is_exhausted());
    }

    #[test]
    fn flush_input_discards_pending_banner() {
        let mut t = ScriptedTransport::new();
        t.push_pending(b"RG-15 boot banner\r\n----\r\n");
        assert!(t.bytes_available());
        t.flush_input().unwrap();
        assert!(!t.bytes_available());
    }
}
