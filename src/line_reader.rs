//! # Serial Line Framing
//!
//! Accumulates bytes from the serial transport into discrete text lines,
//! bounded by a deadline and a maximum length. The RG-15 terminates lines
//! with `\r\n`, but a stuck or chattering sensor can emit arbitrary byte
//! streams, so the reader guards against both unbounded buffers and
//! undecodable bytes.
//!
//! Distinctions the callers rely on:
//! - `None` means no data arrived at all within the timeout
//! - an empty decoded string (all-whitespace partial) is ignorable, not
//!   "no data"
//! - a returned line is never longer than [`MAX_LINE_LENGTH`] characters

use crate::transport::SerialTransport;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

/// Upper bound on accumulated line length. Prevents buffer overflow from a
/// sensor that never sends a terminator.
pub const MAX_LINE_LENGTH: usize = 256;

/// Idle wait between byte-availability checks, coalescing to avoid
/// busy-spinning the CPU while the sensor is quiet.
const IDLE_WAIT: Duration = Duration::from_millis(5);

/// Read one line from the transport, waiting at most `timeout`.
///
/// A `\n` or `\r` terminates the current line and returns it immediately;
/// the read never waits out the rest of the timeout once a line is complete.
/// A bare terminator with nothing accumulated is a line separator to skip,
/// not a result. If the buffer reaches [`MAX_LINE_LENGTH`] before any
/// terminator, the accumulated bytes are flushed as the result. On deadline
/// with a non-empty partial buffer, the partial content is returned;
/// otherwise `None`.
///
/// Undecodable bytes are replaced, not treated as failures, and the result
/// is trimmed of surrounding whitespace.
pub fn read_line<T: SerialTransport>(
    transport: &mut T,
    timeout: Duration,
) -> io::Result<Option<String>> {
    let start = Instant::now();
    let mut buf: Vec<u8> = Vec::new();

    while start.elapsed() < timeout {
        if transport.bytes_available() {
            if let Some(b) = transport.read_byte()? {
                if b == b'\n' || b == b'\r' {
                    if !buf.is_empty() {
                        return Ok(Some(decode(&buf)));
                    }
                    // bare terminator: skip and keep reading
                } else {
                    buf.push(b);
                    if buf.len() >= MAX_LINE_LENGTH {
                        return Ok(Some(decode(&buf)));
                    }
                }
            }
        } else {
            thread::sleep(IDLE_WAIT);
        }
    }

    if buf.is_empty() {
        Ok(None)
    } else {
        Ok(Some(decode(&buf)))
    }
}

fn decode(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).trim().to_string()
}
