//! # Poll Scheduler and Startup Handshake
//!
//! Orchestrates the request/response cycle against the RG-15: flush stale
//! input, send the `R` query, read up to three lines (the sensor may emit a
//! status line before or after the data line), and classify each until a
//! data line turns up. The startup handshake runs the same cycle with a
//! bounded retry budget and an explicit `Booting -> Connected | Degraded`
//! transition, so sensor absence degrades operation instead of aborting it.
//!
//! The adaptive sleep policy for battery operation is a pure function
//! ([`next_sleep`]) over the cycle outcome, so the drivers stay thin and the
//! policy is testable without timing.

use crate::config::{BatteryConfig, SensorConfig};
use crate::line_reader::read_line;
use crate::protocol::{classify, Response};
use crate::transport::SerialTransport;
use crate::{PollOutcome, Reading};
use std::io;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// The only command the monitoring cycle sends: request current reading.
/// The sensor's other single-letter commands (A, K, P, C, M, I, H, L, O, B)
/// are configuration and belong to the interactive utility, not this loop.
pub const POLL_COMMAND: &[u8] = b"R\n";

/// Bounded line reads per poll cycle. The sensor may front- or back-run the
/// data line with one status line, so one read is not enough; three always
/// covers the observed traffic.
const MAX_POLL_READS: usize = 3;

/// Errors surfaced by the scheduler.
///
/// Only transport I/O can fail here. A silent sensor, a malformed line, or
/// an exhausted handshake are all normal outcomes, never errors.
#[derive(Error, Debug)]
pub enum SensorError {
    /// Serial transport read or write failed
    #[error("serial I/O: {0}")]
    Serial(#[from] io::Error),
}

/// Startup handshake state.
///
/// `Degraded` is not fatal: polling continues identically to `Connected`
/// and simply expects intermittent `NoResponse` outcomes. The state is
/// surfaced once to the operator and never re-entered except across a
/// deep-suspend restart boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorState {
    /// Power-up: no qualifying response seen yet
    Booting,
    /// A data-bearing (`Acc`) line was seen during the handshake
    Connected,
    /// Retry budget exhausted without a qualifying line
    Degraded,
}

/// Fixed delays of the request/response cycle.
///
/// The defaults match the sensor's observed behavior at 9600 baud; tests
/// substitute [`Timings::fast`] so scenario tests run in milliseconds.
#[derive(Clone, Copy, Debug)]
pub struct Timings {
    /// Settle delay between sending the poll command and the first read
    pub settle: Duration,
    /// Settle delay during handshake attempts (the sensor answers slower
    /// right after power-up)
    pub handshake_settle: Duration,
    /// Per-line read deadline during normal polling
    pub read_timeout: Duration,
    /// Per-line read deadline during the handshake
    pub handshake_read_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            settle: Duration::from_millis(100),
            handshake_settle: Duration::from_millis(200),
            read_timeout: Duration::from_millis(500),
            handshake_read_timeout: Duration::from_millis(1000),
        }
    }
}

impl Timings {
    /// Millisecond-scale timings for tests and the scripted demo, where
    /// responses are available instantly.
    pub fn fast() -> Self {
        Timings {
            settle: Duration::ZERO,
            handshake_settle: Duration::ZERO,
            read_timeout: Duration::from_millis(10),
            handshake_read_timeout: Duration::from_millis(10),
        }
    }
}

/// The poll scheduler: owns the transport and the handshake state.
pub struct RainSensor<T: SerialTransport> {
    transport: T,
    timings: Timings,
    state: SensorState,
    debug: bool,
}

impl<T: SerialTransport> RainSensor<T> {
    pub fn new(transport: T, debug: bool) -> Self {
        Self::with_timings(transport, debug, Timings::default())
    }

    pub fn with_timings(transport: T, debug: bool, timings: Timings) -> Self {
        RainSensor {
            transport,
            timings,
            state: SensorState::Booting,
            debug,
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> SensorState {
        self.state
    }

    /// Shared access to the underlying transport (used by the demo driver
    /// to detect script exhaustion).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Startup handshake: `Booting -> Connected | Degraded`.
    ///
    /// Waits out the sensor's power-up delay, discards pending startup
    /// banner noise, then polls up to `max_retries` times. A response line
    /// containing `Acc` qualifies regardless of full parse success. Retry
    /// exhaustion yields `Degraded`, which the caller surfaces as a warning
    /// and then proceeds normally.
    pub fn connect(&mut self, cfg: &SensorConfig) -> Result<SensorState, SensorError> {
        thread::sleep(Duration::from_secs(cfg.boot_delay_seconds));
        self.transport.flush_input()?;

        for attempt in 1..=cfg.max_retries {
            if self.debug {
                eprintln!("  Attempt {}/{}...", attempt, cfg.max_retries);
            }

            self.transport.send(POLL_COMMAND)?;
            thread::sleep(self.timings.handshake_settle);

            if let Some(line) = read_line(&mut self.transport, self.timings.handshake_read_timeout)?
            {
                if line.contains("Acc") {
                    if self.debug {
                        eprintln!("  Response: {}", line);
                    }
                    self.state = SensorState::Connected;
                    return Ok(self.state);
                }
            }

            thread::sleep(Duration::from_secs(cfg.retry_delay_seconds));
        }

        self.state = SensorState::Degraded;
        Ok(self.state)
    }

    /// One poll cycle: flush, query, read up to three lines, classify.
    ///
    /// Returns at the first data line that parses into at least one field.
    /// Alerts seen along the way are reported to stderr immediately and
    /// become the outcome only when no data line follows. Exhausting the
    /// reads with neither data nor alert is `NoResponse`.
    pub fn poll(&mut self) -> Result<PollOutcome, SensorError> {
        self.transport.flush_input()?;
        self.transport.send(POLL_COMMAND)?;
        thread::sleep(self.timings.settle);

        let mut alert = None;
        for _ in 0..MAX_POLL_READS {
            let line = match read_line(&mut self.transport, self.timings.read_timeout)? {
                Some(line) => line,
                None => continue,
            };
            if line.is_empty() {
                continue;
            }

            if self.debug {
                eprintln!("RAW: {}", line);
            }

            match classify(&line) {
                Response::Diagnostic => {
                    if self.debug {
                        eprintln!("  -> (diagnostic, skipped)");
                    }
                }
                Response::Alert(kind) => {
                    eprintln!("ALERT: {}", kind);
                    alert.get_or_insert(kind);
                }
                Response::Data => {
                    if let Some(reading) = Reading::from_line(&line) {
                        return Ok(PollOutcome::Data(reading));
                    }
                    // unrecognized line: no fields, keep scanning
                }
            }
        }

        Ok(match alert {
            Some(kind) => PollOutcome::Alert(kind),
            None => PollOutcome::NoResponse,
        })
    }
}

/// Adaptive sleep policy for battery operation.
///
/// Rain observed this cycle (`RInt > 0`) means the short rain interval;
/// anything else (zero intensity, alerts, no response) means the long idle
/// interval. The suspend depth is static configuration, not part of this
/// decision.
pub fn next_sleep(outcome: &PollOutcome, battery: &BatteryConfig) -> Duration {
    match outcome {
        PollOutcome::Data(reading) if reading.intensity() > 0.0 => {
            Duration::from_secs(battery.rain_poll_minutes * 60)
        }
        _ => Duration::from_secs(battery.battery_poll_minutes * 60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reading;

    fn battery() -> BatteryConfig {
        BatteryConfig {
            battery_poll_minutes: 5,
            rain_poll_minutes: 1,
            sleep_mode: crate::config::SleepMode::Light,
        }
    }

    #[test]
    fn rain_intensity_selects_short_interval() {
        let reading = Reading::from_line("Acc 0.010 in, RInt 0.500 iph").unwrap();
        let sleep = next_sleep(&PollOutcome::Data(reading), &battery());
        assert_eq!(sleep, Duration::from_secs(60));
    }

    #[test]
    fn zero_intensity_selects_idle_interval() {
        let reading = Reading::from_line("Acc 0.010 in, RInt 0.000 iph").unwrap();
        let sleep = next_sleep(&PollOutcome::Data(reading), &battery());
        assert_eq!(sleep, Duration::from_secs(300));
    }

    #[test]
    fn no_response_and_alerts_select_idle_interval() {
        assert_eq!(
            next_sleep(&PollOutcome::NoResponse, &battery()),
            Duration::from_secs(300)
        );
        assert_eq!(
            next_sleep(
                &PollOutcome::Alert(crate::AlertKind::EmitterSaturated),
                &battery()
            ),
            Duration::from_secs(300)
        );
    }
}
