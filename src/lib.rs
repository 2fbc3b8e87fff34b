//! # Rain Tracker Core Library
//!
//! This library provides the serial line-protocol decoder and adaptive
//! polling scheduler for the Hydreon RG-15 optical rain sensor. It's designed
//! for unattended, battery-friendly operation on embedded Linux hosts like
//! the Raspberry Pi Zero 2 W.
//!
//! ## Design Philosophy
//!
//! ### Tolerance over strictness
//! The RG-15's text output varies across firmware revisions: some emit
//! `key=value` tokens, others labelled `Acc 0.010 in, ...` lines, and all of
//! them interleave diagnostic chatter (banners, version strings, overflow
//! notices) with real data. The parser never treats an unrecognized line as
//! an error: it extracts what it can and moves on.
//!
//! ### One task, no contention
//! The whole pipeline is single-threaded and cooperative: one poll/parse/
//! sleep cycle runs to completion before the next begins. Serial reads are
//! blocking-with-timeout, and the only suspension points are the short idle
//! waits between byte-availability checks and the scheduler's power-saving
//! sleep between cycles.
//!
//! ### Data Flow
//! 1. **Poll**: scheduler flushes stale input and sends the `R` query
//! 2. **Frame**: [`line_reader`] accumulates bytes into bounded text lines
//! 3. **Classify**: [`protocol`] filters diagnostics and surfaces alerts
//! 4. **Parse**: tolerant dual-format field extraction into a [`Reading`]
//! 5. **Sleep**: battery mode picks the next sleep from the rain intensity
//!
//! ## Core Types
//!
//! The library exports the value types shared across the pipeline:
//! - [`Reading`]: the parsed fields of one data line, plus inferred units
//! - [`PollOutcome`]: the tagged result of one scheduler cycle
//! - [`AlertKind`]: sensor-reported fault conditions (not software errors)

use std::collections::BTreeMap;
use std::fmt;

// Module declarations
pub mod config;
pub mod line_reader;
pub mod power;
pub mod protocol;
pub mod sensor;
pub mod transport;

/// A single parsed field value from an RG-15 response line.
///
/// The sensor's numeric fields use a plain decimal format (`0.000`), but
/// some firmware emits non-numeric values (mode flags, unit suffixes glued
/// to values). Those are kept as text rather than discarded, so callers can
/// still inspect them.
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    /// Value parsed as a decimal number
    Number(f64),
    /// Value that failed numeric conversion, kept verbatim
    Text(String),
}

impl Field {
    /// Numeric view of the field: `Text` values read as `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Field::Number(n) => Some(*n),
            Field::Text(_) => None,
        }
    }
}

/// Accumulation and rate units inferred from a raw response line.
///
/// The RG-15 does not label units in its `key=value` format, and in its
/// labelled format the units ride along as loose tokens (`in`, `iph`). Unit
/// inference is therefore substring-based on the raw line: `" in"` or `"iph"`
/// means imperial, anything else metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RainUnits {
    /// Accumulation unit: `"in"` or `"mm"`
    pub accumulation: &'static str,
    /// Rain-rate unit: `"in/hr"` or `"mm/hr"`
    pub rate: &'static str,
}

/// The parsed result of one successful data-line poll.
///
/// A `Reading` is only ever constructed from a non-empty, non-diagnostic
/// line whose parse extracted at least one field. It lives for exactly one
/// cycle: the drivers format it, the battery scheduler reads its intensity,
/// and then it's dropped.
///
/// Absent fields are a normal condition (firmware revisions differ in what
/// they report), so [`Reading::value`] returns `0.0` rather than an error
/// for a missing or textual field.
///
/// # Example
/// ```
/// use rain_gauge_lib::Reading;
///
/// let r = Reading::from_line("Acc 0.010 in, EventAcc 0.010 in, RInt 0.000 iph").unwrap();
/// assert_eq!(r.acc(), 0.010);
/// assert_eq!(r.intensity(), 0.0);
/// assert_eq!(r.units.accumulation, "in");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    /// Extracted fields, keyed by the sensor's own field names
    pub fields: BTreeMap<String, Field>,
    /// Units inferred from the raw line
    pub units: RainUnits,
}

impl Reading {
    /// Numeric value of a named field; `0.0` when absent or non-numeric.
    pub fn value(&self, name: &str) -> f64 {
        self.fields
            .get(name)
            .and_then(Field::as_number)
            .unwrap_or(0.0)
    }

    /// Accumulated rainfall since last reset (`Acc`).
    pub fn acc(&self) -> f64 {
        self.value("Acc")
    }

    /// Rainfall accumulated during the current rain event (`EventAcc`).
    pub fn event_acc(&self) -> f64 {
        self.value("EventAcc")
    }

    /// Lifetime cumulative rainfall (`TotalAcc`).
    pub fn total_acc(&self) -> f64 {
        self.value("TotalAcc")
    }

    /// Current rain rate (`RInt`), the input to the adaptive sleep policy.
    pub fn intensity(&self) -> f64 {
        self.value("RInt")
    }
}

/// Sensor-reported fault conditions.
///
/// These are domain-level conditions, not software errors: they are surfaced
/// to the operator every time they are observed and polling continues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    /// `EmSat`: emitter saturated (very heavy rain, or a blocked lens)
    EmitterSaturated,
    /// `Lens`: lens fault reported by the sensor
    LensFault,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::EmitterSaturated => {
                write!(f, "Emitter Saturated (heavy rain or lens blocked)")
            }
            AlertKind::LensFault => write!(f, "Lens issue detected"),
        }
    }
}

/// Tagged result of one poll cycle.
///
/// `NoResponse` is not an error; an absent or sleepy sensor is an expected
/// condition, handled by simply proceeding to the next scheduled cycle.
#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    /// A data line was parsed into at least one field
    Data(Reading),
    /// Only alert lines were seen this cycle
    Alert(AlertKind),
    /// All read attempts exhausted without data or alerts
    NoResponse,
}
