//! # RG-15 Response Classification and Parsing
//!
//! The sensor's serial output mixes three kinds of lines:
//! - **Diagnostic** chatter: boot banners, version strings, overflow notices
//! - **Alerts**: fault conditions (`EmSat`, `Lens`) the operator must see
//! - **Data**: the measurement line answering an `R` query
//!
//! Classification is substring-based and case-sensitive, matching the
//! sensor's literal output. Alerts take priority over data parsing: an
//! alert line is never handed to the parser.
//!
//! ## Two data formats
//!
//! Different firmware revisions lay out the data line differently, so the
//! parser supports both:
//!
//! - **Format 1**: `Acc=0.010 EventAcc=0.010 TotalAcc=12.340 RInt=0.000`
//! - **Format 2**: `Acc 0.010 in, EventAcc 0.010 in, TotalAcc 12.340 in, RInt 0.000 iph`
//!
//! Format 1 is tried first; Format 2 only runs when Format 1 extracted
//! nothing and the line mentions `Acc`. Parsing is pure and never fails:
//! an unrecognized line just yields an empty field map.

use crate::{AlertKind, Field, RainUnits, Reading};
use std::collections::BTreeMap;

/// Substrings that mark a line as internal sensor chatter, safe to skip.
///
/// Both `overlow` and `overflow` are matched on purpose: certain firmware
/// misspells its own overflow notice, and filtering must catch both.
const DIAGNOSTIC_MARKERS: [&str; 4] = ["overlow", "overflow", "----", "SW "];

/// Recognized labels in the labelled (Format 2) layout.
const FORMAT2_LABELS: [&str; 4] = ["Acc", "EventAcc", "TotalAcc", "RInt"];

/// Classification of one decoded line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    /// Internal sensor chatter, silently skippable outside debug display
    Diagnostic,
    /// Sensor-reported fault condition; never passed to the parser
    Alert(AlertKind),
    /// Candidate data line, to be handed to [`parse`]
    Data,
}

/// Classify a line as diagnostic, alert, or data candidate.
///
/// Exhaustive and mutually exclusive: every non-empty line maps to exactly
/// one variant. Note that `Event` must not appear in the diagnostic set,
/// since it is a prefix of the `EventAcc` data field.
pub fn classify(line: &str) -> Response {
    if DIAGNOSTIC_MARKERS.iter().any(|m| line.contains(m)) {
        return Response::Diagnostic;
    }
    if line.contains("EmSat") {
        return Response::Alert(AlertKind::EmitterSaturated);
    }
    if line.contains("Lens") {
        return Response::Alert(AlertKind::LensFault);
    }
    Response::Data
}

/// Parse a data line into named fields, tolerant of both firmware formats.
///
/// Never errors: fields that fail numeric conversion are kept as text
/// (Format 1) or skipped (Format 2), and a line matching neither format
/// yields an empty map.
pub fn parse(line: &str) -> BTreeMap<String, Field> {
    let mut data = BTreeMap::new();
    if line.is_empty() {
        return data;
    }

    // Format 1: "Key=Value" tokens (some firmware versions)
    for token in line.split_whitespace() {
        if let Some((key, value)) = token.split_once('=') {
            let field = match value.parse::<f64>() {
                Ok(n) => Field::Number(n),
                Err(_) => Field::Text(value.to_string()),
            };
            data.insert(key.to_string(), field);
        }
    }

    // Format 2: "Acc 0.010 in, EventAcc 0.010 in, ..." (labelled values)
    if data.is_empty() && line.contains("Acc") {
        let stripped = line.replace(',', "");
        let parts: Vec<&str> = stripped.split_whitespace().collect();
        for pair in parts.windows(2) {
            let (key, value) = (pair[0], pair[1]);
            if FORMAT2_LABELS.contains(&key) {
                if let Ok(n) = value.parse::<f64>() {
                    data.insert(key.to_string(), Field::Number(n));
                }
                // a non-numeric neighbor just skips this label
            }
        }
    }

    data
}

impl RainUnits {
    /// Infer units from the raw line: `" in"` or `"iph"` means imperial.
    pub fn infer(line: &str) -> Self {
        let imperial_acc = line.contains(" in") || line.contains("iph");
        RainUnits {
            accumulation: if imperial_acc { "in" } else { "mm" },
            rate: if line.contains("iph") { "in/hr" } else { "mm/hr" },
        }
    }
}

impl Reading {
    /// Parse a classified data line into a `Reading`.
    ///
    /// Returns `None` when the parse extracts no fields, which the caller
    /// treats as an unrecognized (skippable) line, not an error.
    pub fn from_line(line: &str) -> Option<Reading> {
        let fields = parse(line);
        if fields.is_empty() {
            return None;
        }
        Some(Reading {
            fields,
            units: RainUnits::infer(line),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format1_extracts_every_key_value_token() {
        let data = parse("Acc=0.010 EventAcc=0.020 TotalAcc=12.340 RInt=0.000");
        assert_eq!(data.get("Acc"), Some(&Field::Number(0.010)));
        assert_eq!(data.get("EventAcc"), Some(&Field::Number(0.020)));
        assert_eq!(data.get("TotalAcc"), Some(&Field::Number(12.340)));
        assert_eq!(data.get("RInt"), Some(&Field::Number(0.0)));
    }

    #[test]
    fn format1_keeps_non_numeric_values_as_text() {
        let data = parse("Acc=0.010 Mode=Polling");
        assert_eq!(data.get("Acc"), Some(&Field::Number(0.010)));
        assert_eq!(data.get("Mode"), Some(&Field::Text("Polling".to_string())));
    }

    #[test]
    fn format1_splits_on_first_equals_only() {
        let data = parse("Note=a=b");
        assert_eq!(data.get("Note"), Some(&Field::Text("a=b".to_string())));
    }

    #[test]
    fn format2_extracts_all_four_labels() {
        let data = parse("Acc 0.010 in, EventAcc 0.010 in, TotalAcc 12.340 in, RInt 0.000 iph");
        assert_eq!(data.get("Acc"), Some(&Field::Number(0.010)));
        assert_eq!(data.get("EventAcc"), Some(&Field::Number(0.010)));
        assert_eq!(data.get("TotalAcc"), Some(&Field::Number(12.340)));
        assert_eq!(data.get("RInt"), Some(&Field::Number(0.0)));
    }

    #[test]
    fn format2_skips_unparsable_pair_and_continues() {
        // "Acc in" has no number after the label; RInt must still be captured
        let data = parse("Acc in, RInt 0.500 iph");
        assert_eq!(data.get("Acc"), None);
        assert_eq!(data.get("RInt"), Some(&Field::Number(0.5)));
    }

    #[test]
    fn format2_only_runs_when_format1_finds_nothing() {
        // A mixed-style line keeps only Format 1's fields
        let data = parse("K=1 Acc 0.010 in");
        assert_eq!(data.get("K"), Some(&Field::Number(1.0)));
        assert_eq!(data.get("Acc"), None);
    }

    #[test]
    fn unrecognized_line_yields_empty_map() {
        assert!(parse("hello world").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn parsing_is_pure_and_idempotent() {
        let line = "Acc 0.010 in, EventAcc 0.010 in, TotalAcc 12.340 in, RInt 0.000 iph";
        assert_eq!(parse(line), parse(line));
    }

    #[test]
    fn classify_flags_both_overflow_spellings() {
        // 'overlow' is a real firmware misspelling, matched on purpose
        assert_eq!(classify("Acc overlow"), Response::Diagnostic);
        assert_eq!(classify("Acc overflow"), Response::Diagnostic);
    }

    #[test]
    fn classify_flags_banner_and_version_lines() {
        assert_eq!(classify("------------------"), Response::Diagnostic);
        assert_eq!(classify("SW 1.000"), Response::Diagnostic);
    }

    #[test]
    fn classify_alerts_take_priority_over_data() {
        assert_eq!(
            classify("K=1 EmSat"),
            Response::Alert(AlertKind::EmitterSaturated)
        );
        assert_eq!(classify("LensBad"), Response::Alert(AlertKind::LensFault));
    }

    #[test]
    fn classify_everything_else_is_a_data_candidate() {
        assert_eq!(classify("Acc 0.010 in"), Response::Data);
        assert_eq!(classify("Acc=0.010"), Response::Data);
        // EventAcc contains 'Event' but no diagnostic marker
        assert_eq!(classify("EventAcc 0.010 in"), Response::Data);
    }

    #[test]
    fn unit_inference_imperial_and_metric() {
        let imperial = RainUnits::infer("Acc 0.010 in, RInt 0.000 iph");
        assert_eq!(imperial.accumulation, "in");
        assert_eq!(imperial.rate, "in/hr");

        let metric = RainUnits::infer("Acc 0.200 mm, RInt 0.000 mmph");
        assert_eq!(metric.accumulation, "mm");
        assert_eq!(metric.rate, "mm/hr");
    }

    #[test]
    fn reading_from_line_treats_absent_fields_as_zero() {
        let r = Reading::from_line("Acc=0.010").unwrap();
        assert_eq!(r.acc(), 0.010);
        assert_eq!(r.event_acc(), 0.0);
        assert_eq!(r.total_acc(), 0.0);
        assert_eq!(r.intensity(), 0.0);
    }

    #[test]
    fn reading_from_unrecognized_line_is_none() {
        assert!(Reading::from_line("just noise").is_none());
    }
}
