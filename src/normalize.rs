//! Prediction form normalization
//!
//! Keeps the form's minutes/seconds fields in sync with `duration_ms`, clamps
//! every feature field into its declared range and reports a transient
//! [`Warning`] whenever it had to correct the user.

use crate::features::{feature, FeatureSpec, FeatureVector, DURATION_FEATURE, FEATURES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const MIN_DURATION_MS: u64 = 30_000;
pub const MAX_DURATION_MS: u64 = 600_000;
pub const MAX_MINUTES: u32 = 10;
pub const MAX_SECONDS: u32 = 59;

pub const MINUTES_FIELD: &str = "minutes";
pub const SECONDS_FIELD: &str = "seconds";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("{label} must be a number (got '{value}')")]
    NotANumber { label: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    Minimum,
    Maximum,
}

/// Feedback for an input that was clamped. Cleared by the page after the
/// configured warning ttl; never blocks submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub field: String,
    pub bound: Bound,
    pub message: String,
}

pub fn min_sec_to_ms(minutes: u32, seconds: u32) -> u64 {
    (u64::from(minutes) * 60 + u64::from(seconds)) * 1000
}

pub fn ms_to_min_sec(duration_ms: u64) -> (u32, u32) {
    let total_seconds = duration_ms / 1000;
    let minutes = u32::try_from(total_seconds / 60).unwrap_or(u32::MAX);
    (minutes, (total_seconds % 60) as u32)
}

/// Minutes, seconds and the equivalent `duration_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackLength {
    pub minutes: u32,
    pub seconds: u32,
    pub duration_ms: u64,
}

impl TrackLength {
    pub fn from_ms(duration_ms: u64) -> Self {
        let (minutes, seconds) = ms_to_min_sec(duration_ms);
        Self {
            minutes,
            seconds,
            duration_ms,
        }
    }
}

fn duration_warning(bound: Bound) -> Warning {
    let message = match bound {
        Bound::Minimum => "Minimum: 30 seconds",
        Bound::Maximum => "Maximum: 10 minutes",
    };
    Warning {
        field: DURATION_FEATURE.to_string(),
        bound,
        message: message.to_string(),
    }
}

/// Apply a minutes/seconds edit. The bound is picked from the total as
/// typed; an in-range total keeps each field within its own range.
pub fn normalize_duration(minutes: i64, seconds: i64) -> (TrackLength, Option<Warning>) {
    let typed_ms = minutes
        .saturating_mul(60)
        .saturating_add(seconds)
        .saturating_mul(1000);

    let minutes = minutes.clamp(0, i64::from(MAX_MINUTES)) as u32;
    let seconds = seconds.clamp(0, i64::from(MAX_SECONDS)) as u32;
    let total_ms = min_sec_to_ms(minutes, seconds);

    if typed_ms < MIN_DURATION_MS as i64 || total_ms < MIN_DURATION_MS {
        (
            TrackLength::from_ms(MIN_DURATION_MS),
            Some(duration_warning(Bound::Minimum)),
        )
    } else if typed_ms > MAX_DURATION_MS as i64 || total_ms > MAX_DURATION_MS {
        (
            TrackLength::from_ms(MAX_DURATION_MS),
            Some(duration_warning(Bound::Maximum)),
        )
    } else {
        (
            TrackLength {
                minutes,
                seconds,
                duration_ms: total_ms,
            },
            None,
        )
    }
}

/// Parse a field the way a number input does: surrounding whitespace is
/// ignored, NaN is not a number.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Clamp one feature field in place. Text that is not a number is left as
/// typed; it is rejected later, at submission.
pub fn clamp_field(spec: &FeatureSpec, text: &mut String) -> Option<Warning> {
    let value = parse_number(text)?;

    let (bound, limit) = if value < spec.min {
        (Bound::Minimum, spec.min)
    } else if value > spec.max {
        (Bound::Maximum, spec.max)
    } else {
        return None;
    };

    *text = limit.to_string();
    let message = match bound {
        Bound::Minimum => format!("Minimum value is {}", limit),
        Bound::Maximum => format!("Maximum value is {}", limit),
    };
    Some(Warning {
        field: spec.name.to_string(),
        bound,
        message,
    })
}

/// Editable state of the prediction form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    /// Field text for every feature except `duration_ms`
    pub fields: BTreeMap<String, String>,
    #[serde(flatten)]
    pub length: TrackLength,
}

impl Default for FormState {
    fn default() -> Self {
        Self::defaults()
    }
}

impl FormState {
    pub fn defaults() -> Self {
        let fields = FEATURES
            .iter()
            .filter(|f| f.name != DURATION_FEATURE)
            .map(|f| (f.name.to_string(), f.default.to_string()))
            .collect();

        let duration_default = feature(DURATION_FEATURE)
            .map(|f| f.default as u64)
            .unwrap_or(MIN_DURATION_MS);

        Self {
            fields,
            length: TrackLength::from_ms(duration_default),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::defaults();
    }

    /// Apply one edit. `field` is a feature name, "minutes" or "seconds".
    /// Minutes/seconds that do not parse count as 0.
    pub fn edit(&mut self, field: &str, raw: &str) -> Result<Option<Warning>, FormError> {
        match field {
            MINUTES_FIELD => Ok(self.edit_length(Some(raw), None)),
            SECONDS_FIELD => Ok(self.edit_length(None, Some(raw))),
            DURATION_FEATURE => {
                let ms = parse_number(raw).ok_or_else(|| FormError::NotANumber {
                    label: "Duration",
                    value: raw.to_string(),
                })?;
                let (length, warning) = if ms < MIN_DURATION_MS as f64 {
                    (
                        TrackLength::from_ms(MIN_DURATION_MS),
                        Some(duration_warning(Bound::Minimum)),
                    )
                } else if ms > MAX_DURATION_MS as f64 {
                    (
                        TrackLength::from_ms(MAX_DURATION_MS),
                        Some(duration_warning(Bound::Maximum)),
                    )
                } else {
                    let (minutes, seconds) = ms_to_min_sec(ms as u64);
                    normalize_duration(i64::from(minutes), i64::from(seconds))
                };
                self.length = length;
                Ok(warning)
            }
            name => {
                let spec = feature(name).ok_or_else(|| FormError::UnknownField(name.to_string()))?;
                let text = self.fields.entry(spec.name.to_string()).or_default();
                *text = raw.to_string();
                Ok(clamp_field(spec, text))
            }
        }
    }

    /// Apply minutes and seconds as one edit. A part left out keeps its
    /// current value.
    pub fn edit_length(
        &mut self,
        minutes: Option<&str>,
        seconds: Option<&str>,
    ) -> Option<Warning> {
        let parse = |raw: &str| raw.trim().parse::<i64>().unwrap_or(0);
        let minutes = minutes.map_or(i64::from(self.length.minutes), parse);
        let seconds = seconds.map_or(i64::from(self.length.seconds), parse);

        let (length, warning) = normalize_duration(minutes, seconds);
        self.length = length;
        warning
    }

    /// Assemble the prediction payload from the current field text
    pub fn to_vector(&self) -> Result<FeatureVector, FormError> {
        let mut values = [0.0; 10];
        for (slot, spec) in values.iter_mut().zip(FEATURES.iter()) {
            *slot = if spec.name == DURATION_FEATURE {
                self.length.duration_ms as f64
            } else {
                let text = self.fields.get(spec.name).map(String::as_str).unwrap_or("");
                parse_number(text).ok_or_else(|| FormError::NotANumber {
                    label: spec.label,
                    value: text.to_string(),
                })?
            };
        }
        Ok(FeatureVector::from_values(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_sec_conversions() {
        assert_eq!(min_sec_to_ms(3, 20), 200_000);
        assert_eq!(ms_to_min_sec(200_000), (3, 20));
        assert_eq!(ms_to_min_sec(200_999), (3, 20));
        assert_eq!(ms_to_min_sec(600_000), (10, 0));
    }

    #[test]
    fn test_duration_below_minimum() {
        let (length, warning) = normalize_duration(0, 12);
        assert_eq!(length, TrackLength { minutes: 0, seconds: 30, duration_ms: 30_000 });
        let warning = warning.unwrap();
        assert_eq!(warning.bound, Bound::Minimum);
        assert_eq!(warning.field, "duration_ms");
    }

    #[test]
    fn test_duration_above_maximum() {
        let (length, warning) = normalize_duration(10, 30);
        assert_eq!(length, TrackLength { minutes: 10, seconds: 0, duration_ms: 600_000 });
        assert_eq!(warning.unwrap().bound, Bound::Maximum);
    }

    #[test]
    fn test_duration_fields_held_to_own_range() {
        let (length, warning) = normalize_duration(2, 75);
        assert_eq!(length, TrackLength { minutes: 2, seconds: 59, duration_ms: 179_000 });
        assert!(warning.is_none());

        let (length, warning) = normalize_duration(-4, 40);
        assert_eq!(length.duration_ms, 30_000);
        assert_eq!(warning.unwrap().bound, Bound::Minimum);
    }

    #[test]
    fn test_duration_over_ten_minutes_warns() {
        for (minutes, seconds) in [(11, 0), (25, 0), (10, 60), (i64::MAX, i64::MAX)] {
            let (length, warning) = normalize_duration(minutes, seconds);
            assert_eq!(length, TrackLength { minutes: 10, seconds: 0, duration_ms: 600_000 });
            assert_eq!(warning.unwrap().message, "Maximum: 10 minutes");
        }

        let mut form = FormState::defaults();
        form.edit("seconds", "0").unwrap();
        let warning = form.edit("minutes", "25").unwrap().unwrap();
        assert_eq!(warning.bound, Bound::Maximum);
    }

    #[test]
    fn test_huge_duration_ms_clamps_to_maximum() {
        assert_eq!(ms_to_min_sec(257_698_037_940_000), (u32::MAX, 0));

        let mut form = FormState::defaults();
        let warning = form.edit("duration_ms", "257698037940000").unwrap().unwrap();
        assert_eq!(warning.bound, Bound::Maximum);
        assert_eq!(form.length, TrackLength { minutes: 10, seconds: 0, duration_ms: 600_000 });

        let warning = form.edit("duration_ms", "-5").unwrap().unwrap();
        assert_eq!(warning.bound, Bound::Minimum);
        assert_eq!(form.length.duration_ms, 30_000);

        assert!(form.edit("duration_ms", "245500").unwrap().is_none());
        assert_eq!(form.length, TrackLength { minutes: 4, seconds: 5, duration_ms: 245_000 });
    }

    #[test]
    fn test_duration_in_range_is_accepted() {
        let (length, warning) = normalize_duration(4, 5);
        assert_eq!(length.duration_ms, 245_000);
        assert!(warning.is_none());
    }

    #[test]
    fn test_clamp_field_below_min() {
        let spec = feature("loudness").unwrap();
        let mut text = "-80".to_string();
        let warning = clamp_field(spec, &mut text).unwrap();
        assert_eq!(text, "-60");
        assert_eq!(warning.message, "Minimum value is -60");
    }

    #[test]
    fn test_clamp_field_above_max() {
        let spec = feature("energy").unwrap();
        let mut text = "1.5".to_string();
        let warning = clamp_field(spec, &mut text).unwrap();
        assert_eq!(text, "1");
        assert_eq!(warning.bound, Bound::Maximum);
        assert_eq!(warning.message, "Maximum value is 1");
    }

    #[test]
    fn test_clamp_field_leaves_non_numbers() {
        let spec = feature("tempo").unwrap();
        let mut text = "fast".to_string();
        assert!(clamp_field(spec, &mut text).is_none());
        assert_eq!(text, "fast");
    }

    #[test]
    fn test_form_defaults() {
        let form = FormState::defaults();
        assert_eq!(form.length, TrackLength { minutes: 3, seconds: 20, duration_ms: 200_000 });
        assert_eq!(form.fields.len(), 9);
        assert_eq!(form.fields["tempo"], "120");
        assert_eq!(form.to_vector().unwrap(), FeatureVector::defaults());
    }

    #[test]
    fn test_form_edit_minutes_then_reset() {
        let mut form = FormState::defaults();
        assert!(form.edit("minutes", "5").unwrap().is_none());
        assert_eq!(form.length.duration_ms, 320_000);

        let warning = form.edit("minutes", "12").unwrap().unwrap();
        assert_eq!(warning.bound, Bound::Maximum);
        assert_eq!(form.length, TrackLength { minutes: 10, seconds: 0, duration_ms: 600_000 });

        form.reset();
        assert_eq!(form, FormState::defaults());
    }

    #[test]
    fn test_form_edit_seconds_to_minimum() {
        let mut form = FormState::defaults();
        form.edit("minutes", "0").unwrap();
        let warning = form.edit("seconds", "5").unwrap();
        assert!(warning.is_some());
        assert_eq!(form.length, TrackLength { minutes: 0, seconds: 30, duration_ms: 30_000 });
    }

    #[test]
    fn test_edit_length_applies_both_parts_at_once() {
        let mut form = FormState::defaults();
        assert!(form.edit_length(Some("0"), Some("45")).is_none());
        assert_eq!(form.length, TrackLength { minutes: 0, seconds: 45, duration_ms: 45_000 });

        assert!(form.edit_length(None, Some("10")).is_some());
        assert_eq!(form.length.duration_ms, 30_000);

        assert!(form.edit_length(Some("7"), None).is_none());
        assert_eq!(form.length, TrackLength { minutes: 7, seconds: 30, duration_ms: 450_000 });
    }

    #[test]
    fn test_form_edit_feature_clamps_in_place() {
        let mut form = FormState::defaults();
        let warning = form.edit("tempo", "300").unwrap().unwrap();
        assert_eq!(warning.message, "Maximum value is 250");
        assert_eq!(form.fields["tempo"], "250");
        assert_eq!(form.to_vector().unwrap().get("tempo"), Some(250.0));
    }

    #[test]
    fn test_form_edit_unknown_field() {
        let mut form = FormState::defaults();
        assert_eq!(
            form.edit("mode", "1"),
            Err(FormError::UnknownField("mode".to_string()))
        );
    }

    #[test]
    fn test_non_numeric_field_rejected_at_submission() {
        let mut form = FormState::defaults();
        assert!(form.edit("valence", "happy").unwrap().is_none());
        let err = form.to_vector().unwrap_err();
        assert_eq!(
            err,
            FormError::NotANumber {
                label: "Valence",
                value: "happy".to_string()
            }
        );
        assert_eq!(err.to_string(), "Valence must be a number (got 'happy')");
    }

    #[test]
    fn test_form_json_shape() {
        let json = serde_json::to_value(FormState::defaults()).unwrap();
        assert_eq!(json["minutes"], 3);
        assert_eq!(json["seconds"], 20);
        assert_eq!(json["duration_ms"], 200000);
        assert_eq!(json["fields"]["energy"], "0.7");

        let back: FormState = serde_json::from_value(json).unwrap();
        assert_eq!(back, FormState::defaults());
    }
}
