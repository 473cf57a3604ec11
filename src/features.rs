//! Model input features
//!
//! The ten audio features the prediction endpoint expects, with the range,
//! step and default shown on the form.

use serde::Serialize;
use std::collections::BTreeMap;

pub const DURATION_FEATURE: &str = "duration_ms";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
    pub label: &'static str,
    pub unit: &'static str,
}

impl FeatureSpec {
    /// Hold `value` inside `[min, max]`
    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// "(0 - 1)" or "(-60 - 0 dB)"
    pub fn range_label(&self) -> String {
        if self.unit.is_empty() {
            format!("({} - {})", self.min, self.max)
        } else {
            format!("({} - {} {})", self.min, self.max, self.unit)
        }
    }
}

#[rustfmt::skip]
pub const FEATURES: [FeatureSpec; 10] = [
    FeatureSpec { name: "danceability", min: 0.0, max: 1.0, step: 0.01, default: 0.5, label: "Danceability", unit: "" },
    FeatureSpec { name: "energy", min: 0.0, max: 1.0, step: 0.01, default: 0.7, label: "Energy", unit: "" },
    FeatureSpec { name: "loudness", min: -60.0, max: 0.0, step: 0.1, default: -6.0, label: "Loudness", unit: "dB" },
    FeatureSpec { name: "speechiness", min: 0.0, max: 1.0, step: 0.01, default: 0.05, label: "Speechiness", unit: "" },
    FeatureSpec { name: "acousticness", min: 0.0, max: 1.0, step: 0.01, default: 0.2, label: "Acousticness", unit: "" },
    FeatureSpec { name: "instrumentalness", min: 0.0, max: 1.0, step: 0.01, default: 0.1, label: "Instrumentalness", unit: "" },
    FeatureSpec { name: "liveness", min: 0.0, max: 1.0, step: 0.01, default: 0.15, label: "Liveness", unit: "" },
    FeatureSpec { name: "valence", min: 0.0, max: 1.0, step: 0.01, default: 0.5, label: "Valence", unit: "" },
    FeatureSpec { name: "tempo", min: 0.0, max: 250.0, step: 1.0, default: 120.0, label: "Tempo", unit: "BPM" },
    FeatureSpec { name: DURATION_FEATURE, min: 30_000.0, max: 600_000.0, step: 1000.0, default: 200_000.0, label: "Duration", unit: "ms" },
];

pub fn feature(name: &str) -> Option<&'static FeatureSpec> {
    FEATURES.iter().find(|f| f.name == name)
}

/// Display label for a feature name, falling back to the name itself
pub fn label_for(name: &str) -> &str {
    feature(name).map(|f| f.label).unwrap_or(name)
}

/// Payload of the prediction endpoint: one value per feature, all in range
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(BTreeMap<&'static str, f64>);

impl FeatureVector {
    /// Build from values in `FEATURES` order, clamping each into its range
    pub fn from_values(values: [f64; 10]) -> Self {
        let map = FEATURES
            .iter()
            .zip(values)
            .map(|(spec, value)| (spec.name, spec.clamp(value)))
            .collect();
        Self(map)
    }

    pub fn defaults() -> Self {
        Self::from_values(FEATURES.map(|f| f.default))
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
                .collect(),
        )
    }
}
