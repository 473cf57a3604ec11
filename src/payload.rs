//! Typed backend responses
//!
//! Every JSON body a panel consumes is decoded into one of these before it is
//! rendered. Fields the dashboard does not show are ignored.

use crate::error::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Decode a JSON body into the payload type a panel expects
pub fn decode<T: DeserializeOwned>(value: serde_json::Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub dataset_loaded: bool,
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub rows: u64,
    pub columns: u64,
    pub features: Vec<String>,
    #[serde(default)]
    pub missing_values: BTreeMap<String, u64>,
}

impl DatasetInfo {
    /// Columns with at least one missing value
    pub fn columns_with_missing(&self) -> impl Iterator<Item = (&str, u64)> {
        self.missing_values
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(name, count)| (name.as_str(), *count))
    }
}

/// Summary statistics of one column. Non-numeric columns come back as nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub q25: Option<f64>,
    pub q75: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distributions {
    pub distributions: BTreeMap<String, ColumnStats>,
    #[serde(default)]
    pub interpretation: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlations {
    pub top_positive: BTreeMap<String, f64>,
    pub top_negative: BTreeMap<String, f64>,
    #[serde(default)]
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genres {
    pub genre_count: u64,
    pub genres: Vec<String>,
    #[serde(default)]
    pub interpretation: String,
    /// feature -> genre -> mean value
    #[serde(default)]
    pub genre_statistics: Option<BTreeMap<String, BTreeMap<String, f64>>>,
}

/// A plot rendered by the backend, as a `data:` URI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotImage {
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionScores {
    pub r2_score: f64,
    pub rmse: f64,
    pub mae: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub linear_regression: RegressionScores,
    pub random_forest: RegressionScores,
    #[serde(default)]
    pub feature_importance: BTreeMap<String, f64>,
}

impl ModelMetrics {
    /// Features sorted by importance, most important first
    pub fn ranked_importance(&self) -> Vec<(&str, f64)> {
        rank(&self.feature_importance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub status: String,
    pub best_model: String,
    pub metrics: ModelMetrics,
    pub train_size: u64,
    pub test_size: u64,
    #[serde(default)]
    pub features_used: Vec<String>,
    #[serde(default)]
    pub improvement: f64,
}

impl TrainReport {
    pub fn succeeded(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_popularity: f64,
    #[serde(default)]
    pub model_used: String,
    #[serde(default)]
    pub feature_importance: Option<BTreeMap<String, f64>>,
}

impl Prediction {
    pub fn ranked_importance(&self) -> Vec<(&str, f64)> {
        self.feature_importance.as_ref().map(rank).unwrap_or_default()
    }
}

fn rank(importance: &BTreeMap<String, f64>) -> Vec<(&str, f64)> {
    let mut ranked: Vec<_> = importance.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
