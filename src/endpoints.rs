//! Backend endpoint registry
//!
//! One row per logical operation. Adding an endpoint means adding a variant
//! and a row, nothing else.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Latency class of an endpoint; resolved to a duration by the config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutClass {
    /// Startup reachability check
    Health,
    /// Read-only analysis queries
    Read,
    /// Single prediction or metrics lookup
    Inference,
    /// Server-side model training
    Training,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endpoint {
    Health,
    DatasetInfo,
    Distributions,
    Correlations,
    Genres,
    ScatterPlot,
    Histogram,
    Heatmap,
    TrainModel,
    ModelMetrics,
    Predict,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Route {
    pub endpoint: Endpoint,
    pub key: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub timeout: TimeoutClass,
}

/// Rows are in `Endpoint` declaration order
#[rustfmt::skip]
pub const ROUTES: [Route; 11] = [
    Route { endpoint: Endpoint::Health, key: "health", method: Method::Get, path: "/health", timeout: TimeoutClass::Health },
    Route { endpoint: Endpoint::DatasetInfo, key: "dataset-info", method: Method::Get, path: "/data/info", timeout: TimeoutClass::Read },
    Route { endpoint: Endpoint::Distributions, key: "distributions", method: Method::Get, path: "/analysis/distributions", timeout: TimeoutClass::Read },
    Route { endpoint: Endpoint::Correlations, key: "correlations", method: Method::Get, path: "/analysis/correlations", timeout: TimeoutClass::Read },
    Route { endpoint: Endpoint::Genres, key: "genres", method: Method::Get, path: "/analysis/genres", timeout: TimeoutClass::Read },
    Route { endpoint: Endpoint::ScatterPlot, key: "scatter-plot", method: Method::Get, path: "/plots/scatter", timeout: TimeoutClass::Read },
    Route { endpoint: Endpoint::Histogram, key: "histogram", method: Method::Get, path: "/plots/histogram", timeout: TimeoutClass::Read },
    Route { endpoint: Endpoint::Heatmap, key: "heatmap", method: Method::Get, path: "/plots/heatmap", timeout: TimeoutClass::Read },
    Route { endpoint: Endpoint::TrainModel, key: "train-model", method: Method::Post, path: "/model/train", timeout: TimeoutClass::Training },
    Route { endpoint: Endpoint::ModelMetrics, key: "model-metrics", method: Method::Get, path: "/model/metrics", timeout: TimeoutClass::Inference },
    Route { endpoint: Endpoint::Predict, key: "predict", method: Method::Post, path: "/model/predict", timeout: TimeoutClass::Inference },
];

impl Endpoint {
    pub fn route(self) -> &'static Route {
        &ROUTES[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.route().key
    }

    pub fn path(self) -> &'static str {
        self.route().path
    }

    pub fn method(self) -> Method {
        self.route().method
    }

    pub fn timeout_class(self) -> TimeoutClass {
        self.route().timeout
    }

    /// Look up an endpoint by its registry key (e.g. "dataset-info")
    pub fn from_key(key: &str) -> Option<Endpoint> {
        ROUTES.iter().find(|r| r.key == key).map(|r| r.endpoint)
    }

    pub fn all() -> impl Iterator<Item = Endpoint> {
        ROUTES.iter().map(|r| r.endpoint)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_match_declaration_order() {
        for (i, route) in ROUTES.iter().enumerate() {
            assert_eq!(route.endpoint as usize, i, "row {} is out of order", route.key);
        }
    }

    #[test]
    fn test_keys_are_unique() {
        let mut keys: Vec<_> = ROUTES.iter().map(|r| r.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), ROUTES.len());
    }

    #[test]
    fn test_from_key_roundtrip() {
        for endpoint in Endpoint::all() {
            assert_eq!(Endpoint::from_key(endpoint.key()), Some(endpoint));
        }
        assert_eq!(Endpoint::from_key("nope"), None);
    }

    #[test]
    fn test_registry_paths() {
        assert_eq!(Endpoint::DatasetInfo.path(), "/data/info");
        assert_eq!(Endpoint::ScatterPlot.path(), "/plots/scatter");
        assert_eq!(Endpoint::Predict.path(), "/model/predict");
        assert_eq!(Endpoint::Health.path(), "/health");
    }

    #[test]
    fn test_only_training_and_predict_are_posts() {
        let posts: Vec<_> = Endpoint::all().filter(|e| e.method() == Method::Post).collect();
        assert_eq!(posts, vec![Endpoint::TrainModel, Endpoint::Predict]);
    }

    #[test]
    fn test_timeout_classes() {
        assert_eq!(Endpoint::TrainModel.timeout_class(), TimeoutClass::Training);
        assert_eq!(Endpoint::Predict.timeout_class(), TimeoutClass::Inference);
        assert_eq!(Endpoint::Health.timeout_class(), TimeoutClass::Health);
        assert_eq!(Endpoint::Genres.timeout_class(), TimeoutClass::Read);
    }
}
