//! Panel controllers
//!
//! Each panel runs the same cycle: signal loading, make one backend call,
//! clear loading, then render either the error or the decoded payload into
//! the panel's region.

use crate::config::{ApiConfig, UiConfig};
use crate::endpoints::Endpoint;
use crate::error::{ApiError, ApiResult};
use crate::normalize::FormState;
use crate::payload::{
    self, Correlations, DatasetInfo, Distributions, Genres, Health, ModelMetrics, PlotImage,
    Prediction, TrainReport,
};
use crate::render;
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// Page regions, one per panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Panel {
    DatasetInfo,
    Distributions,
    Correlations,
    Genres,
    ScatterPlot,
    Histogram,
    Heatmap,
    Model,
    Prediction,
}

impl Panel {
    /// Element id of the region this panel writes
    pub fn region(self) -> &'static str {
        match self {
            Panel::DatasetInfo => "data-info",
            Panel::Distributions => "distributions-result",
            Panel::Correlations => "correlations-result",
            Panel::Genres => "genres-result",
            Panel::ScatterPlot => "scatter-plot",
            Panel::Histogram => "histogram-plot",
            Panel::Heatmap => "heatmap-plot",
            Panel::Model => "model-result",
            Panel::Prediction => "predict-result",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Panel::DatasetInfo => "Dataset",
            Panel::Distributions => "Distributions",
            Panel::Correlations => "Correlations",
            Panel::Genres => "Genres",
            Panel::ScatterPlot => "Scatter plot: tempo vs popularity",
            Panel::Histogram => "Histogram: loudness distribution",
            Panel::Heatmap => "Heatmap: correlation matrix",
            Panel::Model => "Model",
            Panel::Prediction => "Prediction",
        }
    }

    /// Panels filled by a single read-only GET
    pub fn for_endpoint(endpoint: Endpoint) -> Option<Panel> {
        match endpoint {
            Endpoint::DatasetInfo => Some(Panel::DatasetInfo),
            Endpoint::Distributions => Some(Panel::Distributions),
            Endpoint::Correlations => Some(Panel::Correlations),
            Endpoint::Genres => Some(Panel::Genres),
            Endpoint::ScatterPlot => Some(Panel::ScatterPlot),
            Endpoint::Histogram => Some(Panel::Histogram),
            Endpoint::Heatmap => Some(Panel::Heatmap),
            Endpoint::ModelMetrics => Some(Panel::Model),
            _ => None,
        }
    }
}

/// Where a controller writes. Each panel owns its own region.
pub trait PanelSink {
    fn loading(&mut self, panel: Panel, active: bool);

    /// Replace the panel's content
    fn show(&mut self, panel: Panel, html: String);
}

/// Sink that keeps the last fragment written to each panel
#[derive(Debug, Default)]
pub struct Capture {
    pub shown: Vec<(Panel, String)>,
    pub loading_events: Vec<(Panel, bool)>,
}

impl Capture {
    pub fn last(&self, panel: Panel) -> Option<&str> {
        self.shown
            .iter()
            .rev()
            .find(|(p, _)| *p == panel)
            .map(|(_, html)| html.as_str())
    }
}

impl PanelSink for Capture {
    fn loading(&mut self, panel: Panel, active: bool) {
        self.loading_events.push((panel, active));
    }

    fn show(&mut self, panel: Panel, html: String) {
        self.shown.push((panel, html));
    }
}

/// Non-blocking notice shown after the startup health check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Banner {
    pub message: String,
    pub ttl_ms: u64,
}

/// Single-slot guard per endpoint
#[derive(Debug, Default)]
pub struct InFlight {
    slots: Mutex<HashSet<Endpoint>>,
}

pub struct Slot<'a> {
    owner: &'a InFlight,
    endpoint: Endpoint,
}

impl InFlight {
    /// Claim the slot for `endpoint`, or `None` if a call is outstanding
    pub fn acquire(&self, endpoint: Endpoint) -> Option<Slot<'_>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if slots.insert(endpoint) {
            Some(Slot {
                owner: self,
                endpoint,
            })
        } else {
            None
        }
    }

    pub fn is_busy(&self, endpoint: Endpoint) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&endpoint)
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        let mut slots = self.owner.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.remove(&self.endpoint);
    }
}

/// The set of panel controllers, sharing one transport
pub struct Dashboard<T> {
    transport: T,
    api: ApiConfig,
    ui: UiConfig,
    in_flight: InFlight,
}

impl<T: Transport> Dashboard<T> {
    pub fn new(transport: T, api: ApiConfig, ui: UiConfig) -> Self {
        Self {
            transport,
            api,
            ui,
            in_flight: InFlight::default(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn ui(&self) -> &UiConfig {
        &self.ui
    }

    pub fn timeout(&self, endpoint: Endpoint) -> Duration {
        self.api.timeout(endpoint.timeout_class())
    }

    /// One guarded round trip to `endpoint`
    fn call(
        &self,
        endpoint: Endpoint,
        body: Option<&serde_json::Value>,
    ) -> ApiResult<serde_json::Value> {
        let _slot = self
            .in_flight
            .acquire(endpoint)
            .ok_or(ApiError::Busy(endpoint.key()))?;
        self.transport
            .call(endpoint.method(), endpoint.path(), body, self.timeout(endpoint))
    }

    fn fetch<P: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: Option<&serde_json::Value>,
    ) -> ApiResult<P> {
        self.call(endpoint, body).and_then(payload::decode)
    }

    /// Loading, call, decode, render. Errors are shown in the panel and
    /// returned to the caller.
    fn run<P, F>(
        &self,
        panel: Panel,
        endpoint: Endpoint,
        body: Option<&serde_json::Value>,
        sink: &mut dyn PanelSink,
        view: F,
    ) -> ApiResult<()>
    where
        P: DeserializeOwned,
        F: FnOnce(&P) -> ApiResult<String>,
    {
        sink.loading(panel, true);
        let result = self.fetch::<P>(endpoint, body);
        sink.loading(panel, false);

        self.finish(panel, sink, result.and_then(|payload| view(&payload)))
    }

    pub fn dataset_info(&self, sink: &mut dyn PanelSink) -> ApiResult<()> {
        self.run::<DatasetInfo, _>(
            Panel::DatasetInfo,
            Endpoint::DatasetInfo,
            None,
            sink,
            |p: &DatasetInfo| Ok(render::dataset_info(p)),
        )
    }

    pub fn distributions(&self, sink: &mut dyn PanelSink) -> ApiResult<()> {
        self.run::<Distributions, _>(
            Panel::Distributions,
            Endpoint::Distributions,
            None,
            sink,
            |p: &Distributions| Ok(render::distributions(p)),
        )
    }

    pub fn correlations(&self, sink: &mut dyn PanelSink) -> ApiResult<()> {
        self.run::<Correlations, _>(
            Panel::Correlations,
            Endpoint::Correlations,
            None,
            sink,
            |p: &Correlations| Ok(render::correlations(p)),
        )
    }

    pub fn genres(&self, sink: &mut dyn PanelSink) -> ApiResult<()> {
        self.run::<Genres, _>(Panel::Genres, Endpoint::Genres, None, sink, |p: &Genres| {
            Ok(render::genres(p))
        })
    }

    pub fn plot(&self, endpoint: Endpoint, sink: &mut dyn PanelSink) -> ApiResult<()> {
        let panel = match endpoint {
            Endpoint::ScatterPlot | Endpoint::Histogram | Endpoint::Heatmap => {
                Panel::for_endpoint(endpoint)
            }
            _ => None,
        }
        .ok_or_else(|| ApiError::Invalid(format!("{} is not a plot", endpoint)))?;

        self.run::<PlotImage, _>(panel, endpoint, None, sink, |p: &PlotImage| {
            Ok(render::plot(p, panel.title()))
        })
    }

    pub fn train_model(&self, sink: &mut dyn PanelSink) -> ApiResult<()> {
        sink.show(Panel::Model, render::training_progress());
        self.run::<TrainReport, _>(
            Panel::Model,
            Endpoint::TrainModel,
            None,
            sink,
            |report: &TrainReport| {
                if report.succeeded() {
                    Ok(render::train_report(report))
                } else {
                    Err(ApiError::Invalid("Model training failed".to_string()))
                }
            },
        )
    }

    pub fn model_metrics(&self, sink: &mut dyn PanelSink) -> ApiResult<()> {
        sink.loading(Panel::Model, true);
        let result = self
            .fetch::<ModelMetrics>(Endpoint::ModelMetrics, None)
            .map_err(not_trained_on_404);
        sink.loading(Panel::Model, false);
        self.finish(Panel::Model, sink, result.map(|m| render::model_metrics(&m)))
    }

    /// Validate the form, send it, classify the score
    pub fn predict(&self, form: &FormState, sink: &mut dyn PanelSink) -> ApiResult<()> {
        let vector = match form.to_vector() {
            Ok(vector) => vector,
            Err(e) => {
                let invalid = Err(ApiError::Invalid(e.to_string()));
                return self.finish(Panel::Prediction, sink, invalid);
            }
        };
        log::debug!("predict payload: {:?}", vector);

        let body = vector.to_json();
        sink.loading(Panel::Prediction, true);
        let result = self
            .fetch::<Prediction>(Endpoint::Predict, Some(&body))
            .map_err(not_trained_on_404);
        sink.loading(Panel::Prediction, false);
        self.finish(Panel::Prediction, sink, result.map(|p| render::prediction(&p)))
    }

    /// Run the read-only panel backed by `endpoint`
    pub fn load(&self, endpoint: Endpoint, sink: &mut dyn PanelSink) -> ApiResult<()> {
        match endpoint {
            Endpoint::DatasetInfo => self.dataset_info(sink),
            Endpoint::Distributions => self.distributions(sink),
            Endpoint::Correlations => self.correlations(sink),
            Endpoint::Genres => self.genres(sink),
            Endpoint::ScatterPlot | Endpoint::Histogram | Endpoint::Heatmap => {
                self.plot(endpoint, sink)
            }
            Endpoint::ModelMetrics => self.model_metrics(sink),
            other => Err(ApiError::Invalid(format!("{} is not a panel", other))),
        }
    }

    /// Probe the backend once. Returns a banner when something is wrong.
    pub fn health_check(&self) -> Option<Banner> {
        let message = match self.fetch::<Health>(Endpoint::Health, None) {
            Ok(health) if !health.is_healthy() => {
                format!("Backend reports status '{}'. Some panels may not work.", health.status)
            }
            Ok(health) if !health.dataset_loaded => {
                concat!(
                    "Dataset is not loaded. ",
                    "Make sure SpotifyFeatures.csv is in the backend's data/ directory."
                )
                .to_string()
            }
            Ok(_) => return None,
            Err(ApiError::Unreachable) => ApiError::Unreachable.to_string(),
            Err(e) => {
                log::warn!("health check failed: {}", e);
                format!("Health check failed: {}", e)
            }
        };

        Some(Banner {
            message,
            ttl_ms: self.ui.banner_ms,
        })
    }

    fn finish(
        &self,
        panel: Panel,
        sink: &mut dyn PanelSink,
        result: ApiResult<String>,
    ) -> ApiResult<()> {
        match result {
            Ok(html) => {
                sink.show(panel, html);
                Ok(())
            }
            Err(e) => {
                sink.show(panel, render::error(&e.to_string()));
                Err(e)
            }
        }
    }
}

fn not_trained_on_404(e: ApiError) -> ApiError {
    if e.is_not_found() {
        ApiError::NotTrained
    } else {
        e
    }
}
