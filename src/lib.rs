//! tunelens - dashboard for a track-popularity analytics backend
//!
//! Fetch dataset summaries, distributions, correlations, genre breakdowns and
//! plots from the backend, train its model and ask it for predictions.
//!
//! # Overview
//!
//! Every panel follows the same cycle: signal loading, make one HTTP call,
//! branch on the result, render the decoded payload as an HTML fragment.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `transport` | Blocking HTTP calls with a per-call timeout |
//! | `endpoints` | Logical operation → method, path, timeout class |
//! | `error` | Failure → user-facing message |
//! | `features` | The ten model inputs and their ranges |
//! | `normalize` | Prediction form clamping and duration sync |
//! | `payload` | Typed backend responses |
//! | `panels` | Panel controllers |
//! | `render` | HTML fragments |
//! | `serve` | Local dashboard server |
//!
//! # Quick Start
//!
//! ```no_run
//! use tunelens::{Capture, Config, Dashboard, HttpTransport, Panel};
//!
//! let config = Config::load().unwrap();
//! let transport = HttpTransport::new(config.api.base_url.clone()).unwrap();
//! let dashboard = Dashboard::new(transport, config.api, config.ui);
//!
//! let mut capture = Capture::default();
//! if dashboard.dataset_info(&mut capture).is_ok() {
//!     println!("{}", capture.last(Panel::DatasetInfo).unwrap_or_default());
//! }
//! ```

pub mod band;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod features;
pub mod normalize;
pub mod panels;
pub mod payload;
pub mod render;
pub mod serve;
pub mod transport;

pub use band::{classify, Band, BandInfo, BANDS};
pub use config::Config;
pub use endpoints::{Endpoint, Method, TimeoutClass, ROUTES};
pub use error::{ApiError, ApiResult, Failure};
pub use features::{FeatureSpec, FeatureVector, FEATURES};
pub use normalize::{FormError, FormState, TrackLength, Warning};
pub use panels::{Banner, Capture, Dashboard, Panel, PanelSink};
pub use transport::{HttpTransport, Transport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        assert_eq!(FEATURES.len(), 10);
        assert_eq!(ROUTES.len(), 11);
        assert_eq!(BANDS.len(), 5);
    }
}
