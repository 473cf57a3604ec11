//! HTTP server for the dashboard page
//!
//! `tunelens serve` → starts server, serves the page, runs panel controllers
//! on behalf of the browser

use crate::endpoints::Endpoint;
use crate::features::{FeatureSpec, FEATURES};
use crate::normalize::{FormState, Warning};
use crate::panels::{Banner, Capture, Dashboard, Panel};
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn failure(data: Option<T>, error: String) -> Self {
        Self {
            ok: false,
            data,
            error: Some(error),
        }
    }
}

/// Rendered content for one page region
#[derive(Debug, Serialize)]
struct Fragment {
    region: &'static str,
    html: String,
}

#[derive(Serialize)]
struct FormInit {
    form: FormState,
    features: &'static [FeatureSpec],
    warning_ttl_ms: u64,
}

#[derive(Deserialize)]
struct FormEdit {
    form: FormState,
    field: String,
    value: String,
}

#[derive(Serialize)]
struct FormEdited {
    form: FormState,
    warning: Option<Warning>,
    warning_ttl_ms: u64,
}

#[derive(Serialize)]
struct HealthStatus {
    banner: Option<Banner>,
}

// Page shell; panels are filled through the /api routes
const DASHBOARD_HTML: &str = include_str!("dashboard.html");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Page,
    Panel(Endpoint),
    Train,
    FormDefaults,
    FormEdit,
    Predict,
    Health,
    NotFound,
}

fn route(method: &Method, path: &str) -> Route {
    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Route::Page,
        (&Method::Get, "/api/form") => Route::FormDefaults,
        (&Method::Get, "/api/health") => Route::Health,
        (&Method::Post, "/api/train") => Route::Train,
        (&Method::Post, "/api/form/edit") => Route::FormEdit,
        (&Method::Post, "/api/predict") => Route::Predict,
        (&Method::Get, p) => p
            .strip_prefix("/api/panel/")
            .and_then(Endpoint::from_key)
            .filter(|e| Panel::for_endpoint(*e).is_some())
            .map(Route::Panel)
            .unwrap_or(Route::NotFound),
        _ => Route::NotFound,
    }
}

/// Start the dashboard server. Each request runs on its own thread so a
/// long training call does not hold up the other panels.
pub fn start_dashboard_server<T: Transport + 'static>(
    port: u16,
    dashboard: Dashboard<T>,
) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", port);

    eprintln!("\n\x1b[1;32m♫ tunelens\x1b[0m");
    eprintln!("   Dashboard: {}", url);
    eprintln!("   Press Ctrl+C to stop\n");

    if let Some(banner) = dashboard.health_check() {
        eprintln!("\x1b[33m⚠ {}\x1b[0m\n", banner.message);
    }

    let dashboard = Arc::new(dashboard);
    for request in server.incoming_requests() {
        let dashboard = Arc::clone(&dashboard);
        std::thread::spawn(move || {
            if let Err(e) = handle_request(request, &dashboard) {
                log::error!("request failed: {}", e);
            }
        });
    }

    Ok(())
}

type Body = Response<std::io::Cursor<Vec<u8>>>;

fn with_content_type(response: Body, value: &str) -> Body {
    match Header::from_bytes(&b"Content-Type"[..], value.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

fn respond_json<S: Serialize>(request: Request, status: u16, body: &S) -> std::io::Result<()> {
    let json = serde_json::to_string(body)?;
    let response = with_content_type(
        Response::from_string(json).with_status_code(status),
        "application/json",
    );
    request.respond(response)
}

fn read_json<D: for<'de> Deserialize<'de>>(request: &mut Request) -> Result<D, String> {
    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .map_err(|e| format!("Failed to read body: {}", e))?;
    serde_json::from_str(&body).map_err(|e| format!("Invalid JSON: {}", e))
}

fn respond_fragment(
    request: Request,
    panel: Panel,
    result: crate::error::ApiResult<()>,
    capture: Capture,
) -> std::io::Result<()> {
    let fragment = capture.last(panel).map(|html| Fragment {
        region: panel.region(),
        html: html.to_string(),
    });
    match result {
        Ok(()) => respond_json(request, 200, &ApiResponse::success(fragment)),
        Err(e) => respond_json(request, 200, &ApiResponse::failure(Some(fragment), e.to_string())),
    }
}

fn handle_request<T: Transport>(
    mut request: Request,
    dashboard: &Dashboard<T>,
) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let method = request.method().clone();
    log::debug!("{} {}", method, path);

    match route(&method, path) {
        Route::Page => {
            let response = with_content_type(
                Response::from_string(DASHBOARD_HTML),
                "text/html; charset=utf-8",
            );
            request.respond(response)
        }

        Route::Panel(endpoint) => {
            let mut capture = Capture::default();
            let result = dashboard.load(endpoint, &mut capture);
            let panel = Panel::for_endpoint(endpoint).unwrap_or(Panel::Model);
            respond_fragment(request, panel, result, capture)
        }

        Route::Train => {
            let mut capture = Capture::default();
            let result = dashboard.train_model(&mut capture);
            respond_fragment(request, Panel::Model, result, capture)
        }

        Route::FormDefaults => {
            let init = FormInit {
                form: FormState::defaults(),
                features: &FEATURES,
                warning_ttl_ms: dashboard.ui().warning_ms,
            };
            respond_json(request, 200, &ApiResponse::success(init))
        }

        Route::FormEdit => {
            let edit: FormEdit = match read_json(&mut request) {
                Ok(edit) => edit,
                Err(e) => return respond_json(request, 400, &ApiResponse::<()>::failure(None, e)),
            };
            let mut form = edit.form;
            match form.edit(&edit.field, &edit.value) {
                Ok(warning) => {
                    let edited = FormEdited {
                        form,
                        warning,
                        warning_ttl_ms: dashboard.ui().warning_ms,
                    };
                    respond_json(request, 200, &ApiResponse::success(edited))
                }
                Err(e) => {
                    let failure = ApiResponse::<()>::failure(None, e.to_string());
                    respond_json(request, 400, &failure)
                }
            }
        }

        Route::Predict => {
            let form: FormState = match read_json(&mut request) {
                Ok(form) => form,
                Err(e) => return respond_json(request, 400, &ApiResponse::<()>::failure(None, e)),
            };
            let mut capture = Capture::default();
            let result = dashboard.predict(&form, &mut capture);
            respond_fragment(request, Panel::Prediction, result, capture)
        }

        Route::Health => {
            let status = HealthStatus {
                banner: dashboard.health_check(),
            };
            respond_json(request, 200, &ApiResponse::success(status))
        }

        Route::NotFound => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === ApiResponse Tests ===

    #[test]
    fn test_api_response_success() {
        let response: ApiResponse<String> = ApiResponse::success("hello".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("hello".to_string()));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_api_response_failure_keeps_fragment() {
        let fragment = Fragment {
            region: "genres-result",
            html: "<div class=\"result error\"></div>".to_string(),
        };
        let response = ApiResponse::failure(Some(fragment), "Bad Gateway".to_string());
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("\"ok\":false"));
        assert!(json.contains("\"region\":\"genres-result\""));
        assert!(json.contains("\"error\":\"Bad Gateway\""));
    }

    #[test]
    fn test_form_init_serializes_schema() {
        let init = FormInit {
            form: FormState::defaults(),
            features: &FEATURES,
            warning_ttl_ms: 2000,
        };
        let json = serde_json::to_value(ApiResponse::success(init)).unwrap();
        assert_eq!(json["data"]["features"].as_array().unwrap().len(), 10);
        assert_eq!(json["data"]["features"][2]["name"], "loudness");
        assert_eq!(json["data"]["form"]["minutes"], 3);
    }

    // === Routing Tests ===

    #[test]
    fn test_routes() {
        assert_eq!(route(&Method::Get, "/"), Route::Page);
        assert_eq!(
            route(&Method::Get, "/api/panel/dataset-info"),
            Route::Panel(Endpoint::DatasetInfo)
        );
        assert_eq!(route(&Method::Get, "/api/panel/heatmap"), Route::Panel(Endpoint::Heatmap));
        assert_eq!(
            route(&Method::Get, "/api/panel/model-metrics"),
            Route::Panel(Endpoint::ModelMetrics)
        );
        assert_eq!(route(&Method::Post, "/api/train"), Route::Train);
        assert_eq!(route(&Method::Post, "/api/form/edit"), Route::FormEdit);
        assert_eq!(route(&Method::Post, "/api/predict"), Route::Predict);
        assert_eq!(route(&Method::Get, "/api/health"), Route::Health);
    }

    #[test]
    fn test_non_panel_endpoints_not_routed() {
        assert_eq!(route(&Method::Get, "/api/panel/predict"), Route::NotFound);
        assert_eq!(route(&Method::Get, "/api/panel/train-model"), Route::NotFound);
        assert_eq!(route(&Method::Get, "/api/panel/health"), Route::NotFound);
        assert_eq!(route(&Method::Get, "/api/panel/unknown"), Route::NotFound);
        assert_eq!(route(&Method::Get, "/api/train"), Route::NotFound);
    }

    // === Page Tests ===

    #[test]
    fn test_page_is_valid_html() {
        assert!(DASHBOARD_HTML.contains("<!DOCTYPE html>"));
        assert!(DASHBOARD_HTML.contains("</html>"));
    }

    #[test]
    fn test_page_has_every_panel_region() {
        for panel in [
            Panel::DatasetInfo,
            Panel::Distributions,
            Panel::Correlations,
            Panel::Genres,
            Panel::ScatterPlot,
            Panel::Histogram,
            Panel::Heatmap,
            Panel::Model,
            Panel::Prediction,
        ] {
            let id = format!("id=\"{}\"", panel.region());
            assert!(DASHBOARD_HTML.contains(&id), "page is missing region {}", panel.region());
        }
    }
}
