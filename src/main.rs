use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use std::io;
use std::path::{Path, PathBuf};
use tunelens::panels::PanelSink;
use tunelens::{
    ApiResult, Capture, Config, Dashboard, Endpoint, FormState, HttpTransport, Panel, ROUTES,
};

#[derive(Parser, Debug)]
#[command(name = "tunelens")]
#[command(author, version, about = "Dashboard for a track-popularity analytics backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Backend URL (overrides .tunelens/config.toml and TUNELENS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the dashboard web UI
    Serve {
        /// Port to listen on (default from config: 3030)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Load one analysis panel and print its HTML
    Panel {
        /// dataset-info, distributions, correlations, genres,
        /// scatter-plot, histogram, heatmap or model-metrics
        key: String,

        /// Write the fragment to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Train the model on the backend (can take minutes)
    Train {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show metrics of the trained model
    Metrics {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Predict popularity for a track
    Predict {
        /// Feature value, e.g. --set energy=0.8 (repeatable)
        #[arg(short, long = "set", value_name = "FEATURE=VALUE")]
        set: Vec<String>,

        /// Track length, minutes part
        #[arg(long)]
        minutes: Option<String>,

        /// Track length, seconds part
        #[arg(long)]
        seconds: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that the backend is up and has its dataset
    Health,

    /// List the backend endpoints in use
    Endpoints,

    /// Save all read-only panels as one HTML report
    Report {
        /// Report file (default: tunelens-report-<timestamp>.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completion {
        shell: Shell,
    },
}

/// Prints loading state to stderr and keeps the last fragment
struct TerminalSink {
    capture: Capture,
}

impl TerminalSink {
    fn new() -> Self {
        Self {
            capture: Capture::default(),
        }
    }
}

impl PanelSink for TerminalSink {
    fn loading(&mut self, panel: Panel, active: bool) {
        if active {
            eprintln!("{}", format!("Loading {}...", panel.title().to_lowercase()).dimmed());
        }
        self.capture.loading(panel, active);
    }

    fn show(&mut self, panel: Panel, html: String) {
        self.capture.show(panel, html);
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            std::process::exit(1);
        }
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    match cli.command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "tunelens", &mut io::stdout());
        }

        Command::Endpoints => print_endpoints(&config),

        Command::Serve { port } => {
            let port = port.unwrap_or(config.serve.port);
            let dashboard = build_dashboard(&config);
            if let Err(e) = tunelens::serve::start_dashboard_server(port, dashboard) {
                eprintln!("Server error: {}", e);
                std::process::exit(1);
            }
        }

        Command::Panel { key, output } => {
            let panel_endpoint =
                Endpoint::from_key(&key).filter(|e| Panel::for_endpoint(*e).is_some());
            let endpoint = match panel_endpoint {
                Some(endpoint) => endpoint,
                None => {
                    eprintln!("{} unknown panel '{}'", "Error:".red(), key);
                    let keys: Vec<_> = Endpoint::all()
                        .filter(|e| Panel::for_endpoint(*e).is_some())
                        .map(|e| e.key())
                        .collect();
                    eprintln!("Available panels: {}", keys.join(", "));
                    std::process::exit(2);
                }
            };
            let dashboard = build_dashboard(&config);
            let mut sink = TerminalSink::new();
            let result = dashboard.load(endpoint, &mut sink);
            let panel = Panel::for_endpoint(endpoint).unwrap_or(Panel::Model);
            finish(result, &sink, panel, output.as_deref());
        }

        Command::Train { output } => {
            eprintln!("{}", "Training can take 1-2 minutes...".yellow());
            let dashboard = build_dashboard(&config);
            let mut sink = TerminalSink::new();
            let result = dashboard.train_model(&mut sink);
            finish(result, &sink, Panel::Model, output.as_deref());
        }

        Command::Metrics { output } => {
            let dashboard = build_dashboard(&config);
            let mut sink = TerminalSink::new();
            let result = dashboard.model_metrics(&mut sink);
            finish(result, &sink, Panel::Model, output.as_deref());
        }

        Command::Predict {
            set,
            minutes,
            seconds,
            output,
        } => {
            let form = match build_form(&set, minutes.as_deref(), seconds.as_deref()) {
                Ok(form) => form,
                Err(e) => {
                    eprintln!("{} {}", "Error:".red(), e);
                    std::process::exit(2);
                }
            };
            let dashboard = build_dashboard(&config);
            let mut sink = TerminalSink::new();
            let result = dashboard.predict(&form, &mut sink);
            finish(result, &sink, Panel::Prediction, output.as_deref());
        }

        Command::Health => {
            let dashboard = build_dashboard(&config);
            match dashboard.health_check() {
                None => println!("{} Backend is healthy, dataset loaded", "✓".green()),
                Some(banner) => {
                    eprintln!("{} {}", "⚠".yellow(), banner.message);
                    std::process::exit(1);
                }
            }
        }

        Command::Report { output } => {
            let dashboard = build_dashboard(&config);
            let path = output.unwrap_or_else(|| {
                let timestamp = Local::now().format("%Y%m%d_%H%M%S");
                PathBuf::from(format!("tunelens-report-{}.html", timestamp))
            });
            if let Err(e) = write_report(&dashboard, &path) {
                eprintln!("Failed to write report: {}", e);
                std::process::exit(1);
            }
            eprintln!("{}", format!("Report saved: {}", path.display()).green());
        }
    }
}

fn build_dashboard(config: &Config) -> Dashboard<HttpTransport> {
    let transport = match HttpTransport::new(config.api.base_url.clone()) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("{} failed to create HTTP client: {}", "Error:".red(), e);
            std::process::exit(1);
        }
    };
    log::debug!("backend: {}", transport.base_url());
    Dashboard::new(transport, config.api.clone(), config.ui.clone())
}

/// Apply `--set` pairs and the duration flags to the default form
fn build_form(
    set: &[String],
    minutes: Option<&str>,
    seconds: Option<&str>,
) -> Result<FormState, String> {
    let mut form = FormState::defaults();
    let mut warnings = Vec::new();

    for pair in set {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected FEATURE=VALUE, got '{}'", pair))?;
        let warning = form
            .edit(name.trim(), value.trim())
            .map_err(|e| e.to_string())?;
        warnings.extend(warning);
    }

    if minutes.is_some() || seconds.is_some() {
        warnings.extend(form.edit_length(minutes, seconds));
    }

    for warning in warnings {
        eprintln!("{} {}: {}", "⚠".yellow(), warning.field, warning.message);
    }
    Ok(form)
}

/// Print or save the panel's final fragment; exit non-zero on failure
fn finish(result: ApiResult<()>, sink: &TerminalSink, panel: Panel, output: Option<&Path>) {
    let html = sink.capture.last(panel).unwrap_or_default();

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, html) {
                eprintln!("Failed to write {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
        None => {
            if result.is_ok() {
                println!("{}", html);
            }
        }
    }

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn print_endpoints(config: &Config) {
    println!("Backend: {}\n", config.api.base_url);
    println!("KEY             METHOD PATH                      TIMEOUT");
    for route in ROUTES.iter() {
        println!(
            "{:<15} {:<6} {:<25} {}s",
            route.key,
            route.method.to_string(),
            route.path,
            config.api.timeout(route.timeout).as_secs()
        );
    }
}

fn write_report(dashboard: &Dashboard<HttpTransport>, path: &Path) -> io::Result<()> {
    let panels = [
        Endpoint::DatasetInfo,
        Endpoint::Distributions,
        Endpoint::Correlations,
        Endpoint::Genres,
        Endpoint::ScatterPlot,
        Endpoint::Histogram,
        Endpoint::Heatmap,
    ];

    let mut sections = Vec::new();
    let mut sink = TerminalSink::new();
    for endpoint in panels {
        let Some(panel) = Panel::for_endpoint(endpoint) else {
            continue;
        };
        if let Err(e) = dashboard.load(endpoint, &mut sink) {
            eprintln!("{} {}: {}", "⚠".yellow(), panel.title(), e);
        }
        let html = sink.capture.last(panel).unwrap_or_default().to_string();
        sections.push((panel.title().to_string(), html));
    }

    let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let page = tunelens::render::report_page("tunelens report", &generated, &sections);
    std::fs::write(path, page)
}
