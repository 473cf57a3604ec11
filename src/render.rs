//! HTML fragments for each panel
//!
//! Pure functions from a decoded payload to markup. Numbers are formatted,
//! never recomputed.

use crate::band::{self, DISCLAIMER};
use crate::features::label_for;
use crate::payload::{
    ColumnStats, Correlations, DatasetInfo, Distributions, Genres, ModelMetrics, PlotImage,
    Prediction, RegressionScores, TrainReport,
};

/// Escape text for HTML content and attribute values
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn format_number(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

fn format_opt(value: Option<f64>) -> String {
    value.map(|v| format_number(v, 2)).unwrap_or_else(|| "–".to_string())
}

/// 232725 -> "232,725"
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn stat_card(title: &str, stats: &[(&str, String)]) -> String {
    let mut html = format!("<div class=\"stat-card\"><h3>{}</h3>", escape(title));
    for (label, value) in stats {
        html.push_str(&format!(
            "<div class=\"stat-item\"><span class=\"stat-label\">{}:</span> \
             <span class=\"stat-value\">{}</span></div>",
            escape(label),
            escape(value)
        ));
    }
    html.push_str("</div>");
    html
}

fn info_box(inner_html: &str) -> String {
    format!("<div class=\"info-box\"><p>{}</p></div>", inner_html)
}

fn metric_card(title: &str, value: &str, subtitle: &str) -> String {
    let mut html = format!(
        "<div class=\"metric-card\"><h3>{}</h3><div class=\"metric-value\">{}</div>",
        escape(title),
        escape(value)
    );
    if !subtitle.is_empty() {
        html.push_str(&format!("<div class=\"metric-label\">{}</div>", escape(subtitle)));
    }
    html.push_str("</div>");
    html
}

pub fn error(message: &str) -> String {
    format!(
        "<div class=\"result error\"><h3>Error</h3><p>{}</p></div>",
        escape(message)
    )
}

pub fn dataset_info(info: &DatasetInfo) -> String {
    let mut html = String::from("<div class=\"result\">");
    html.push_str(&format!(
        "<h3>Dataset size: {} rows × {} columns</h3>",
        format_count(info.rows),
        info.columns
    ));

    let features: Vec<String> = info.features.iter().map(|f| escape(f)).collect();
    html.push_str(&info_box(&format!(
        "<strong>Features:</strong> {}",
        features.join(", ")
    )));

    let missing: Vec<_> = info.columns_with_missing().collect();
    if !missing.is_empty() {
        html.push_str("<h4>Missing values:</h4><div class=\"stats-grid\">");
        for (column, count) in missing {
            let percent = if info.rows > 0 {
                count as f64 / info.rows as f64 * 100.0
            } else {
                0.0
            };
            html.push_str(&stat_card(
                column,
                &[
                    ("Missing", count.to_string()),
                    ("Percent", format!("{}%", format_number(percent, 2))),
                ],
            ));
        }
        html.push_str("</div>");
    }

    html.push_str("</div>");
    html
}

fn column_stats(stats: &ColumnStats) -> Vec<(&'static str, String)> {
    vec![
        ("Mean", format_opt(stats.mean)),
        ("Median", format_opt(stats.median)),
        ("Std. dev.", format_opt(stats.std)),
        ("Min", format_opt(stats.min)),
        ("Max", format_opt(stats.max)),
        ("25%", format_opt(stats.q25)),
        ("75%", format_opt(stats.q75)),
    ]
}

pub fn distributions(data: &Distributions) -> String {
    let mut html = String::from("<div class=\"result\"><div class=\"stats-grid\">");
    for (feature, stats) in &data.distributions {
        html.push_str(&stat_card(&capitalize(feature), &column_stats(stats)));
    }
    html.push_str("</div>");

    if !data.interpretation.is_empty() {
        html.push_str("<div class=\"interpretation\"><h3>Interpretation</h3>");
        for (feature, text) in &data.interpretation {
            html.push_str(&info_box(&format!(
                "<strong>{}:</strong> {}",
                escape(feature),
                escape(text)
            )));
        }
        html.push_str("</div>");
    }

    html.push_str("</div>");
    html
}

fn correlation_cards(values: &[(&String, &f64)]) -> String {
    let mut html = String::from("<div class=\"stats-grid\">");
    for (feature, value) in values {
        let class = if **value > 0.0 { "positive" } else { "negative" };
        html.push_str(&format!(
            "<div class=\"stat-card\"><h3>{}</h3><div class=\"metric-value {}\">{}</div>\
             <div class=\"stat-label\">Correlation</div></div>",
            escape(feature),
            class,
            format_number(**value, 4)
        ));
    }
    html.push_str("</div>");
    html
}

pub fn correlations(data: &Correlations) -> String {
    let mut positive: Vec<_> = data.top_positive.iter().collect();
    positive.sort_by(|a, b| b.1.total_cmp(a.1));
    let mut negative: Vec<_> = data.top_negative.iter().collect();
    negative.sort_by(|a, b| b.1.total_cmp(a.1));

    let mut html = String::from("<div class=\"result\">");
    html.push_str("<h3>Top positive correlations with popularity:</h3>");
    html.push_str(&correlation_cards(&positive));
    html.push_str("<h3>Top negative correlations:</h3>");
    html.push_str(&correlation_cards(&negative));
    if !data.interpretation.is_empty() {
        html.push_str(&info_box(&escape(&data.interpretation)));
    }
    html.push_str("</div>");
    html
}

/// Genres compared in the statistics grid
const GENRE_SAMPLE: usize = 5;

pub fn genres(data: &Genres) -> String {
    let mut html = String::from("<div class=\"result\">");
    html.push_str(&format!("<h3>Genres found: {}</h3>", data.genre_count));

    let names: Vec<String> = data.genres.iter().map(|g| escape(g)).collect();
    html.push_str(&info_box(&format!(
        "<strong>Genres:</strong> {}",
        names.join(", ")
    )));
    if !data.interpretation.is_empty() {
        html.push_str(&info_box(&escape(&data.interpretation)));
    }

    if let Some(stats) = &data.genre_statistics {
        let sample: Vec<&String> = stats
            .get("danceability")
            .map(|by_genre| by_genre.keys().take(GENRE_SAMPLE).collect())
            .unwrap_or_default();

        if !sample.is_empty() {
            html.push_str("<h3>Feature comparison</h3>");
            html.push_str("<p class=\"hint\">Mean audio characteristics per genre</p>");
            html.push_str("<div class=\"stats-grid\">");
            for genre in sample {
                let values: Vec<(&str, String)> = stats
                    .iter()
                    .filter_map(|(feature, by_genre)| {
                        by_genre
                            .get(genre)
                            .map(|v| (feature.as_str(), format_number(*v, 2)))
                    })
                    .collect();
                html.push_str(&stat_card(genre, &values));
            }
            html.push_str("</div>");
        }
    }

    html.push_str("</div>");
    html
}

pub fn plot(image: &PlotImage, alt: &str) -> String {
    format!(
        "<div class=\"plot-container\"><img src=\"{}\" alt=\"{}\"></div>",
        escape(&image.image),
        escape(alt)
    )
}

/// Shown while the backend trains; carries no real progress
pub fn training_progress() -> String {
    String::from(
        "<div class=\"result training\">\
<h3>Training the model...</h3>\
<p>This can take <strong>1-2 minutes</strong>.</p>\
<div class=\"progress\"><div class=\"progress-fill\"></div></div>\
<p class=\"hint\">Do not close this page.</p>\
</div>",
    )
}

fn scores_card(title: &str, scores: &RegressionScores) -> String {
    format!(
        "<div class=\"model-card\"><h3>{}</h3>{}{}{}</div>",
        escape(title),
        metric_card("R² Score", &format_number(scores.r2_score, 4), ""),
        metric_card("RMSE", &format_number(scores.rmse, 2), ""),
        metric_card("MAE", &format_number(scores.mae, 2), "")
    )
}

fn importance_bars(ranked: &[(&str, f64)], limit: usize) -> String {
    let max = ranked.first().map(|(_, v)| *v).unwrap_or(0.0);
    let mut html = String::from("<div class=\"importance\">");
    for (i, (feature, importance)) in ranked.iter().take(limit).enumerate() {
        let width = if max > 0.0 { importance / max * 100.0 } else { 0.0 };
        html.push_str(&format!(
            "<div class=\"feature-row\"><span class=\"rank\">{}.</span> \
<span class=\"feature-name\">{}</span>\
<div class=\"bar\"><div class=\"bar-fill\" style=\"width: {}%\">{}</div></div></div>",
            i + 1,
            escape(feature),
            format_number(width, 1),
            format_number(*importance, 4)
        ));
    }
    html.push_str("</div>");
    html
}

pub fn model_metrics(metrics: &ModelMetrics) -> String {
    let mut html = String::from("<div class=\"models-grid\">");
    html.push_str(&scores_card("Linear Regression", &metrics.linear_regression));
    html.push_str(&scores_card("Random Forest", &metrics.random_forest));
    html.push_str("</div>");

    let ranked = metrics.ranked_importance();
    if !ranked.is_empty() {
        html.push_str("<h3>Feature importance</h3>");
        html.push_str(&importance_bars(&ranked, 10));
    }
    html
}

pub fn train_report(report: &TrainReport) -> String {
    let rf = &report.metrics.random_forest;
    let mut html = String::from("<div class=\"result\">");
    html.push_str(&format!(
        "<h2>Model trained</h2><p>Best model: <strong>{}</strong></p>",
        escape(&report.best_model)
    ));
    html.push_str(&model_metrics(&report.metrics));

    html.push_str(&format!(
        "<div class=\"info-box\"><h4>What the metrics mean</h4><ul>\
<li><strong>R² Score:</strong> how much of the popularity the model explains \
(0 = nothing, 1 = everything). \
{} means the model explains <strong>{}%</strong> of track popularity.</li>\
<li><strong>RMSE:</strong> typical prediction error. Lower is better.</li>\
<li><strong>MAE:</strong> mean absolute error. Lower is better.</li></ul></div>",
        format_number(rf.r2_score, 2),
        format_number(rf.r2_score * 100.0, 0)
    ));

    html.push_str(&format!(
        "<div class=\"info-box\">\
<p><strong>Trained on:</strong> {} tracks</p>\
<p><strong>Tested on:</strong> {} tracks</p>\
<p><strong>Features used:</strong> {}</p>\
<p><strong>Random Forest improvement:</strong> +{}% over Linear Regression</p></div>",
        format_count(report.train_size),
        format_count(report.test_size),
        report.features_used.len(),
        format_number(report.improvement, 1)
    ));

    html.push_str("</div>");
    html
}

/// Features listed under a prediction
const TOP_PREDICTION_FEATURES: usize = 5;

pub fn prediction(result: &Prediction) -> String {
    let info = band::classify(result.predicted_popularity);

    let mut html = String::from("<div class=\"result\">");
    html.push_str(&format!(
        "<div class=\"prediction-result {}\"><h3>Prediction</h3>\
<div class=\"prediction-score\">{}</div><div class=\"prediction-scale\">out of 100</div>\
<div class=\"prediction-category\">{}</div>\
<div class=\"prediction-model\">Model: {}</div></div>",
        info.css_class,
        format_number(result.predicted_popularity, 1),
        escape(info.label),
        escape(&result.model_used)
    ));

    html.push_str(&format!(
        "<div class=\"info-box\"><h4>Interpretation:</h4><p>{}</p></div>",
        escape(info.interpretation)
    ));

    html.push_str("<div class=\"info-box\"><h4>Recommendations:</h4><ul>");
    for rec in info.recommendations {
        html.push_str(&format!("<li>{}</li>", escape(rec)));
    }
    html.push_str("</ul></div>");

    let ranked = result.ranked_importance();
    if !ranked.is_empty() {
        html.push_str("<div class=\"info-box\"><h4>What drives popularity:</h4>");
        for (i, (feature, importance)) in ranked.iter().take(TOP_PREDICTION_FEATURES).enumerate() {
            html.push_str(&format!(
                "<div>{}. <strong>{}</strong>: {}%</div>",
                i + 1,
                escape(label_for(feature)),
                format_number(importance * 100.0, 1)
            ));
        }
        html.push_str("</div>");
    }

    html.push_str(&format!(
        "<div class=\"info-box disclaimer\"><p><strong>Note:</strong> {}</p></div>",
        escape(DISCLAIMER)
    ));
    html.push_str("</div>");
    html
}

/// Standalone page wrapping rendered sections, used for saved reports
pub fn report_page(title: &str, generated_at: &str, sections: &[(String, String)]) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n<div class=\"container\">\n\
         <h1>{}</h1>\n<p class=\"hint\">Generated {}</p>\n",
        escape(title),
        REPORT_CSS,
        escape(title),
        escape(generated_at)
    );
    for (heading, fragment) in sections {
        html.push_str(&format!(
            "<section><h2>{}</h2>{}</section>\n",
            escape(heading),
            fragment
        ));
    }
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

const REPORT_CSS: &str = "body{font-family:-apple-system,BlinkMacSystemFont,\
'Helvetica Neue',Arial,sans-serif;\
background:#f5f5f7;color:#1d1d1f;margin:0}\
.container{max-width:1200px;margin:0 auto;padding:2rem}\
section{background:#fff;border-radius:12px;padding:1.5rem;margin-bottom:1.5rem}\
.stats-grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(220px,1fr));gap:1rem}\
.stat-card,.metric-card{border:1px solid #d2d2d7;border-radius:8px;padding:1rem}\
.info-box{border-left:4px solid #1db954;background:#f0faf3;padding:.75rem 1rem;margin:1rem 0}\
.error{border-left:4px solid #f44336}\
.positive{color:#4caf50}.negative{color:#f44336}\
.hint{color:#86868b}\
.plot-container img{max-width:100%}";
