use sawi_glcm::logbook::DEFAULT_RECENT_LIMIT;
use sawi_glcm::texture::features::FeatureVector;
use sawi_glcm::{ClassProbability, PredictionOutput};
use tracing::warn;

use crate::handlers::run_prediction;
use crate::input::{RequestInput, IMAGE_FIELD};
use crate::render::{flash, html_escape, render_page, Page};
use crate::state::AppState;
use crate::util::form::query_usize;
use crate::util::image::{data_uri, grayscale_png_base64};

// ---------------------------------------------------------------------------
// GET /admin
// ---------------------------------------------------------------------------

pub fn admin(state: &AppState) -> String {
    let content = format!(
        r#"<div class="card"><h2>Admin panel</h2>
<p>Model file: <code>{path}</code></p>
<p><a href="/logs" target="_blank">Prediction log (JSON)</a></p>
<p><a href="/stats" target="_blank">Statistics (JSON)</a></p>
<p><a href="/test" target="_blank">Model check (JSON)</a></p>
<p class="hint">{n} predictions recorded so far.</p></div>"#,
        path = html_escape(&state.model_path),
        n = state.logs.len(),
    );
    page(state, Page::Admin, "", &content)
}

// ---------------------------------------------------------------------------
// GET /demo  and  POST /demo
// ---------------------------------------------------------------------------

pub fn upload_form(state: &AppState) -> String {
    page(state, Page::Upload, "", &upload_card())
}

pub fn submit(state: &AppState, content_type: &str, body: &[u8]) -> (u16, String) {
    let input = RequestInput::resolve(content_type, body);
    let original = match &input {
        RequestInput::FileUpload { bytes, .. } => Some(data_uri(bytes)),
        _ => None,
    };

    let outcome = match run_prediction(state, input) {
        Ok(o) => o,
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "demo upload rejected");
            let notice = flash("error", &e.to_string());
            return (e.status(), page(state, Page::Upload, &notice, &upload_card()));
        }
    };

    let result = outcome.output.result();
    let processed = match &outcome.output {
        PredictionOutput::Image(p) => match grayscale_png_base64(&p.grayscale) {
            Ok(b64) => Some(format!("data:image/png;base64,{}", b64)),
            Err(e) => {
                warn!(error = %e, "could not encode grayscale preview");
                None
            }
        },
        PredictionOutput::Features(_) => None,
    };

    let mut figures = String::new();
    if let Some(src) = &original {
        figures.push_str(&figure(src, "Uploaded image"));
    }
    if let Some(src) = &processed {
        figures.push_str(&figure(src, "Grayscale used for GLCM"));
    }

    let notice = match &outcome.log_entry {
        Some(entry) => flash("info", &format!("Saved to the prediction log as {}", entry.id)),
        None => String::new(),
    };

    let content = format!(
        r#"<div class="card"><h2>Result</h2>
<div class="prediction-hero">{label}</div>
<div class="prediction-sub">Confidence: <span class="{conf_class}">{conf:.1}%</span></div>
<div class="images">{figures}</div></div>
<div class="card"><h2>Class probabilities</h2>
{bars}
{chart}</div>
<div class="card"><h2>GLCM texture features</h2>
{features}</div>
{upload}"#,
        label = html_escape(&result.prediction_label),
        conf_class = confidence_class(result.confidence),
        conf = result.confidence * 100.0,
        figures = figures,
        bars = probability_bars(&result.probabilities, &result.prediction_label),
        chart = build_svg_probability_chart(&result.probabilities),
        features = feature_table(&result.glcm_features),
        upload = upload_card(),
    );

    (200, page(state, Page::Upload, &notice, &content))
}

// ---------------------------------------------------------------------------
// GET /demo/logs  and  GET /demo/stats
// ---------------------------------------------------------------------------

pub fn log_page(state: &AppState, query: &str) -> String {
    let limit = query_usize(query, "limit").unwrap_or(DEFAULT_RECENT_LIMIT);
    let entries = state.logs.recent(limit);

    let content = if entries.is_empty() {
        r#"<div class="card"><p class="hint">No predictions yet. <a href="/demo">Classify a leaf</a> to start the log.</p></div>"#.to_owned()
    } else {
        let rows: String = entries.iter().map(|e| {
            let f = &e.glcm_features;
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{:.1}%</td>\
                 <td>{:.3}</td><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td></tr>",
                e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                html_escape(e.image_name.as_deref().unwrap_or("-")),
                html_escape(&e.prediction_label),
                confidence_class(e.confidence),
                e.confidence * 100.0,
                f.contrast, f.correlation, f.energy, f.homogeneity,
            )
        }).collect();
        format!(
            r#"<div class="card"><h2>Latest {n} predictions</h2>
<table><thead><tr><th>Time (UTC)</th><th>Image</th><th>Label</th><th>Confidence</th>
<th>Contrast</th><th>Correlation</th><th>Energy</th><th>Homogeneity</th></tr></thead>
<tbody>{rows}</tbody></table></div>"#,
            n = entries.len(),
            rows = rows,
        )
    };
    page(state, Page::Logs, "", &content)
}

pub fn stats_page(state: &AppState) -> String {
    let stats = state.logs.stats();
    let rows: String = stats.class_distribution.iter().map(|c| {
        format!(
            r#"<tr><td>{}</td><td>{}</td><td><div class="bar-wrap"><div class="bar-fill" style="width:{}px"></div></div></td><td>{:.1}%</td></tr>"#,
            html_escape(&c.label), c.count, (c.percentage * 2.6) as u32, c.percentage
        )
    }).collect();

    let content = format!(
        r#"<div class="stat-grid">
<div class="card"><h2>Total predictions</h2><div class="stat-value">{total}</div></div>
<div class="card"><h2>Average confidence</h2><div class="stat-value {conf_class}">{avg:.1}%</div></div>
</div>
<div class="card"><h2>Class distribution</h2>
<table><thead><tr><th>Class</th><th>Count</th><th></th><th>Share</th></tr></thead>
<tbody>{rows}</tbody></table></div>"#,
        total = stats.total_predictions,
        conf_class = confidence_class(stats.average_confidence),
        avg = stats.average_confidence * 100.0,
        rows = rows,
    );
    page(state, Page::Stats, "", &content)
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

fn page(state: &AppState, which: Page, notice: &str, content: &str) -> String {
    render_page(which, &state.service.model().summary(), |tmpl| {
        tmpl.replace("{{FLASH}}", notice).replace("{{CONTENT}}", content)
    })
}

fn upload_card() -> String {
    format!(
        r#"<div class="card"><h2>Classify a sawi leaf</h2>
<form method="POST" action="/demo" enctype="multipart/form-data">
  <input type="file" name="{field}" accept="image/png,image/jpeg,image/bmp,image/gif" required>
  <button type="submit" class="btn btn-primary">Classify</button>
</form>
<p class="hint">The photo is converted to grayscale and described by four GLCM texture statistics before classification.</p></div>"#,
        field = IMAGE_FIELD,
    )
}

fn figure(src: &str, caption: &str) -> String {
    format!(r#"<figure><img src="{}" alt="{}"><figcaption>{}</figcaption></figure>"#, src, caption, caption)
}

fn confidence_class(confidence: f64) -> &'static str {
    if confidence >= 0.8 {
        "conf-high"
    } else if confidence >= 0.5 {
        "conf-mid"
    } else {
        "conf-low"
    }
}

fn probability_bars(probabilities: &[ClassProbability], winner: &str) -> String {
    let mut sorted: Vec<&ClassProbability> = probabilities.iter().collect();
    sorted.sort_by(|a, b| b.probability.total_cmp(&a.probability));

    let rows: String = sorted.iter().map(|p| {
        let dim = if p.label != winner { " dim" } else { "" };
        format!(
            r#"<tr><td style="width:120px;font-weight:600">{}</td><td><div class="bar-wrap"><div class="bar-fill{}" style="width:{}px"></div></div></td><td>{:.1}%</td></tr>"#,
            html_escape(&p.label), dim, (p.probability * 260.0) as u32, p.probability * 100.0
        )
    }).collect();
    format!("<table><tbody>{}</tbody></table>", rows)
}

fn feature_table(f: &FeatureVector) -> String {
    let rows: String = FeatureVector::NAMES.iter()
        .zip(f.to_array())
        .map(|(name, value)| format!("<tr><td>{}</td><td>{:.6}</td></tr>", name, value))
        .collect();
    format!("<table><thead><tr><th>Feature</th><th>Value</th></tr></thead><tbody>{}</tbody></table>", rows)
}

/// Line chart of probability per class in model order, values annotated.
fn build_svg_probability_chart(probabilities: &[ClassProbability]) -> String {
    if probabilities.len() < 2 {
        return "<p class=\"hint\">Not enough classes to draw a chart.</p>".into();
    }

    let w = 760.0f64;
    let h = 240.0f64;
    let pad_l = 52.0f64;
    let pad_r = 24.0f64;
    let pad_t = 20.0f64;
    let pad_b = 34.0f64;
    let n = probabilities.len();

    let px = |i: usize, v: f64| -> (f64, f64) {
        let x = pad_l + (i as f64 / (n - 1) as f64) * (w - pad_l - pad_r);
        let y = pad_t + (1.0 - v.clamp(0.0, 1.0)) * (h - pad_t - pad_b);
        (x, y)
    };

    let line_green = "#2f6b3a";
    let marker_red = "#dc2626";
    let grey_grid = "#eef0ed";
    let grey_text = "#888";

    let path: String = probabilities.iter().enumerate().map(|(i, p)| {
        let (x, y) = px(i, p.probability);
        if i == 0 { format!("M{:.1},{:.1}", x, y) } else { format!(" L{:.1},{:.1}", x, y) }
    }).collect();

    let y_grid: String = (0..=4).map(|g| {
        let frac = g as f64 / 4.0;
        let (_, y) = px(0, frac);
        format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" fill=\"{}\" font-size=\"10\">{:.2}</text>\n\
             <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>",
            pad_l - 6.0, y + 4.0, grey_text, frac,
            pad_l, y, w - pad_r, y, grey_grid
        )
    }).collect::<Vec<_>>().join("\n");

    let points: String = probabilities.iter().enumerate().map(|(i, p)| {
        let (x, y) = px(i, p.probability);
        format!(
            "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"5\" fill=\"{red}\"/>\n\
             <text x=\"{x:.1}\" y=\"{ty:.1}\" text-anchor=\"middle\" fill=\"#333\" font-size=\"10\">{v:.3}</text>\n\
             <text x=\"{x:.1}\" y=\"{ly:.1}\" text-anchor=\"middle\" fill=\"{grey}\" font-size=\"11\">{label}</text>",
            x = x, y = y, red = marker_red, ty = y - 9.0, v = p.probability,
            ly = h - 10.0, grey = grey_text, label = html_escape(&p.label),
        )
    }).collect::<Vec<_>>().join("\n");

    format!(
        "<svg class=\"prob-svg\" width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n\
         {}\n\
         <path d=\"{}\" stroke=\"{}\" stroke-width=\"2.5\" fill=\"none\"/>\n\
         {}\n\
         </svg>",
        w, h, y_grid, path, line_green, points
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::fixtures;

    #[test]
    fn result_page_shows_both_images_and_chart() {
        let state = fixtures::state();
        let (ct, body) = fixtures::multipart("leaf.png", &fixtures::smooth_png());
        let (status, html) = submit(&state, &ct, &body);
        assert_eq!(status, 200);
        assert!(html.contains("prediction-hero\">sehat<"));
        assert_eq!(html.matches("data:image/png;base64,").count(), 2);
        assert!(html.contains("<svg class=\"prob-svg\""));
        assert!(html.contains("homogeneity"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn rejected_upload_renders_form_with_error() {
        let state = fixtures::state();
        let (status, html) = submit(&state, "text/plain", b"hello");
        assert_eq!(status, 400);
        assert!(html.contains("flash-error"));
        assert!(html.contains("action=\"/demo\""));
    }

    #[test]
    fn log_and_stats_pages_list_recorded_predictions() {
        let state = fixtures::state();
        assert!(log_page(&state, "").contains("No predictions yet"));

        let (ct, body) = fixtures::multipart("kebun_1.png", &fixtures::smooth_png());
        submit(&state, &ct, &body);
        assert!(log_page(&state, "").contains("kebun_1.png"));

        let stats = stats_page(&state);
        assert!(stats.contains("stat-value\">1<"));
        assert!(stats.contains("100.0%"));
    }

    #[test]
    fn chart_needs_two_classes() {
        let one = [ClassProbability { label: "sehat".into(), probability: 1.0 }];
        assert!(build_svg_probability_chart(&one).contains("Not enough"));
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(confidence_class(0.95), "conf-high");
        assert_eq!(confidence_class(0.6), "conf-mid");
        assert_eq!(confidence_class(0.2), "conf-low");
    }
}
