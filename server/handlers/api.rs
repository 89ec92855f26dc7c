use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use sawi_glcm::logbook::DEFAULT_RECENT_LIMIT;
use sawi_glcm::{PredictionOutput, PredictionResult};

use crate::error::ApiError;
use crate::handlers::{run_prediction, Outcome};
use crate::input::RequestInput;
use crate::state::AppState;
use crate::util::form::query_usize;
use crate::util::image::grayscale_png_base64;

pub const HOME_TEXT: &str = "Sawi pest classification API (Gaussian naive Bayes on GLCM texture) is running";

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub result: PredictionResult,
    /// Base64 PNG of the normalized grayscale grid; absent for manual features.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_image: Option<String>,
    pub status: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl PredictResponse {
    fn from_outcome(outcome: Outcome) -> Result<PredictResponse, ApiError> {
        let log_id = outcome.log_entry.as_ref().map(|e| e.id);
        let timestamp = outcome.log_entry.as_ref().map_or_else(Utc::now, |e| e.timestamp);
        let (result, processed_image) = match outcome.output {
            PredictionOutput::Image(p) => {
                let png = grayscale_png_base64(&p.grayscale)?;
                (p.result, Some(png))
            }
            PredictionOutput::Features(r) => (r, None),
        };
        Ok(PredictResponse {
            result,
            processed_image,
            status: "success",
            message: "Classification succeeded",
            log_id,
            timestamp,
        })
    }
}

/// POST /predict
pub fn predict(state: &AppState, content_type: &str, body: &[u8]) -> (u16, Value) {
    let request_id = Uuid::new_v4();
    let started = Instant::now();

    let reply = run_prediction(state, RequestInput::resolve(content_type, body))
        .and_then(PredictResponse::from_outcome)
        .and_then(|r| {
            let value = serde_json::to_value(&r)?;
            Ok((r.result, value))
        });

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match reply {
        Ok((result, value)) => {
            info!(
                %request_id,
                label = %result.prediction_label,
                confidence = result.confidence,
                elapsed_ms,
                "prediction served"
            );
            (200, value)
        }
        Err(e) => {
            let status = e.status();
            if status >= 500 {
                error!(%request_id, error = %e, kind = e.kind(), elapsed_ms, "prediction failed");
            } else {
                warn!(%request_id, error = %e, kind = e.kind(), status, elapsed_ms, "prediction rejected");
            }
            (status, e.to_json())
        }
    }
}

/// GET /logs
pub fn logs(state: &AppState, query: &str) -> Value {
    let limit = query_usize(query, "limit").unwrap_or(DEFAULT_RECENT_LIMIT);
    let logs = state.logs.recent(limit);
    json!({
        "total_predictions": logs.len(),
        "logs": logs,
        "status": "success",
    })
}

/// GET /stats
pub fn stats(state: &AppState) -> Value {
    let mut value = json!(state.logs.stats());
    value["status"] = json!("success");
    value
}

/// GET /test
pub fn model_info(state: &AppState) -> Value {
    let model = state.service.model();
    json!({
        "model_classes": model.classes(),
        "model_type": model.summary(),
        "n_features": model.n_features(),
        "model_path": state.model_path,
        "status": "Model loaded successfully",
    })
}
