pub mod api;
pub mod demo;

use chrono::Local;

use sawi_glcm::{LogEntry, PredictionOutput};

use crate::error::ApiError;
use crate::input::RequestInput;
use crate::state::AppState;

/// A finished prediction plus the log entry it produced, if any.
pub struct Outcome {
    pub output: PredictionOutput,
    /// `None` for manual-feature requests, which are not logged.
    pub log_entry: Option<LogEntry>,
}

/// Runs one resolved request through the service and logs image predictions.
pub fn run_prediction(state: &AppState, input: RequestInput) -> Result<Outcome, ApiError> {
    let image_name = input.filename().map(str::to_owned);
    let output = state.service.predict(input.into_prediction_input()?)?;

    let log_entry = match &output {
        PredictionOutput::Image(p) => {
            let name = image_name.unwrap_or_else(generated_image_name);
            Some(state.logs.record(&p.result, Some(name))?)
        }
        PredictionOutput::Features(_) => None,
    };

    Ok(Outcome { output, log_entry })
}

/// Name for uploads that arrived without one (base64 bodies).
fn generated_image_name() -> String {
    format!("prediction_{}.jpg", Local::now().format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Cursor;
    use std::sync::Arc;

    use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};

    use sawi_glcm::{GaussianNb, LogStore, PredictionService};

    use crate::state::AppState;

    pub fn state() -> AppState {
        let model = GaussianNb::new(
            vec!["sehat".into(), "hama_ulat".into()],
            vec![0.5, 0.5],
            vec![vec![5.0, 0.9, 0.5, 0.9], vec![400.0, 0.3, 0.05, 0.2]],
            vec![vec![100.0, 0.05, 0.05, 0.05], vec![10000.0, 0.05, 0.05, 0.05]],
        ).unwrap();
        AppState {
            service: PredictionService::new(Arc::new(model)),
            logs: LogStore::in_memory(),
            model_path: "models/test.json".into(),
        }
    }

    pub fn smooth_png() -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(GrayImage::from_pixel(24, 24, Luma([128])))
            .write_to(&mut out, ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    pub fn multipart(filename: &str, bytes: &[u8]) -> (String, Vec<u8>) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!("--zz\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\n", filename).as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n--zz--\r\n");
        ("multipart/form-data; boundary=zz".into(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_predictions_are_logged_under_upload_name() {
        let state = fixtures::state();
        let (ct, body) = fixtures::multipart("daun.png", &fixtures::smooth_png());
        let outcome = run_prediction(&state, RequestInput::resolve(&ct, &body)).unwrap();
        let entry = outcome.log_entry.unwrap();
        assert_eq!(entry.image_name.as_deref(), Some("daun.png"));
        assert_eq!(entry.prediction_label, outcome.output.result().prediction_label);
        assert_eq!(state.logs.len(), 1);
    }

    #[test]
    fn manual_features_are_not_logged() {
        let state = fixtures::state();
        let input = RequestInput::ManualFeatures(vec![5.0, 0.9, 0.5, 0.9]);
        let outcome = run_prediction(&state, input).unwrap();
        assert!(outcome.log_entry.is_none());
        assert!(state.logs.is_empty());
    }

    #[test]
    fn generated_names_follow_timestamp_pattern() {
        let name = generated_image_name();
        assert!(name.starts_with("prediction_") && name.ends_with(".jpg"));
        assert_eq!(name.len(), "prediction_20240101_120000.jpg".len());
    }
}
