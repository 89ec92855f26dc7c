use sawi_glcm::{LogStore, PredictionService};

/// Process-wide state, built once at startup and shared by every request
/// through an `Arc`.
///
/// The service wraps the single loaded model; the log store does its own locking.
pub struct AppState {
    pub service:    PredictionService,
    pub logs:       LogStore,
    /// Where the model was loaded from, shown on the model info page.
    pub model_path: String,
}
