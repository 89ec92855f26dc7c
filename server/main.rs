/// sawi-server
///
/// HTTP front end for the sawi pest classifier. Loads the trained model once,
/// then serves the JSON prediction API and a small browser demo from the same
/// synchronous tiny_http server.
///
/// Run with:
///   cargo run --bin sawi-server --release -- --model models/naive_bayes_glcm.json
/// Then POST images to http://127.0.0.1:5000/predict or open /demo.
///
/// Routes:
///   GET  /             status line
///   GET  /admin        links to logs, stats and model info
///   POST /predict      multipart `image`, or JSON `image_base64` / `features`
///   GET  /logs         recent predictions (`?limit=N`, default 50)
///   GET  /stats        prediction counts per class and mean confidence
///   GET  /test         loaded model classes and shape
///   GET  /demo         upload form; POST renders the result page
///   GET  /demo/logs    prediction log table
///   GET  /demo/stats   prediction statistics page

mod error;
mod handlers;
mod input;
mod render;
mod routes;
mod state;
mod util;

use std::sync::Arc;

use clap::Parser;
use tiny_http::Server;
use tracing::{error, info};

use sawi_glcm::{telemetry, Classifier, LogStore, PredictionService};
use state::AppState;

#[derive(Parser)]
#[command(name = "sawi-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pest classification API for sawi leaf images", long_about = None)]
struct Args {
    /// Path to the Gaussian naive Bayes model (JSON)
    #[arg(long, env = "SAWI_MODEL", default_value = "models/naive_bayes_glcm.json")]
    model: String,

    /// Host to bind to
    #[arg(long, env = "SAWI_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, short, env = "SAWI_PORT", default_value = "5000")]
    port: u16,

    /// JSON-lines file the prediction log is appended to
    #[arg(long, env = "SAWI_LOG_FILE", default_value = "prediction_logs.jsonl")]
    log_file: String,

    /// Keep the prediction log in memory only
    #[arg(long)]
    in_memory_log: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    telemetry::init_tracing();
    let args = Args::parse();

    let service = PredictionService::from_artifact(&args.model).map_err(|e| {
        error!(path = %args.model, error = %e, "failed to load model");
        e
    })?;
    info!(
        path = %args.model,
        model = %service.model().summary(),
        classes = ?service.model().classes(),
        "model loaded"
    );

    let logs = if args.in_memory_log {
        LogStore::in_memory()
    } else {
        LogStore::open(&args.log_file)?
    };

    let state = Arc::new(AppState { service, logs, model_path: args.model.clone() });

    let addr = format!("{}:{}", args.host, args.port);
    let server = Server::http(&addr)?;
    info!("listening on http://{}", addr);

    // One thread per request; the model is shared read-only through the Arc.
    for request in server.incoming_requests() {
        let state = state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, &state);
        });
    }

    Ok(())
}
