//! Command-line front end for one-off feature extraction and classification.
//!
//!   sawi-glcm features leaf.jpg
//!   sawi-glcm classify leaf.jpg --model models/naive_bayes_glcm.json
//!   sawi-glcm inspect --model models/naive_bayes_glcm.json
//!
//! Results are printed to stdout as JSON; diagnostics go to stderr via tracing.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::error;

use sawi_glcm::texture::features::angle_features;
use sawi_glcm::{decode_grayscale, extract_features, telemetry, Classifier, GaussianNb, PredictionService};

#[derive(Parser)]
#[command(name = "sawi-glcm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "GLCM texture features and pest classification for sawi leaf images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the angle-averaged GLCM feature vector of an image
    Features {
        image: PathBuf,

        /// Also print the statistics for each orientation
        #[arg(long)]
        per_angle: bool,
    },
    /// Classify an image with a trained model
    Classify {
        image: PathBuf,

        /// Path to the Gaussian naive Bayes model (JSON)
        #[arg(long, env = "SAWI_MODEL", default_value = "models/naive_bayes_glcm.json")]
        model: PathBuf,
    },
    /// Show the classes and shape of a trained model
    Inspect {
        #[arg(long, env = "SAWI_MODEL", default_value = "models/naive_bayes_glcm.json")]
        model: PathBuf,
    },
}

fn main() -> ExitCode {
    telemetry::init_tracing();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<String, Box<dyn std::error::Error>> {
    let value = match command {
        Commands::Features { image, per_angle } => {
            let bytes = std::fs::read(&image)?;
            let gray = decode_grayscale(&bytes)?;
            let features = extract_features(&gray)?;
            if per_angle {
                let angles: Vec<_> = angle_features(&gray)
                    .into_iter()
                    .map(|(angle, f)| json!({ "angle": angle, "features": f }))
                    .collect();
                json!({ "glcm_features": features, "per_angle": angles })
            } else {
                json!({ "glcm_features": features })
            }
        }
        Commands::Classify { image, model } => {
            let service = PredictionService::from_artifact(&model.to_string_lossy())?;
            let bytes = std::fs::read(&image)?;
            let prediction = service.predict_image(&bytes)?;
            serde_json::to_value(&prediction.result)?
        }
        Commands::Inspect { model } => {
            let model = GaussianNb::load_json(&model.to_string_lossy())?;
            json!({
                "model_classes": model.classes(),
                "model_type": model.summary(),
                "metadata": model.metadata,
            })
        }
    };
    Ok(serde_json::to_string_pretty(&value)?)
}
