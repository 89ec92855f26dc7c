/// Turns an HTTP request body into exactly one prediction input.
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use sawi_glcm::{DecodeError, PipelineError, PredictionInput};

use crate::error::ApiError;
use crate::util::multipart::{extract_boundary, file_field, parse_parts};

/// Multipart field carrying the leaf photo.
pub const IMAGE_FIELD: &str = "image";

/// What a request carried, resolved once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestInput {
    FileUpload { bytes: Vec<u8>, filename: Option<String> },
    Base64Image(String),
    ManualFeatures(Vec<f64>),
    Unsupported(String),
}

#[derive(Deserialize)]
struct JsonBody {
    image_base64: Option<String>,
    features: Option<Vec<f64>>,
}

impl RequestInput {
    pub fn resolve(content_type: &str, body: &[u8]) -> RequestInput {
        let mime = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match mime.as_str() {
            "multipart/form-data" => resolve_multipart(content_type, body),
            "application/json" => resolve_json(body),
            "" => RequestInput::Unsupported("missing Content-Type".into()),
            other => RequestInput::Unsupported(format!("unsupported content type '{}'", other)),
        }
    }

    /// Name stored alongside the prediction in the log.
    pub fn filename(&self) -> Option<&str> {
        match self {
            RequestInput::FileUpload { filename, .. } => filename.as_deref(),
            _ => None,
        }
    }

    pub fn into_prediction_input(self) -> Result<PredictionInput, ApiError> {
        match self {
            RequestInput::FileUpload { bytes, .. } => Ok(PredictionInput::ImageBytes(bytes)),
            RequestInput::Base64Image(encoded) => {
                let bytes = decode_base64_image(&encoded)
                    .map_err(|e| ApiError::Pipeline(PipelineError::from(e)))?;
                Ok(PredictionInput::ImageBytes(bytes))
            }
            RequestInput::ManualFeatures(values) => Ok(PredictionInput::Features(values)),
            RequestInput::Unsupported(reason) => Err(ApiError::Unsupported(reason)),
        }
    }
}

fn resolve_multipart(content_type: &str, body: &[u8]) -> RequestInput {
    let Some(boundary) = extract_boundary(content_type) else {
        return RequestInput::Unsupported("multipart request without boundary".into());
    };
    let parts = parse_parts(body, &boundary);
    match file_field(&parts, IMAGE_FIELD) {
        Some(part) if !part.data.is_empty() => RequestInput::FileUpload {
            bytes: part.data.to_vec(),
            filename: part.filename.filter(|f| !f.is_empty()),
        },
        Some(_) => RequestInput::Unsupported("uploaded image is empty".into()),
        None => RequestInput::Unsupported(format!("no file in field '{}'", IMAGE_FIELD)),
    }
}

fn resolve_json(body: &[u8]) -> RequestInput {
    let parsed: JsonBody = match serde_json::from_slice(body) {
        Ok(b) => b,
        Err(e) => return RequestInput::Unsupported(format!("invalid JSON body: {}", e)),
    };
    match (parsed.image_base64, parsed.features) {
        (Some(_), Some(_)) => {
            RequestInput::Unsupported("send either 'image_base64' or 'features', not both".into())
        }
        (Some(encoded), None) => RequestInput::Base64Image(encoded),
        (None, Some(features)) => RequestInput::ManualFeatures(features),
        (None, None) => RequestInput::Unsupported("JSON body needs 'image_base64' or 'features'".into()),
    }
}

/// Decodes standard base64, accepting an optional `data:...;base64,` prefix.
pub fn decode_base64_image(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(cleaned)?;
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(bytes)
}
