use thiserror::Error;

use sawi_glcm::{LogError, PipelineError};

/// Everything a request handler can fail with, mapped to an HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request did not carry a recognizable input.
    #[error("{0}")]
    Unsupported(String),
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("could not store prediction log: {0}")]
    Log(#[from] LogError),
    #[error("could not encode processed image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("could not read request body: {0}")]
    Body(#[from] std::io::Error),
    #[error("could not serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Unsupported(_) => 400,
            ApiError::PayloadTooLarge { .. } => 413,
            ApiError::Pipeline(e) if e.is_client_error() => 400,
            ApiError::Pipeline(_) => 422,
            ApiError::Log(_) | ApiError::Encode(_) | ApiError::Body(_) | ApiError::Serialize(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unsupported(_) => "unsupported_input",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::Pipeline(e)    => e.kind(),
            _                        => "internal_error",
        }
    }

    /// Structured error payload: never a backtrace, always a message and a kind.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.to_string(),
            "error_kind": self.kind(),
            "status": "error",
        })
    }
}
