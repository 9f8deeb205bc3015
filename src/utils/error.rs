use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PestError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Could not process image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl PestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PestError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PestError::ImageDecode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PestError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            PestError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            PestError::Base64(_) => StatusCode::BAD_REQUEST,
            PestError::Json(_) => StatusCode::BAD_REQUEST,
            PestError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            PestError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            PestError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            PestError::InvalidInput(_) => "INVALID_INPUT",
            PestError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            PestError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            PestError::Dataset(_) => "DATASET_ERROR",
            PestError::Training(_) => "TRAINING_ERROR",
            PestError::Config(_) => "CONFIG_ERROR",
            PestError::Io(_) => "IO_ERROR",
            PestError::Json(_) => "JSON_ERROR",
            PestError::Base64(_) => "BASE64_DECODE_ERROR",
            PestError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for PestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self, status);
        } else {
            tracing::warn!("Request rejected: {} ({})", self, status);
        }

        (status, axum::Json(error_response)).into_response()
    }
}
