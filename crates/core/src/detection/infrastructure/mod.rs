pub mod model_resolver;
pub mod onnx_cnn_detector;
pub mod seeta_cascade_detector;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("failed to load detector model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },
}
