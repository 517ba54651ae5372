// provenance_app/src/errors.rs

use sluice::SluiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Key Material Error: {0}")]
  Key(String),

  #[error("I/O Error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON Error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Pipeline Error: {source}")]
  Pipeline {
    #[from]
    source: SluiceError,
  },
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
