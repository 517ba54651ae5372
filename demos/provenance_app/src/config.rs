// provenance_app/src/config.rs

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use sluice::PipelineConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
  #[serde(default)]
  pub pipeline: PipelineConfig,
  pub signature: SignatureInfo,
  #[serde(default)]
  pub stream: StreamInfo,
  #[serde(default)]
  pub logging: LoggingInfo,
}

/// Where the Ed25519 key used to sign sample seeds lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureInfo {
  /// File holding the hex encoded secret key (32 byte seed or 64 byte keypair).
  pub private_key_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
  /// `stdout`, or a file path that published records are appended to.
  #[serde(default = "default_output")]
  pub output: String,
}

fn default_output() -> String {
  "stdout".to_string()
}

impl Default for StreamInfo {
  fn default() -> Self {
    Self { output: default_output() }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingInfo {
  /// Default filter directive; `RUST_LOG` takes precedence when set.
  #[serde(default = "default_min_level")]
  pub min_level: String,
}

fn default_min_level() -> String {
  "info".to_string()
}

impl Default for LoggingInfo {
  fn default() -> Self {
    Self {
      min_level: default_min_level(),
    }
  }
}

/// Supported configuration file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
  Json,
}

impl ConfigFormat {
  pub fn from_path(path: &Path) -> Result<Self> {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(ConfigFormat::Json),
      Some(ext) => Err(AppError::Config(format!("unsupported configuration format '{}'", ext))),
      None => Err(AppError::Config(format!(
        "cannot determine configuration format of '{}'",
        path.display()
      ))),
    }
  }
}

impl AppConfig {
  pub fn from_file(path: &Path) -> Result<Self> {
    let format = ConfigFormat::from_path(path)?;
    let raw = std::fs::read_to_string(path)
      .map_err(|e| AppError::Config(format!("cannot read '{}': {}", path.display(), e)))?;
    let config = match format {
      ConfigFormat::Json => Self::from_json(&raw)?,
    };
    tracing::debug!(path = %path.display(), "Application configuration loaded successfully.");
    Ok(config)
  }

  pub fn from_json(raw: &str) -> Result<Self> {
    let config: AppConfig = serde_json::from_str(raw)?;
    config.pipeline.validate()?;
    Ok(config)
  }
}
