// sluice/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SluiceError {
  #[error("Channel '{channel}' is closed")]
  ChannelClosed { channel: String },

  /// Raised when the owning writer closes a channel a second time.
  /// Closing is the producer's job and happens exactly once.
  #[error("Channel '{channel}' was already closed by its writer")]
  ChannelAlreadyClosed { channel: String },

  #[error("Pipeline wiring error: {0}")]
  Wiring(String),

  #[error("Configuration error for '{field}': {message}")]
  Configuration { field: String, message: String },

  #[error("Collaborator of stage '{stage}' failed. Source: {source}")]
  Collaborator {
    stage: String,
    #[source]
    source: AnyhowError,
  },

  #[error(transparent)]
  Other(#[from] AnyhowError),
}

impl SluiceError {
  pub(crate) fn closed(channel: &str) -> Self {
    SluiceError::ChannelClosed {
      channel: channel.to_string(),
    }
  }

  pub(crate) fn collaborator(stage: &str, source: AnyhowError) -> Self {
    SluiceError::Collaborator {
      stage: stage.to_string(),
      source,
    }
  }
}

pub type SluiceResult<T, E = SluiceError> = std::result::Result<T, E>;
