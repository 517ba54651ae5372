// sluice/src/config.rs

//! Timing and topology parameters for a pipeline. Read once at wiring time.

use crate::error::{SluiceError, SluiceResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// Pause between two generated records, in milliseconds.
  pub tick_interval_ms: u64,

  /// Longest a consuming stage waits on its inbound channel before re-checking its
  /// stop flag, in milliseconds.
  pub poll_interval_ms: u64,

  /// How long a consuming stage keeps draining its inbound channel after it was told
  /// to stop, waiting for upstream to close, in milliseconds.
  pub drain_timeout_ms: u64,

  /// Buffer size of every stage channel. `0` makes channels unbuffered.
  pub channel_capacity: usize,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      tick_interval_ms: 1_000,
      poll_interval_ms: 100,
      drain_timeout_ms: 1_000,
      channel_capacity: 0,
    }
  }
}

impl PipelineConfig {
  pub fn tick_interval(&self) -> Duration {
    Duration::from_millis(self.tick_interval_ms)
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms)
  }

  pub fn drain_timeout(&self) -> Duration {
    Duration::from_millis(self.drain_timeout_ms)
  }

  pub fn validate(&self) -> SluiceResult<()> {
    let require_positive = |field: &str, value: u64| {
      if value == 0 {
        Err(SluiceError::Configuration {
          field: field.to_string(),
          message: "must be greater than zero".to_string(),
        })
      } else {
        Ok(())
      }
    };
    require_positive("tick_interval_ms", self.tick_interval_ms)?;
    require_positive("poll_interval_ms", self.poll_interval_ms)?;
    require_positive("drain_timeout_ms", self.drain_timeout_ms)?;
    Ok(())
  }
}
