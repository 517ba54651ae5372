// sluice/src/stage/generator.rs

//! The source stage: produces a record every tick and pushes it downstream.

use crate::config::PipelineConfig;
use crate::core::channel::ChannelWriter;
use crate::core::context::ShutdownContext;
use crate::core::control::{StageState, StageStatus};
use crate::core::join_group::JoinGroup;
use crate::core::payload::Payload;
use crate::error::SluiceError;
use crate::stage::collaborators::{Annotator, RecordSource};
use crate::stage::{spawn_watcher, Stage, StopSignal};
use std::sync::Arc;
use std::time::Duration;
use tracing::{event, Instrument, Level};

/// No inbound channel, one outbound channel.
///
/// Each iteration asks the [`RecordSource`] for a record, hands a copy to the
/// [`Annotator`] on a separate tracked task, then sends the record downstream and waits
/// one tick. With an unbuffered outbound channel a slow consumer stalls the send, which
/// throttles generation. Stopping interrupts a send only before the record is queued;
/// a queued record is always waited for, so `processed` matches what downstream received.
pub struct Generator {
  name: String,
  source: Arc<dyn RecordSource>,
  annotator: Arc<dyn Annotator>,
  outbound: ChannelWriter,
  interval: Duration,
  status: StageStatus,
}

impl Generator {
  pub fn new<S, A>(name: impl Into<String>, source: S, annotator: A, outbound: ChannelWriter, config: &PipelineConfig) -> Self
  where
    S: RecordSource,
    A: Annotator,
  {
    let name = name.into();
    Self {
      status: StageStatus::new(name.clone()),
      name,
      source: Arc::new(source),
      annotator: Arc::new(annotator),
      outbound,
      interval: config.tick_interval(),
    }
  }

  pub fn status(&self) -> StageStatus {
    self.status.clone()
  }

  async fn run(mut self, stop: StopSignal, group: JoinGroup) {
    event!(Level::INFO, "Generator started.");

    while !stop.is_raised() {
      let payload = match self.source.generate().await {
        Ok(payload) => payload,
        Err(source) => {
          let error = SluiceError::collaborator(&self.name, source);
          event!(Level::ERROR, error = %error, "Record generation failed; skipping iteration.");
          self.status.record_failure();
          self.pause(&stop).await;
          continue;
        }
      };

      self.annotate(&group, payload.clone());

      let pending = tokio::select! {
        biased;
        _ = stop.raised() => {
          event!(Level::DEBUG, "Stop raised while waiting on downstream.");
          break;
        }
        queued = self.outbound.enqueue(payload) => match queued {
          Ok(pending) => pending,
          Err(error) => {
            event!(Level::ERROR, error = %error, "Downstream is gone; generator stopping.");
            break;
          }
        }
      };

      // A queued payload is owned by the channel: the reader either takes it or drops.
      match pending.delivered().await {
        Ok(()) => self.status.record_processed(),
        Err(error) => {
          event!(Level::ERROR, error = %error, "Downstream dropped a queued record; generator stopping.");
          break;
        }
      }

      self.pause(&stop).await;
    }

    self.status.advance(StageState::Draining);
    if let Err(error) = self.outbound.close() {
      event!(Level::ERROR, error = %error, "Failed to close outbound channel.");
    }
    self.status.advance(StageState::Stopped);
    event!(Level::DEBUG, "Cancel received; generator stopped.");
  }

  fn annotate(&self, group: &JoinGroup, payload: Payload) {
    let annotator = Arc::clone(&self.annotator);
    let stage = self.name.clone();
    group.spawn(
      "annotation",
      async move {
        if let Err(source) = annotator.annotate(&payload).await {
          let error = SluiceError::collaborator(&stage, source);
          event!(Level::ERROR, error = %error, "Annotation failed.");
        }
      }
      .in_current_span(),
    );
  }

  async fn pause(&self, stop: &StopSignal) {
    tokio::select! {
      _ = tokio::time::sleep(self.interval) => {}
      _ = stop.raised() => {}
    }
  }
}

impl Stage for Generator {
  fn name(&self) -> &str {
    &self.name
  }

  fn start(self, ctx: &ShutdownContext, group: &JoinGroup) -> bool {
    if let Err(source) = self.source.ready() {
      let error = SluiceError::collaborator(&self.name, source);
      event!(Level::ERROR, stage = %self.name, error = %error, "Record source is not ready.");
      return false;
    }

    let span = tracing::info_span!("stage", stage = %self.name, channel = %self.outbound.name());
    let stop = spawn_watcher(&self.name, ctx, group);
    group.spawn("generator", self.run(stop, group.clone()).instrument(span));
    true
  }
}
