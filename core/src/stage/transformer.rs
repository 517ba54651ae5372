// sluice/src/stage/transformer.rs

use crate::config::PipelineConfig;
use crate::core::channel::{ChannelReader, ChannelWriter};
use crate::core::context::ShutdownContext;
use crate::core::control::{StageState, StageStatus};
use crate::core::join_group::JoinGroup;
use crate::error::SluiceError;
use crate::stage::collaborators::Mutator;
use crate::stage::{spawn_watcher, Inbound, InboundPoller, Stage, StopSignal};
use std::sync::Arc;
use tracing::{event, Instrument, Level};

/// One inbound channel, one outbound channel.
///
/// Receives a record, runs it through the [`Mutator`] and sends the result on. When the
/// inbound channel closes the transformer closes its outbound channel and exits, so an
/// upstream shutdown propagates downstream even before this stage's own watcher fires.
pub struct Transformer {
  name: String,
  mutator: Arc<dyn Mutator>,
  inbound: ChannelReader,
  outbound: ChannelWriter,
  config: PipelineConfig,
  status: StageStatus,
}

impl Transformer {
  pub fn new<M: Mutator>(
    name: impl Into<String>,
    mutator: M,
    inbound: ChannelReader,
    outbound: ChannelWriter,
    config: &PipelineConfig,
  ) -> Self {
    let name = name.into();
    Self {
      status: StageStatus::new(name.clone()),
      name,
      mutator: Arc::new(mutator),
      inbound,
      outbound,
      config: config.clone(),
    }
  }

  pub fn status(&self) -> StageStatus {
    self.status.clone()
  }

  async fn run(self, stop: StopSignal) {
    let Transformer {
      name,
      mutator,
      inbound,
      mut outbound,
      config,
      status,
    } = self;
    let mut poller = InboundPoller::new(inbound, config.poll_interval(), config.drain_timeout(), status.clone());
    event!(Level::INFO, "Transformer started.");

    loop {
      let payload = match poller.next(&stop).await {
        Inbound::Payload(payload) => payload,
        Inbound::Idle => continue,
        Inbound::Closed => {
          event!(Level::DEBUG, "Inbound channel closed; upstream finished.");
          break;
        }
        Inbound::DrainExpired => {
          event!(Level::WARN, "Drain timeout elapsed before upstream closed.");
          break;
        }
      };

      let mutated = match mutator.mutate(payload).await {
        Ok(mutated) => mutated,
        Err(source) => {
          let error = SluiceError::collaborator(&name, source);
          event!(Level::ERROR, error = %error, "Transformation failed; skipping record.");
          status.record_failure();
          continue;
        }
      };

      if let Err(error) = outbound.send(mutated).await {
        event!(Level::ERROR, error = %error, "Downstream is gone; transformer stopping.");
        break;
      }
      status.record_processed();
    }

    status.advance(StageState::Draining);
    if let Err(error) = outbound.close() {
      event!(Level::ERROR, error = %error, "Failed to close outbound channel.");
    }
    status.advance(StageState::Stopped);
    event!(Level::DEBUG, "Transformer stopped.");
  }
}

impl Stage for Transformer {
  fn name(&self) -> &str {
    &self.name
  }

  fn start(self, ctx: &ShutdownContext, group: &JoinGroup) -> bool {
    let span = tracing::info_span!(
      "stage",
      stage = %self.name,
      inbound = %self.inbound.name(),
      outbound = %self.outbound.name()
    );
    let stop = spawn_watcher(&self.name, ctx, group);
    group.spawn("transformer", self.run(stop).instrument(span));
    true
  }
}
