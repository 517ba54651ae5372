// sluice/src/stage/sink.rs

use crate::config::PipelineConfig;
use crate::core::channel::ChannelReader;
use crate::core::context::ShutdownContext;
use crate::core::control::{StageState, StageStatus};
use crate::core::join_group::JoinGroup;
use crate::error::SluiceError;
use crate::stage::collaborators::Publisher;
use crate::stage::{spawn_watcher, Inbound, InboundPoller, Stage, StopSignal};
use std::sync::Arc;
use tracing::{event, Instrument, Level};

/// The terminal stage: one inbound channel, no outbound channel.
///
/// Every record read is handed to the [`Publisher`]; publish failures are logged and
/// the sink moves on to the next record.
pub struct Sink {
  name: String,
  publisher: Arc<dyn Publisher>,
  inbound: ChannelReader,
  config: PipelineConfig,
  status: StageStatus,
}

impl Sink {
  pub fn new<P: Publisher>(name: impl Into<String>, publisher: P, inbound: ChannelReader, config: &PipelineConfig) -> Self {
    let name = name.into();
    Self {
      status: StageStatus::new(name.clone()),
      name,
      publisher: Arc::new(publisher),
      inbound,
      config: config.clone(),
    }
  }

  pub fn status(&self) -> StageStatus {
    self.status.clone()
  }

  async fn run(self, stop: StopSignal) {
    let Sink {
      name,
      publisher,
      inbound,
      config,
      status,
    } = self;
    let mut poller = InboundPoller::new(inbound, config.poll_interval(), config.drain_timeout(), status.clone());
    event!(Level::INFO, "Sink started.");

    loop {
      match poller.next(&stop).await {
        Inbound::Payload(payload) => match publisher.publish(payload).await {
          Ok(()) => status.record_processed(),
          Err(source) => {
            let error = SluiceError::collaborator(&name, source);
            event!(Level::ERROR, error = %error, "Publish failed; record dropped.");
            status.record_failure();
          }
        },
        Inbound::Idle => {}
        Inbound::Closed => {
          event!(Level::DEBUG, "Inbound channel closed; nothing left to publish.");
          break;
        }
        Inbound::DrainExpired => {
          event!(Level::WARN, "Drain timeout elapsed before upstream closed.");
          break;
        }
      }
    }

    status.advance(StageState::Draining);
    status.advance(StageState::Stopped);
    event!(Level::DEBUG, "Sink stopped.");
  }
}

impl Stage for Sink {
  fn name(&self) -> &str {
    &self.name
  }

  fn start(self, ctx: &ShutdownContext, group: &JoinGroup) -> bool {
    if let Err(source) = self.publisher.ready() {
      let error = SluiceError::collaborator(&self.name, source);
      event!(Level::ERROR, stage = %self.name, error = %error, "Publisher is not ready.");
      return false;
    }

    let span = tracing::info_span!("stage", stage = %self.name, inbound = %self.inbound.name());
    let stop = spawn_watcher(&self.name, ctx, group);
    group.spawn("sink", self.run(stop).instrument(span));
    true
  }
}
