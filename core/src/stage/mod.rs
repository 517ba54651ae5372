// sluice/src/stage/mod.rs

//! The stage abstraction and the three concrete stages.
//!
//! Every stage runs as two cooperating tasks registered on the bootstrap's [`JoinGroup`]:
//!
//! * a **worker** that performs one bounded iteration at a time while its stop flag is
//!   clear and closes its outbound channel (if it owns one) on the way out;
//! * a **watcher** that waits for the shared [`ShutdownContext`] to be done and then
//!   raises the stop flag. The watcher never touches channels.

pub mod collaborators;
pub mod generator;
pub mod sink;
pub mod transformer;

pub use collaborators::{Annotator, Mutator, NoopAnnotator, Passthrough, Publisher, RecordSource};
pub use generator::Generator;
pub use sink::Sink;
pub use transformer::Transformer;

use crate::core::channel::ChannelReader;
use crate::core::context::ShutdownContext;
use crate::core::control::{StageState, StageStatus};
use crate::core::join_group::JoinGroup;
use crate::core::payload::Payload;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{event, Level};

/// The bootstrap contract of a stage.
///
/// Invoked once with the shared context and join group. Returns whether the stage
/// started; this is immediate startup success, not the outcome of the run.
pub type StageHandle = Box<dyn FnOnce(&ShutdownContext, &JoinGroup) -> bool + Send>;

/// A unit of concurrent pipeline work that can be started by the bootstrap runner.
pub trait Stage: Send + 'static {
  fn name(&self) -> &str;

  /// Spawns the stage's tasks on `group`. Returns `false`, without spawning anything,
  /// if a precondition of the stage is not met.
  fn start(self, ctx: &ShutdownContext, group: &JoinGroup) -> bool
  where
    Self: Sized;
}

/// Wraps a stage into its bootstrap handle.
pub fn into_handle<S: Stage>(stage: S) -> StageHandle {
  Box::new(move |ctx: &ShutdownContext, group: &JoinGroup| stage.start(ctx, group))
}

/// Boxes a closure as a bootstrap handle, for components that are not stages
/// (connection setup, health checks).
pub fn stage_handle<F>(f: F) -> StageHandle
where
  F: FnOnce(&ShutdownContext, &JoinGroup) -> bool + Send + 'static,
{
  Box::new(f)
}

/// The locally visible stop flag a worker polls between iterations.
#[derive(Debug, Clone)]
pub(crate) struct StopSignal {
  rx: watch::Receiver<bool>,
}

impl StopSignal {
  /// A dropped watcher counts as a raised flag.
  pub(crate) fn is_raised(&self) -> bool {
    *self.rx.borrow() || self.rx.has_changed().is_err()
  }

  /// Resolves once the flag is raised or the watcher is gone. Cancel-safe.
  pub(crate) async fn raised(&self) {
    let mut rx = self.rx.clone();
    let _ = rx.wait_for(|raised| *raised).await;
  }
}

/// Spawns the watcher task of `stage` and returns the flag it will raise.
pub(crate) fn spawn_watcher(stage: &str, ctx: &ShutdownContext, group: &JoinGroup) -> StopSignal {
  let (tx, rx) = watch::channel(false);
  let ctx = ctx.clone();
  let stage = stage.to_string();
  group.spawn("stage_watcher", async move {
    ctx.done().await;
    event!(Level::INFO, stage = %stage, "Shutdown received.");
    tx.send_replace(true);
  });
  StopSignal { rx }
}

/// Outcome of one bounded wait on an inbound channel.
pub(crate) enum Inbound {
  Payload(Payload),
  /// Nothing arrived within the poll interval.
  Idle,
  /// Upstream closed the channel and everything was read.
  Closed,
  /// Draining took longer than the drain timeout.
  DrainExpired,
}

/// Bounded receive loop shared by the consuming stages.
///
/// While running, each wait lasts at most one poll interval so the stop flag is
/// re-checked regularly. Once the flag is raised the stage enters `Draining` and keeps
/// reading until upstream closes the channel or the drain timeout elapses.
pub(crate) struct InboundPoller {
  reader: ChannelReader,
  poll_interval: Duration,
  drain_timeout: Duration,
  drain_deadline: Option<Instant>,
  status: StageStatus,
}

impl InboundPoller {
  pub(crate) fn new(reader: ChannelReader, poll_interval: Duration, drain_timeout: Duration, status: StageStatus) -> Self {
    Self {
      reader,
      poll_interval,
      drain_timeout,
      drain_deadline: None,
      status,
    }
  }

  pub(crate) async fn next(&mut self, stop: &StopSignal) -> Inbound {
    if self.drain_deadline.is_none() && stop.is_raised() {
      self.drain_deadline = Some(Instant::now() + self.drain_timeout);
      self.status.advance(StageState::Draining);
      event!(Level::DEBUG, channel = %self.reader.name(), "Stop observed; draining inbound channel.");
    }

    let wait = match self.drain_deadline {
      None => self.poll_interval,
      Some(deadline) => {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
          return Inbound::DrainExpired;
        }
        left.min(self.poll_interval)
      }
    };

    match tokio::time::timeout(wait, self.reader.recv()).await {
      Ok(Some(payload)) => Inbound::Payload(payload),
      Ok(None) => Inbound::Closed,
      Err(_elapsed) => Inbound::Idle,
    }
  }
}
