// sluice/src/pipeline/execution.rs

//! Contains `Pipeline::run()`, which wires the pipeline and hands it to the bootstrap runner.

use crate::bootstrap::{self, shutdown::termination_signal};
use crate::core::context::ShutdownContext;
use crate::error::SluiceResult;
use crate::pipeline::definition::Pipeline;
use std::future::Future;
use tracing::{event, instrument, Level};

impl Pipeline {
  /// Wires the pipeline and runs it until SIGINT/SIGTERM (or `ctx` is cancelled) and
  /// every stage has drained.
  ///
  /// Returns `Ok(false)` if a stage failed to start. Wiring errors are returned before
  /// anything is started.
  pub async fn run(self, ctx: ShutdownContext) -> SluiceResult<bool> {
    self.run_with_signal(ctx, termination_signal()).await
  }

  /// Same as [`Pipeline::run`], with `signal` standing in for the OS termination signals.
  #[instrument(
        name = "Pipeline::run",
        skip_all,
        fields(num_stages = self.stage_names().len()),
        err(Display)
    )]
  pub async fn run_with_signal<F>(self, ctx: ShutdownContext, signal: F) -> SluiceResult<bool>
  where
    F: Future<Output = ()> + Send + 'static,
  {
    let wired = self.build()?;
    event!(Level::DEBUG, "Pipeline execution starting.");
    let started = bootstrap::run_with_signal(ctx, wired.into_handles(), signal).await;
    event!(Level::DEBUG, started, "Pipeline execution finished.");
    Ok(started)
  }
}
