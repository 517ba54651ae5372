// sluice/src/bootstrap/runner.rs

//! Contains the bootstrap entry points, responsible for starting every handle in order
//! and blocking until the whole process has wound down.

use crate::bootstrap::shutdown::{termination_signal, translate_to_cancel};
use crate::core::context::ShutdownContext;
use crate::core::join_group::JoinGroup;
use crate::stage::StageHandle;
use std::future::Future;
use tracing::{event, instrument, Level};

/// Bootstraps `handles` with SIGINT/SIGTERM wired to `ctx`, then waits for every task.
///
/// Returns `true` if all handles started. On the first handle that reports failure the
/// context is cancelled, the remaining handles are never invoked, and this returns
/// `false` once the already started stages have unwound. Mapping that to an exit code
/// is up to the caller.
pub async fn run(ctx: ShutdownContext, handles: Vec<StageHandle>) -> bool {
  run_with_signal(ctx, handles, termination_signal()).await
}

/// Same as [`run`], with `signal` standing in for the OS termination signals.
#[instrument(name = "bootstrap::run", skip_all, fields(num_handles = handles.len()))]
pub async fn run_with_signal<F>(ctx: ShutdownContext, handles: Vec<StageHandle>, signal: F) -> bool
where
  F: Future<Output = ()> + Send + 'static,
{
  let (group, started_successfully) = init_join_group(&ctx, handles, signal);
  event!(Level::DEBUG, outstanding = group.outstanding(), "Bootstrap finished; waiting for tasks.");
  group.wait().await;
  event!(Level::INFO, started_successfully, "All tasks exited.");
  started_successfully
}

/// The first half of [`run_with_signal`]: starts the signal listener and invokes the
/// handles in order, stopping at the first failure. Returns the join group every task
/// was registered on together with the startup outcome.
///
/// Must be called from within a tokio runtime.
pub fn init_join_group<F>(ctx: &ShutdownContext, handles: Vec<StageHandle>, signal: F) -> (JoinGroup, bool)
where
  F: Future<Output = ()> + Send + 'static,
{
  let group = JoinGroup::new();
  let mut started_successfully = true;

  translate_to_cancel(ctx, &group, signal);
  for (index, handle) in handles.into_iter().enumerate() {
    if !handle(ctx, &group) {
      event!(Level::ERROR, handle_index = index, "Bootstrap handle failed to start; cancelling.");
      ctx.cancel();
      started_successfully = false;
      break;
    }
    event!(Level::DEBUG, handle_index = index, "Bootstrap handle started.");
  }

  (group, started_successfully)
}
