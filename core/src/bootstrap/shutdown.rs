// sluice/src/bootstrap/shutdown.rs

use crate::core::context::ShutdownContext;
use crate::core::join_group::JoinGroup;
use std::future::Future;
use tracing::{event, Level};

/// Spawns the listener that cancels `ctx` when the process receives SIGINT or SIGTERM
/// (Ctrl-C on non-unix targets).
pub fn translate_interrupt_to_cancel(ctx: &ShutdownContext, group: &JoinGroup) {
  translate_to_cancel(ctx, group, termination_signal());
}

/// Spawns one listener task, tracked by `group`, that waits for either `signal` or
/// `ctx` being done.
///
/// * `signal` resolves first: the listener cancels `ctx` and exits.
/// * `ctx` is done first: the listener exits without cancelling.
///
/// `signal` is dropped before the listener finishes, releasing any OS handlers it holds.
pub fn translate_to_cancel<F>(ctx: &ShutdownContext, group: &JoinGroup, signal: F)
where
  F: Future<Output = ()> + Send + 'static,
{
  let ctx = ctx.clone();
  group.spawn("signal_listener", async move {
    tokio::select! {
      _ = signal => {
        event!(Level::INFO, "Termination requested; cancelling shutdown context.");
        ctx.cancel();
      }
      _ = ctx.done() => {
        event!(Level::DEBUG, "Shutdown context already done; signal listener exiting.");
      }
    }
  });
}

/// Resolves when the process is asked to terminate.
///
/// If the handlers cannot be installed the error is logged and the future never
/// resolves, leaving cancellation to other parties.
pub async fn termination_signal() {
  match wait_for_termination().await {
    Ok(signal) => event!(Level::INFO, signal, "Received termination signal."),
    Err(error) => {
      event!(Level::ERROR, error = %error, "Failed to register signal handlers.");
      std::future::pending::<()>().await;
    }
  }
}

#[cfg(unix)]
async fn wait_for_termination() -> std::io::Result<&'static str> {
  use tokio::signal::unix::{signal, SignalKind};

  let mut sigint = signal(SignalKind::interrupt())?;
  let mut sigterm = signal(SignalKind::terminate())?;
  tokio::select! {
    _ = sigint.recv() => Ok("SIGINT"),
    _ = sigterm.recv() => Ok("SIGTERM"),
  }
}

#[cfg(not(unix))]
async fn wait_for_termination() -> std::io::Result<&'static str> {
  tokio::signal::ctrl_c().await?;
  Ok("ctrl-c")
}
