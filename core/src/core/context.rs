// sluice/src/core/context.rs

//! Defines `ShutdownContext`, the single process-wide cancellation token shared by
//! every stage, the signal listener and the bootstrap runner.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{event, Level};

/// A cloneable, once-only cancellation broadcast.
///
/// All clones observe the same state. The context starts "not done" and moves to
/// "done" the first time [`ShutdownContext::cancel`] is called; it never goes back.
/// Create one per process (or per test) and hand clones to every component.
#[derive(Debug, Clone)]
pub struct ShutdownContext {
  inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
  done: watch::Sender<bool>,
  cancel_requests: AtomicUsize,
}

impl ShutdownContext {
  pub fn new() -> Self {
    let (done, _) = watch::channel(false);
    Self {
      inner: Arc::new(ContextInner {
        done,
        cancel_requests: AtomicUsize::new(0),
      }),
    }
  }

  /// Marks the context as done and wakes every waiter.
  ///
  /// Safe to call any number of times from any task. Returns `true` only for the
  /// call that performed the transition; every later call is a no-op returning `false`.
  pub fn cancel(&self) -> bool {
    self.inner.cancel_requests.fetch_add(1, Ordering::SeqCst);
    let transitioned = self.inner.done.send_if_modified(|done| {
      if *done {
        false
      } else {
        *done = true;
        true
      }
    });
    if transitioned {
      event!(Level::DEBUG, "Shutdown context cancelled.");
    } else {
      event!(Level::TRACE, "Cancel requested on an already cancelled context; ignoring.");
    }
    transitioned
  }

  /// Non-blocking check of the done flag.
  pub fn is_done(&self) -> bool {
    *self.inner.done.borrow()
  }

  /// Resolves once the context is cancelled (immediately if it already is).
  ///
  /// Cancel-safe: dropping the future before completion has no effect on the context.
  pub async fn done(&self) {
    let mut rx = self.inner.done.subscribe();
    // The sender lives as long as `self`, so this can only end by observing `true`.
    let _ = rx.wait_for(|done| *done).await;
  }

  /// How many times `cancel` has been invoked, including the no-op calls.
  pub fn cancel_requests(&self) -> usize {
    self.inner.cancel_requests.load(Ordering::SeqCst)
  }
}

impl Default for ShutdownContext {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn cancel_is_idempotent() {
    let ctx = ShutdownContext::new();
    assert!(!ctx.is_done());
    assert!(ctx.cancel());
    assert!(!ctx.cancel());
    assert!(ctx.is_done());
    assert_eq!(ctx.cancel_requests(), 2);
  }

  #[tokio::test]
  async fn done_wakes_clones() {
    let ctx = ShutdownContext::new();
    let waiter = {
      let ctx = ctx.clone();
      tokio::spawn(async move { ctx.done().await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(!waiter.is_finished());
    ctx.clone().cancel();
    tokio::time::timeout(Duration::from_secs(1), waiter)
      .await
      .expect("waiter should wake")
      .unwrap();
  }

  #[tokio::test]
  async fn done_resolves_immediately_after_cancel() {
    let ctx = ShutdownContext::new();
    ctx.cancel();
    tokio::time::timeout(Duration::from_millis(50), ctx.done())
      .await
      .expect("already-done context must resolve at once");
  }
}
