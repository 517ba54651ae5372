// sluice/src/core/join_group.rs

//! `JoinGroup`: a counter of outstanding tasks that the bootstrap runner waits on.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{event, Instrument, Level};

/// Tracks every task started by the bootstrap (signal listener, stage workers and
/// watchers, annotation calls) so the runner can block until all of them are gone.
///
/// The counter is incremented by [`JoinGroup::add`] *before* a task is spawned and
/// decremented when the returned [`JoinTicket`] is dropped. Because the ticket lives
/// inside the task's future, a task that panics still releases its slot.
#[derive(Debug, Clone, Default)]
pub struct JoinGroup {
  inner: Arc<GroupInner>,
}

#[derive(Debug, Default)]
struct GroupInner {
  outstanding: AtomicUsize,
  drained: Notify,
}

/// One outstanding slot in a [`JoinGroup`]. Dropping it marks the task finished.
#[must_use = "dropping a JoinTicket immediately releases its slot"]
#[derive(Debug)]
pub struct JoinTicket {
  group: Arc<GroupInner>,
}

impl JoinGroup {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reserves a slot. Call this before handing work to another task.
  pub fn add(&self) -> JoinTicket {
    self.inner.outstanding.fetch_add(1, Ordering::SeqCst);
    JoinTicket {
      group: Arc::clone(&self.inner),
    }
  }

  /// Reserves a slot, then spawns `future` on the current tokio runtime holding it.
  ///
  /// Must be called from within a runtime context.
  pub fn spawn<F>(&self, task: &'static str, future: F) -> JoinHandle<()>
  where
    F: Future<Output = ()> + Send + 'static,
  {
    let ticket = self.add();
    event!(Level::TRACE, task, outstanding = self.outstanding(), "Spawning tracked task.");
    tokio::spawn(
      async move {
        let _ticket = ticket;
        future.await;
        event!(Level::TRACE, "Tracked task finished.");
      }
      .instrument(tracing::debug_span!("tracked_task", task)),
    )
  }

  pub fn outstanding(&self) -> usize {
    self.inner.outstanding.load(Ordering::SeqCst)
  }

  /// Resolves once no tickets are outstanding.
  pub async fn wait(&self) {
    loop {
      let notified = self.inner.drained.notified();
      tokio::pin!(notified);
      // Register interest before reading the counter so a release in between is not missed.
      notified.as_mut().enable();
      if self.outstanding() == 0 {
        return;
      }
      notified.await;
    }
  }
}

impl Drop for JoinTicket {
  fn drop(&mut self) {
    if self.group.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
      self.group.drained.notify_waiters();
    }
  }
}
