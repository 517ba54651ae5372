// sluice/src/core/control.rs

//! Lifecycle states of a stage worker and a shared, observable status record.

use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;
use tracing::{event, Level};

/// Where a stage worker is in its shutdown sequence.
///
/// Transitions only move forward: `Running -> Draining -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StageState {
  /// Producing, transforming or consuming payloads.
  Running,
  /// Stop observed (or upstream finished); flushing what is still in flight and
  /// closing the outbound channel.
  Draining,
  /// The worker has exited. Its outbound channel, if any, is closed.
  Stopped,
}

/// Snapshot of a stage's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
  pub stage: String,
  pub state: StageState,
  /// Payloads successfully handed on (sent downstream, or published for a sink).
  pub processed: u64,
  /// Iterations skipped because a collaborator failed.
  pub failed: u64,
}

/// A shared handle onto a stage's [`StageReport`], updated by the stage worker and
/// readable from anywhere.
///
/// Lock guards are blocking and must not be held across `.await` points.
#[derive(Debug, Clone)]
pub struct StageStatus(Arc<RwLock<StageReport>>);

impl StageStatus {
  pub fn new(stage: impl Into<String>) -> Self {
    StageStatus(Arc::new(RwLock::new(StageReport {
      stage: stage.into(),
      state: StageState::Running,
      processed: 0,
      failed: 0,
    })))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, StageReport> {
    self.0.read()
  }

  pub fn snapshot(&self) -> StageReport {
    self.0.read().clone()
  }

  pub fn state(&self) -> StageState {
    self.0.read().state
  }

  pub fn processed(&self) -> u64 {
    self.0.read().processed
  }

  pub fn failed(&self) -> u64 {
    self.0.read().failed
  }

  /// Moves the stage forward to `next`. Backward or repeated transitions are ignored
  /// and return `false`.
  pub(crate) fn advance(&self, next: StageState) -> bool {
    let mut report = self.0.write();
    if next <= report.state {
      return false;
    }
    event!(Level::DEBUG, stage = %report.stage, from = ?report.state, to = ?next, "Stage state transition.");
    report.state = next;
    true
  }

  pub(crate) fn record_processed(&self) {
    self.0.write().processed += 1;
  }

  pub(crate) fn record_failure(&self) {
    self.0.write().failed += 1;
  }
}
