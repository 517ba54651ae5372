// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice::{Annotator, Mutator, Payload, PipelineConfig, Publisher, RecordSource};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration;
use tracing::Level;

// --- Common Collaborators ---

/// Produces `record-0`, `record-1`, ... Optionally fails every `fail_every`-th call.
#[derive(Debug, Default)]
pub struct SequenceSource {
  next: AtomicUsize,
  fail_every: Option<usize>,
  not_ready: bool,
}

impl SequenceSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing_every(n: usize) -> Self {
    Self {
      fail_every: Some(n),
      ..Self::default()
    }
  }

  pub fn not_ready() -> Self {
    Self {
      not_ready: true,
      ..Self::default()
    }
  }

  pub fn calls(&self) -> usize {
    self.next.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl RecordSource for SequenceSource {
  fn ready(&self) -> anyhow::Result<()> {
    if self.not_ready {
      anyhow::bail!("key material unavailable");
    }
    Ok(())
  }

  async fn generate(&self) -> anyhow::Result<Payload> {
    let n = self.next.fetch_add(1, Ordering::SeqCst);
    if let Some(every) = self.fail_every {
      if (n + 1) % every == 0 {
        anyhow::bail!("generation {} failed on purpose", n);
      }
    }
    Ok(Payload::from(format!("record-{}", n)))
  }
}

/// Counts annotate calls.
#[derive(Debug, Default)]
pub struct CountingAnnotator {
  pub calls: AtomicUsize,
}

#[async_trait]
impl Annotator for CountingAnnotator {
  async fn annotate(&self, _payload: &Payload) -> anyhow::Result<()> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

/// Always fails to annotate.
#[derive(Debug, Default)]
pub struct BrokenAnnotator;

#[async_trait]
impl Annotator for BrokenAnnotator {
  async fn annotate(&self, _payload: &Payload) -> anyhow::Result<()> {
    anyhow::bail!("annotation backend offline")
  }
}

/// Appends `|<tag>` to every record and remembers what it saw.
#[derive(Debug)]
pub struct TaggingMutator {
  tag: &'static str,
  pub seen: Mutex<Vec<Payload>>,
  reject_containing: Option<&'static str>,
  delay: Option<Duration>,
}

impl TaggingMutator {
  pub fn new(tag: &'static str) -> Self {
    Self {
      tag,
      seen: Mutex::new(Vec::new()),
      reject_containing: None,
      delay: None,
    }
  }

  /// Takes `delay` per record, so upstream is kept waiting on the handoff.
  pub fn slow(tag: &'static str, delay: Duration) -> Self {
    Self {
      delay: Some(delay),
      ..Self::new(tag)
    }
  }

  pub fn rejecting(tag: &'static str, needle: &'static str) -> Self {
    Self {
      reject_containing: Some(needle),
      ..Self::new(tag)
    }
  }
}

#[async_trait]
impl Mutator for TaggingMutator {
  async fn mutate(&self, payload: Payload) -> anyhow::Result<Payload> {
    self.seen.lock().push(payload.clone());
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    let text = String::from_utf8(payload.to_vec())?;
    if let Some(needle) = self.reject_containing {
      if text.ends_with(needle) {
        anyhow::bail!("refusing to transform '{}'", text);
      }
    }
    Ok(Payload::from(format!("{}|{}", text, self.tag)))
  }
}

/// Stores every published record in arrival order.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
  pub published: Mutex<Vec<Payload>>,
  pub attempts: AtomicUsize,
  fail_first: usize,
  not_ready: bool,
}

impl RecordingPublisher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing_first(n: usize) -> Self {
    Self {
      fail_first: n,
      ..Self::default()
    }
  }

  pub fn not_ready() -> Self {
    Self {
      not_ready: true,
      ..Self::default()
    }
  }

  pub fn count(&self) -> usize {
    self.published.lock().len()
  }

  pub fn texts(&self) -> Vec<String> {
    self
      .published
      .lock()
      .iter()
      .map(|p| String::from_utf8_lossy(p.as_bytes()).into_owned())
      .collect()
  }
}

#[async_trait]
impl Publisher for RecordingPublisher {
  fn ready(&self) -> anyhow::Result<()> {
    if self.not_ready {
      anyhow::bail!("transport not connected");
    }
    Ok(())
  }

  async fn publish(&self, payload: Payload) -> anyhow::Result<()> {
    let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
    if attempt < self.fail_first {
      anyhow::bail!("publish attempt {} rejected", attempt);
    }
    self.published.lock().push(payload);
    Ok(())
  }
}

// --- Config helpers ---

pub fn fast_config(tick_ms: u64) -> PipelineConfig {
  PipelineConfig {
    tick_interval_ms: tick_ms,
    poll_interval_ms: 5,
    drain_timeout_ms: 200,
    channel_capacity: 0,
  }
}

/// Polls `condition` every millisecond until it holds or `limit` elapses.
pub async fn wait_until<F: Fn() -> bool>(condition: F, limit: Duration) -> bool {
  let deadline = tokio::time::Instant::now() + limit;
  while tokio::time::Instant::now() < deadline {
    if condition() {
      return true;
    }
    tokio::time::sleep(Duration::from_millis(1)).await;
  }
  condition()
}

pub fn shared<T>(value: T) -> Arc<T> {
  Arc::new(value)
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
