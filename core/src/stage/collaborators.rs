// sluice/src/stage/collaborators.rs

//! The external collaborators a pipeline is built from.
//!
//! Stages only know these contracts: something that produces bytes, something that
//! observes them, something that rewrites them and something that ships them out.
//! Errors are plain `anyhow::Error`s; the stages log them and skip the iteration.

use crate::core::payload::Payload;
use async_trait::async_trait;
use std::sync::Arc;

/// Produces one record per call. Used by the generator stage.
#[async_trait]
pub trait RecordSource: Send + Sync + 'static {
  /// Checked once when the stage starts. An error here is a startup failure.
  fn ready(&self) -> anyhow::Result<()> {
    Ok(())
  }

  async fn generate(&self) -> anyhow::Result<Payload>;
}

/// Side-effecting observer of every generated record (provenance, audit, metrics).
///
/// Called fire-and-forget: the pipeline never waits on it before forwarding the record
/// and only logs its failures.
#[async_trait]
pub trait Annotator: Send + Sync + 'static {
  async fn annotate(&self, payload: &Payload) -> anyhow::Result<()>;
}

/// Rewrites a record on its way through a transformer stage.
#[async_trait]
pub trait Mutator: Send + Sync + 'static {
  async fn mutate(&self, payload: Payload) -> anyhow::Result<Payload>;
}

/// Hands records to the downstream transport. Used by the sink stage.
#[async_trait]
pub trait Publisher: Send + Sync + 'static {
  /// Checked once when the stage starts. An error here is a startup failure.
  fn ready(&self) -> anyhow::Result<()> {
    Ok(())
  }

  async fn publish(&self, payload: Payload) -> anyhow::Result<()>;
}

/// Annotator that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnnotator;

#[async_trait]
impl Annotator for NoopAnnotator {
  async fn annotate(&self, _payload: &Payload) -> anyhow::Result<()> {
    Ok(())
  }
}

/// Mutator that forwards records unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl Mutator for Passthrough {
  async fn mutate(&self, payload: Payload) -> anyhow::Result<Payload> {
    Ok(payload)
  }
}

// Shared collaborators: one instance behind an `Arc` may serve several stages.

#[async_trait]
impl<T: RecordSource + ?Sized> RecordSource for Arc<T> {
  fn ready(&self) -> anyhow::Result<()> {
    (**self).ready()
  }

  async fn generate(&self) -> anyhow::Result<Payload> {
    (**self).generate().await
  }
}

#[async_trait]
impl<T: Annotator + ?Sized> Annotator for Arc<T> {
  async fn annotate(&self, payload: &Payload) -> anyhow::Result<()> {
    (**self).annotate(payload).await
  }
}

#[async_trait]
impl<T: Mutator + ?Sized> Mutator for Arc<T> {
  async fn mutate(&self, payload: Payload) -> anyhow::Result<Payload> {
    (**self).mutate(payload).await
  }
}

#[async_trait]
impl<T: Publisher + ?Sized> Publisher for Arc<T> {
  fn ready(&self) -> anyhow::Result<()> {
    (**self).ready()
  }

  async fn publish(&self, payload: Payload) -> anyhow::Result<()> {
    (**self).publish(payload).await
  }
}
