// sluice/examples/basic_pipeline.rs

use async_trait::async_trait;
use sluice::{Mutator, NoopAnnotator, Payload, Pipeline, PipelineConfig, Publisher, RecordSource, ShutdownContext};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

// 1. Define the collaborators
#[derive(Default)]
struct Counter {
  next: AtomicU64,
}

#[async_trait]
impl RecordSource for Counter {
  async fn generate(&self) -> anyhow::Result<Payload> {
    let n = self.next.fetch_add(1, Ordering::Relaxed);
    Ok(Payload::from(format!("tick {}", n)))
  }
}

struct Shout;

#[async_trait]
impl Mutator for Shout {
  async fn mutate(&self, payload: Payload) -> anyhow::Result<Payload> {
    Ok(Payload::from(String::from_utf8(payload.to_vec())?.to_uppercase()))
  }
}

struct Print;

#[async_trait]
impl Publisher for Print {
  async fn publish(&self, payload: Payload) -> anyhow::Result<()> {
    info!(record = %String::from_utf8_lossy(&payload), "Published.");
    Ok(())
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Basic Pipeline Example (Ctrl-C to stop) ---");

  // 2. Wire generator -> transformer -> sink
  let config = PipelineConfig {
    tick_interval_ms: 250,
    ..PipelineConfig::default()
  };
  let pipeline = Pipeline::new(config)
    .source("counter", Counter::default(), NoopAnnotator)
    .transform("shout", Shout)
    .sink("print", Print);

  // 3. Run until SIGINT/SIGTERM
  let started = pipeline.run(ShutdownContext::new()).await?;
  info!(started, "Pipeline finished.");
  Ok(())
}
