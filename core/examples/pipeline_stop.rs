// sluice/examples/pipeline_stop.rs

//! Demonstrates fail-fast startup: the sink's transport is not reachable, so the
//! bootstrap cancels the stages that already started and returns `false`.

use async_trait::async_trait;
use sluice::{NoopAnnotator, Passthrough, Payload, Pipeline, PipelineConfig, Publisher, RecordSource, ShutdownContext};
use tracing::{error, info};

struct Constant;

#[async_trait]
impl RecordSource for Constant {
  async fn generate(&self) -> anyhow::Result<Payload> {
    Ok(Payload::from("constant"))
  }
}

struct Unreachable;

#[async_trait]
impl Publisher for Unreachable {
  fn ready(&self) -> anyhow::Result<()> {
    anyhow::bail!("broker at tcp://127.0.0.1:1883 refused the connection")
  }

  async fn publish(&self, _payload: Payload) -> anyhow::Result<()> {
    Ok(())
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();
  info!("--- Pipeline Startup Failure Example ---");

  let config = PipelineConfig {
    tick_interval_ms: 100,
    ..PipelineConfig::default()
  };
  let started = Pipeline::new(config)
    .source("constant", Constant, NoopAnnotator)
    .transform("identity", Passthrough)
    .sink("unreachable", Unreachable)
    .run(ShutdownContext::new())
    .await?;

  if started {
    error!("Pipeline started, but the sink was expected to refuse!");
  } else {
    info!("Startup failed as expected; every started stage has unwound.");
  }
  assert!(!started);
  Ok(())
}
