// provenance_app/src/main.rs

mod collaborators;
mod config;
mod errors;
mod models;

use crate::collaborators::{DigestAnnotator, LinePublisher, ReseedMutator, SampleSource};
use crate::config::AppConfig;
use crate::errors::Result;
use clap::Parser;
use sluice::{Pipeline, ShutdownContext};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Generates signed sample records, mutates them and streams them out, recording a
/// provenance annotation at every step. Stops cleanly on SIGINT/SIGTERM.
#[derive(Debug, Parser)]
#[command(name = "provenance_app", version, about)]
struct Cli {
  /// Path to the JSON configuration file.
  #[arg(long = "cfg", default_value = "./res/config.json")]
  cfg: PathBuf,
}

fn init_logging(directive: &str) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
  tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

fn build_pipeline(config: &AppConfig) -> Pipeline {
  let publisher = Arc::new(LinePublisher::new(
    config.stream.clone(),
    Arc::new(DigestAnnotator::new("transit")),
  ));
  Pipeline::new(config.pipeline.clone())
    .with_bootstrap(publisher.bootstrap_handle())
    .source(
      "create",
      SampleSource::new(config.signature.clone()),
      Arc::new(DigestAnnotator::new("create")),
    )
    .transform(
      "mutate",
      ReseedMutator::new(config.signature.clone(), Arc::new(DigestAnnotator::new("mutate"))),
    )
    .sink("transit", publisher)
}

async fn run(config: AppConfig) -> Result<bool> {
  let pipeline = build_pipeline(&config);
  tracing::info!(stages = ?pipeline.stage_names(), output = %config.stream.output, "Starting pipeline.");

  let ctx = ShutdownContext::new();
  Ok(pipeline.run(ctx).await?)
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();

  let config = match AppConfig::from_file(&cli.cfg) {
    Ok(config) => config,
    Err(error) => {
      init_logging("error");
      tracing::error!(path = %cli.cfg.display(), error = %error, "Failed to load configuration.");
      return ExitCode::FAILURE;
    }
  };
  init_logging(&config.logging.min_level);

  match run(config).await {
    Ok(true) => {
      tracing::info!("Pipeline stopped cleanly.");
      ExitCode::SUCCESS
    }
    Ok(false) => {
      tracing::error!("Pipeline failed to start.");
      ExitCode::FAILURE
    }
    Err(error) => {
      tracing::error!(error = %error, "Pipeline terminated with an error.");
      ExitCode::FAILURE
    }
  }
}
