// provenance_app/src/collaborators/publisher.rs

use crate::collaborators::DigestAnnotator;
use crate::config::StreamInfo;
use crate::errors::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use sluice::{stage_handle, Annotator, JoinGroup, Payload, Publisher, ShutdownContext, StageHandle};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Arc;

type Output = Box<dyn Write + Send>;
type SharedOutput = Arc<Mutex<Option<Output>>>;

/// Writes each record as one line to stdout or to an append-only file, standing in for
/// a stream transport. The output is opened by the bootstrap handle, before any stage
/// starts; if it cannot be opened the whole bootstrap fails.
///
/// Writes and flushes are blocking `std::io` calls and run on tokio's blocking pool.
pub struct LinePublisher {
  stream: StreamInfo,
  output: SharedOutput,
  annotator: Arc<DigestAnnotator>,
}

impl LinePublisher {
  pub fn new(stream: StreamInfo, annotator: Arc<DigestAnnotator>) -> Self {
    Self {
      stream,
      output: Arc::new(Mutex::new(None)),
      annotator,
    }
  }

  fn open(&self) -> Result<Output> {
    if self.stream.output == "stdout" {
      return Ok(Box::new(io::stdout()));
    }
    let file = OpenOptions::new().create(true).append(true).open(&self.stream.output)?;
    Ok(Box::new(io::BufWriter::new(file)))
  }

  /// Connects the output and registers a task that flushes it once shutdown begins.
  pub fn bootstrap_handle(self: &Arc<Self>) -> StageHandle {
    let publisher = Arc::clone(self);
    stage_handle(move |ctx: &ShutdownContext, group: &JoinGroup| {
      let output = match publisher.open() {
        Ok(output) => output,
        Err(error) => {
          tracing::error!(output = %publisher.stream.output, error = %error, "Failed to open stream output.");
          return false;
        }
      };
      *publisher.output.lock() = Some(output);
      tracing::info!(output = %publisher.stream.output, "Stream output connected.");

      let ctx = ctx.clone();
      group.spawn("stream_shutdown", async move {
        ctx.done().await;
        tracing::info!("Stream shutdown received; flushing output.");
        let output = Arc::clone(&publisher.output);
        match tokio::task::spawn_blocking(move || flush_output(&output)).await {
          Ok(Ok(())) => {}
          Ok(Err(error)) => tracing::error!(error = %error, "Failed to flush stream output."),
          Err(error) => tracing::error!(error = %error, "Flush task did not complete."),
        }
      });
      true
    })
  }
}

fn flush_output(output: &Mutex<Option<Output>>) -> io::Result<()> {
  match output.lock().as_mut() {
    Some(output) => output.flush(),
    None => Ok(()),
  }
}

fn write_line(output: &Mutex<Option<Output>>, target: &str, payload: &Payload) -> anyhow::Result<()> {
  let mut guard = output.lock();
  let output = guard
    .as_mut()
    .ok_or_else(|| anyhow::anyhow!("stream output '{}' is not connected", target))?;
  output.write_all(payload)?;
  output.write_all(b"\n")?;
  output.flush()?;
  Ok(())
}

#[async_trait]
impl Publisher for LinePublisher {
  fn ready(&self) -> anyhow::Result<()> {
    if self.output.lock().is_none() {
      anyhow::bail!("stream output '{}' is not connected", self.stream.output);
    }
    Ok(())
  }

  async fn publish(&self, payload: Payload) -> anyhow::Result<()> {
    let output = Arc::clone(&self.output);
    let target = self.stream.output.clone();
    let line = payload.clone();
    tokio::task::spawn_blocking(move || write_line(&output, &target, &line)).await??;

    if let Err(error) = self.annotator.annotate(&payload).await {
      tracing::error!(error = %error, "Transit annotation failed.");
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn file_publisher(path: &std::path::Path) -> Arc<LinePublisher> {
    Arc::new(LinePublisher::new(
      StreamInfo {
        output: path.display().to_string(),
      },
      Arc::new(DigestAnnotator::new("transit")),
    ))
  }

  #[tokio::test]
  async fn not_ready_until_bootstrapped() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = file_publisher(&dir.path().join("out.jsonl"));
    assert!(publisher.ready().is_err());

    let ctx = ShutdownContext::new();
    let group = JoinGroup::new();
    assert!((publisher.bootstrap_handle())(&ctx, &group));
    assert!(publisher.ready().is_ok());

    ctx.cancel();
    group.wait().await;
  }

  #[tokio::test]
  async fn writes_one_line_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.jsonl");
    let publisher = file_publisher(&path);
    let ctx = ShutdownContext::new();
    let group = JoinGroup::new();
    assert!((publisher.bootstrap_handle())(&ctx, &group));

    publisher.publish(Payload::from(r#"{"seed":"a"}"#)).await.unwrap();
    publisher.publish(Payload::from(r#"{"seed":"b"}"#)).await.unwrap();
    ctx.cancel();
    group.wait().await;

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written.lines().collect::<Vec<_>>(), vec![r#"{"seed":"a"}"#, r#"{"seed":"b"}"#]);
  }

  #[tokio::test]
  async fn publish_before_bootstrap_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.jsonl");
    let publisher = file_publisher(&path);
    let error = publisher.publish(Payload::from("early")).await.unwrap_err();
    assert!(error.to_string().contains("not connected"));
    assert!(!path.exists());
  }

  #[tokio::test]
  async fn unopenable_output_fails_the_bootstrap_handle() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = file_publisher(&dir.path().join("missing").join("out.jsonl"));
    let ctx = ShutdownContext::new();
    let group = JoinGroup::new();
    assert!(!(publisher.bootstrap_handle())(&ctx, &group));
    assert_eq!(group.outstanding(), 0);
  }
}
