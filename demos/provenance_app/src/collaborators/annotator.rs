// provenance_app/src/collaborators/annotator.rs

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use sluice::{Annotator, Payload};

/// Records a SHA-256 digest and a timestamp for every record it sees, tagged with
/// the pipeline action (`create`, `mutate`, `transit`).
#[derive(Debug)]
pub struct DigestAnnotator {
  action: &'static str,
}

impl DigestAnnotator {
  pub fn new(action: &'static str) -> Self {
    Self { action }
  }

  pub fn digest(payload: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(payload)))
  }
}

#[async_trait]
impl Annotator for DigestAnnotator {
  async fn annotate(&self, payload: &Payload) -> anyhow::Result<()> {
    if payload.is_empty() {
      anyhow::bail!("refusing to annotate an empty record");
    }
    let digest = Self::digest(payload);
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    tracing::info!(action = self.action, %digest, %timestamp, "Record annotated.");
    Ok(())
  }
}
