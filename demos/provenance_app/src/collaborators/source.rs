// provenance_app/src/collaborators/source.rs

use crate::config::SignatureInfo;
use crate::models::{load_signing_key, SampleData};
use async_trait::async_trait;
use sluice::{Payload, RecordSource};

/// Generates signed [`SampleData`] records, JSON encoded.
///
/// The key file is read on every call so a key that disappears or changes while running
/// only fails the affected iterations.
#[derive(Debug, Clone)]
pub struct SampleSource {
  signature: SignatureInfo,
}

impl SampleSource {
  pub fn new(signature: SignatureInfo) -> Self {
    Self { signature }
  }
}

#[async_trait]
impl RecordSource for SampleSource {
  fn ready(&self) -> anyhow::Result<()> {
    load_signing_key(&self.signature.private_key_path)?;
    Ok(())
  }

  async fn generate(&self) -> anyhow::Result<Payload> {
    let key = load_signing_key(&self.signature.private_key_path)?;
    let sample = SampleData::new(&key);
    Ok(Payload::from(serde_json::to_vec(&sample)?))
  }
}
