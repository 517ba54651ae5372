// provenance_app/src/collaborators/mutator.rs

use crate::collaborators::DigestAnnotator;
use crate::config::SignatureInfo;
use crate::models::{load_signing_key, SampleData};
use async_trait::async_trait;
use sluice::{Annotator, Mutator, Payload};
use std::sync::Arc;

/// Simulates an intermediary that rewrites records: the description and seed are
/// replaced and the seed re-signed. The rewritten record is annotated as `mutate`.
pub struct ReseedMutator {
  signature: SignatureInfo,
  annotator: Arc<DigestAnnotator>,
}

impl ReseedMutator {
  pub fn new(signature: SignatureInfo, annotator: Arc<DigestAnnotator>) -> Self {
    Self { signature, annotator }
  }
}

#[async_trait]
impl Mutator for ReseedMutator {
  async fn mutate(&self, payload: Payload) -> anyhow::Result<Payload> {
    let mut sample: SampleData = serde_json::from_slice(&payload)?;
    let key = load_signing_key(&self.signature.private_key_path)?;
    sample.reseed(&key);
    let mutated = Payload::from(serde_json::to_vec(&sample)?);
    if let Err(error) = self.annotator.annotate(&mutated).await {
      tracing::error!(error = %error, "Mutate annotation failed.");
    }
    Ok(mutated)
  }
}
