// provenance_app/src/models/sample.rs

use crate::errors::{AppError, Result};
use ed25519_dalek::{Signer, SigningKey};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

const ALPHANUMERIC_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const DESCRIPTION_LEN: usize = 128;
const SEED_LEN: usize = 64;

/// The record this app pushes through the pipeline: random text plus an Ed25519
/// signature (hex) over the seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleData {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub description: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub seed: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub signature: String,
}

impl SampleData {
  pub fn new(key: &SigningKey) -> Self {
    let mut sample = SampleData {
      description: String::new(),
      seed: String::new(),
      signature: String::new(),
    };
    sample.reseed(key);
    sample
  }

  /// Replaces description and seed with fresh random text and re-signs.
  pub fn reseed(&mut self, key: &SigningKey) {
    let mut rng = rand::thread_rng();
    self.description = random_fixed_length_string(&mut rng, DESCRIPTION_LEN);
    self.seed = random_fixed_length_string(&mut rng, SEED_LEN);
    self.signature = hex::encode(key.sign(self.seed.as_bytes()).to_bytes());
  }
}

fn random_fixed_length_string<R: Rng>(rng: &mut R, length: usize) -> String {
  (0..length)
    .map(|_| ALPHANUMERIC_CHARSET[rng.gen_range(0..ALPHANUMERIC_CHARSET.len())] as char)
    .collect()
}

/// Reads a hex encoded Ed25519 secret key: either the 32 byte seed or the 64 byte
/// seed-plus-public-key form.
pub fn load_signing_key(path: &Path) -> Result<SigningKey> {
  let raw = std::fs::read_to_string(path)
    .map_err(|e| AppError::Key(format!("cannot read key file '{}': {}", path.display(), e)))?;
  let bytes = hex::decode(raw.trim()).map_err(|e| AppError::Key(format!("key is not valid hex: {}", e)))?;

  match bytes.len() {
    32 => {
      let mut seed = [0u8; 32];
      seed.copy_from_slice(&bytes);
      Ok(SigningKey::from_bytes(&seed))
    }
    64 => {
      let mut keypair = [0u8; 64];
      keypair.copy_from_slice(&bytes);
      SigningKey::from_keypair_bytes(&keypair).map_err(|e| AppError::Key(format!("inconsistent keypair: {}", e)))
    }
    other => Err(AppError::Key(format!(
      "invalid key length: expected 32 or 64 bytes, got {}",
      other
    ))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ed25519_dalek::{Signature, Verifier};
  use std::io::Write;

  fn test_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
  }

  #[test]
  fn sample_has_fixed_lengths_and_a_valid_signature() {
    let key = test_key();
    let sample = SampleData::new(&key);
    assert_eq!(sample.description.len(), DESCRIPTION_LEN);
    assert_eq!(sample.seed.len(), SEED_LEN);
    assert!(sample.seed.bytes().all(|b| b.is_ascii_alphanumeric()));

    let sig_bytes: [u8; 64] = hex::decode(&sample.signature).unwrap().try_into().unwrap();
    let signature = Signature::from_bytes(&sig_bytes);
    assert!(key.verifying_key().verify(sample.seed.as_bytes(), &signature).is_ok());
  }

  #[test]
  fn reseed_changes_content() {
    let key = test_key();
    let mut sample = SampleData::new(&key);
    let before = sample.clone();
    sample.reseed(&key);
    assert_ne!(before.seed, sample.seed);
    assert_ne!(before.signature, sample.signature);
  }

  #[test]
  fn json_uses_lowercase_field_names() {
    let sample = SampleData::new(&test_key());
    let json: serde_json::Value = serde_json::to_value(&sample).unwrap();
    assert!(json.get("description").is_some());
    assert!(json.get("seed").is_some());
    assert!(json.get("signature").is_some());
  }

  #[test]
  fn loads_seed_and_keypair_forms() {
    let key = test_key();
    let mut seed_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(seed_file, "{}", hex::encode(key.to_bytes())).unwrap();
    assert_eq!(load_signing_key(seed_file.path()).unwrap().to_bytes(), key.to_bytes());

    let mut pair_file = tempfile::NamedTempFile::new().unwrap();
    write!(pair_file, "{}", hex::encode(key.to_keypair_bytes())).unwrap();
    assert_eq!(load_signing_key(pair_file.path()).unwrap().to_bytes(), key.to_bytes());
  }

  #[test]
  fn rejects_bad_key_material() {
    let mut short = tempfile::NamedTempFile::new().unwrap();
    write!(short, "abcd").unwrap();
    assert!(matches!(load_signing_key(short.path()), Err(AppError::Key(_))));

    let mut not_hex = tempfile::NamedTempFile::new().unwrap();
    write!(not_hex, "zz").unwrap();
    assert!(matches!(load_signing_key(not_hex.path()), Err(AppError::Key(_))));

    assert!(matches!(
      load_signing_key(Path::new("/definitely/not/here.key")),
      Err(AppError::Key(_))
    ));
  }
}
