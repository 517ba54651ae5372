// sluice/src/core/payload.rs

use bytes::Bytes;
use std::ops::Deref;

/// One unit of record data travelling through the pipeline.
///
/// The pipeline never looks inside; only the record source, mutators and publishers
/// interpret the bytes. Cloning is cheap (reference counted).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Payload(Bytes);

impl Payload {
  pub fn new(bytes: impl Into<Bytes>) -> Self {
    Payload(bytes.into())
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  pub fn into_bytes(self) -> Bytes {
    self.0
  }
}

impl Deref for Payload {
  type Target = [u8];

  fn deref(&self) -> &[u8] {
    &self.0
  }
}

impl AsRef<[u8]> for Payload {
  fn as_ref(&self) -> &[u8] {
    &self.0
  }
}

impl From<Bytes> for Payload {
  fn from(bytes: Bytes) -> Self {
    Payload(bytes)
  }
}

impl From<Vec<u8>> for Payload {
  fn from(bytes: Vec<u8>) -> Self {
    Payload(Bytes::from(bytes))
  }
}

impl From<String> for Payload {
  fn from(s: String) -> Self {
    Payload(Bytes::from(s))
  }
}

impl From<&'static str> for Payload {
  fn from(s: &'static str) -> Self {
    Payload(Bytes::from_static(s.as_bytes()))
  }
}
