// sluice/src/core/channel.rs

//! `StageChannel`: the single-producer/single-consumer hand-off between two adjacent stages.
//!
//! Ownership is split at construction. The [`ChannelWriter`] belongs to the producing
//! stage and is the only side able to close the channel; the [`ChannelReader`] belongs
//! to the consuming stage and has no close operation at all.

use crate::core::payload::Payload;
use crate::error::{SluiceError, SluiceResult};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{event, Level};

struct Handoff {
  payload: Payload,
  // Present only on unbuffered channels; fired when the reader takes the payload.
  ack: Option<oneshot::Sender<()>>,
}

/// Creates a named stage channel.
///
/// With `capacity == 0` the channel is unbuffered: [`ChannelWriter::send`] completes only
/// once the reader has taken the payload. Any other capacity gives a bounded buffer of
/// that many payloads.
pub fn stage_channel(name: impl Into<String>, capacity: usize) -> (ChannelWriter, ChannelReader) {
  let name: Arc<str> = Arc::from(name.into());
  let rendezvous = capacity == 0;
  let (tx, rx) = mpsc::channel(capacity.max(1));
  event!(Level::DEBUG, channel = %name, capacity, "Stage channel created.");
  (
    ChannelWriter {
      name: Arc::clone(&name),
      tx: Some(tx),
      rendezvous,
    },
    ChannelReader { name, rx },
  )
}

/// The producing end of a stage channel.
#[derive(Debug)]
pub struct ChannelWriter {
  name: Arc<str>,
  tx: Option<mpsc::Sender<Handoff>>,
  rendezvous: bool,
}

impl ChannelWriter {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn is_closed(&self) -> bool {
    self.tx.as_ref().map_or(true, |tx| tx.is_closed())
  }

  /// Hands `payload` to the reader, waiting for buffer space (or, when unbuffered,
  /// for the reader to take it).
  ///
  /// Fails with [`SluiceError::ChannelClosed`] if this writer was closed or the reader
  /// has gone away. Equivalent to [`ChannelWriter::enqueue`] followed by
  /// [`PendingHandoff::delivered`].
  pub async fn send(&self, payload: Payload) -> SluiceResult<()> {
    self.enqueue(payload).await?.delivered().await
  }

  /// Places `payload` in the channel without waiting for the reader to take it.
  ///
  /// Cancel-safe: if the future is dropped before it resolves, the payload was not
  /// queued. Once it resolves the payload belongs to the channel and will reach the
  /// reader unless the reader is dropped first.
  pub async fn enqueue(&self, payload: Payload) -> SluiceResult<PendingHandoff> {
    let tx = self.tx.as_ref().ok_or_else(|| SluiceError::closed(&self.name))?;
    let permit = tx.reserve().await.map_err(|_| SluiceError::closed(&self.name))?;
    let (ack, pickup) = if self.rendezvous {
      let (ack_tx, ack_rx) = oneshot::channel();
      (Some(ack_tx), Some(ack_rx))
    } else {
      (None, None)
    };
    permit.send(Handoff { payload, ack });
    Ok(PendingHandoff {
      channel: Arc::clone(&self.name),
      pickup,
    })
  }

  /// Closes the channel. Payloads already accepted remain readable.
  ///
  /// Only the owner can close, and only once: a second call returns
  /// [`SluiceError::ChannelAlreadyClosed`].
  pub fn close(&mut self) -> SluiceResult<()> {
    match self.tx.take() {
      Some(_) => {
        event!(Level::DEBUG, channel = %self.name, "Stage channel closed by its writer.");
        Ok(())
      }
      None => {
        event!(Level::ERROR, channel = %self.name, "Attempted to close an already closed channel.");
        Err(SluiceError::ChannelAlreadyClosed {
          channel: self.name.to_string(),
        })
      }
    }
  }
}

/// A payload accepted by [`ChannelWriter::enqueue`] that the reader may not have taken yet.
#[must_use = "an unbuffered handoff is only complete once `delivered` resolves"]
#[derive(Debug)]
pub struct PendingHandoff {
  channel: Arc<str>,
  pickup: Option<oneshot::Receiver<()>>,
}

impl PendingHandoff {
  /// Resolves once the reader has taken the payload. Immediate on buffered channels.
  ///
  /// Fails with [`SluiceError::ChannelClosed`] if the reader was dropped with the
  /// payload still queued.
  pub async fn delivered(self) -> SluiceResult<()> {
    match self.pickup {
      // If the reader drops with our handoff still queued, the ack sender is dropped too.
      Some(pickup) => pickup.await.map_err(|_| SluiceError::closed(&self.channel)),
      None => Ok(()),
    }
  }
}

/// The consuming end of a stage channel.
pub struct ChannelReader {
  name: Arc<str>,
  rx: mpsc::Receiver<Handoff>,
}

impl ChannelReader {
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Receives the next payload in send order.
  ///
  /// Returns `None` once the writer is closed (or dropped) and nothing is left to read.
  /// Cancel-safe: if the future is dropped, no payload is lost.
  pub async fn recv(&mut self) -> Option<Payload> {
    let handoff = self.rx.recv().await?;
    if let Some(ack) = handoff.ack {
      // The writer may have stopped waiting; the payload is still ours.
      let _ = ack.send(());
    }
    Some(handoff.payload)
  }
}

impl std::fmt::Debug for ChannelReader {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ChannelReader").field("name", &self.name).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn unbuffered_send_waits_for_the_reader() {
    let (writer, mut reader) = stage_channel("rendezvous", 0);
    let sender = tokio::spawn(async move {
      writer.send(Payload::from("one")).await.unwrap();
      writer
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!sender.is_finished(), "send must not complete before the reader takes the payload");

    assert_eq!(reader.recv().await, Some(Payload::from("one")));
    let mut writer = tokio::time::timeout(Duration::from_secs(1), sender).await.unwrap().unwrap();
    writer.close().unwrap();
    assert_eq!(reader.recv().await, None);
  }

  #[tokio::test]
  async fn buffered_send_returns_without_a_reader() {
    let (writer, mut reader) = stage_channel("buffered", 2);
    writer.send(Payload::from("a")).await.unwrap();
    writer.send(Payload::from("b")).await.unwrap();
    assert_eq!(reader.recv().await, Some(Payload::from("a")));
    assert_eq!(reader.recv().await, Some(Payload::from("b")));
  }

  #[tokio::test]
  async fn send_after_close_fails() {
    let (mut writer, _reader) = stage_channel("closed", 1);
    writer.close().unwrap();
    assert!(writer.is_closed());
    assert!(matches!(
      writer.send(Payload::from("late")).await,
      Err(SluiceError::ChannelClosed { .. })
    ));
  }

  #[tokio::test]
  async fn enqueue_returns_before_pickup_on_unbuffered_channels() {
    let (writer, mut reader) = stage_channel("pickup", 0);
    let pending = tokio::time::timeout(Duration::from_millis(50), writer.enqueue(Payload::from("queued")))
      .await
      .expect("an empty unbuffered channel accepts one payload")
      .unwrap();

    let delivery = tokio::spawn(pending.delivered());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!delivery.is_finished(), "delivery must wait for the reader");

    assert_eq!(reader.recv().await, Some(Payload::from("queued")));
    assert!(tokio::time::timeout(Duration::from_secs(1), delivery).await.unwrap().unwrap().is_ok());
  }

  #[tokio::test]
  async fn queued_payload_fails_delivery_when_reader_is_dropped() {
    let (writer, reader) = stage_channel("abandoned", 0);
    let pending = writer.enqueue(Payload::from("never read")).await.unwrap();
    drop(reader);
    assert!(matches!(pending.delivered().await, Err(SluiceError::ChannelClosed { .. })));
  }

  #[tokio::test]
  async fn unbuffered_send_fails_when_reader_is_dropped() {
    let (writer, reader) = stage_channel("orphan", 0);
    drop(reader);
    assert!(matches!(
      writer.send(Payload::from("x")).await,
      Err(SluiceError::ChannelClosed { .. })
    ));
  }
}
