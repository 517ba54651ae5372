// tests/channel_tests.rs
mod common;
use common::*;
use serial_test::serial;
use sluice::{stage_channel, Payload, SluiceError};
use std::time::Duration;

async fn assert_fifo(capacity: usize, count: usize) {
  let (mut writer, mut reader) = stage_channel("fifo", capacity);
  let producer = tokio::spawn(async move {
    for i in 0..count {
      writer.send(Payload::from(format!("p{}", i))).await.unwrap();
    }
    writer.close().unwrap();
  });

  let mut received = Vec::new();
  while let Some(payload) = reader.recv().await {
    received.push(String::from_utf8(payload.to_vec()).unwrap());
  }
  producer.await.unwrap();

  let expected: Vec<String> = (0..count).map(|i| format!("p{}", i)).collect();
  assert_eq!(received, expected);
}

#[tokio::test]
#[serial]
async fn test_unbuffered_channel_preserves_send_order() {
  setup_tracing();
  assert_fifo(0, 200).await;
}

#[tokio::test]
#[serial]
async fn test_buffered_channel_preserves_send_order() {
  setup_tracing();
  assert_fifo(8, 200).await;
}

#[tokio::test]
#[serial]
async fn test_second_close_is_reported() {
  setup_tracing();
  let (mut writer, _reader) = stage_channel("double_close", 0);
  assert!(writer.close().is_ok());
  match writer.close() {
    Err(SluiceError::ChannelAlreadyClosed { channel }) => assert_eq!(channel, "double_close"),
    other => panic!("Expected ChannelAlreadyClosed, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_buffered_payloads_survive_close() {
  setup_tracing();
  let (mut writer, mut reader) = stage_channel("in_flight", 4);
  for i in 0..3 {
    writer.send(Payload::from(format!("m{}", i))).await.unwrap();
  }
  writer.close().unwrap();

  let mut drained = 0;
  while reader.recv().await.is_some() {
    drained += 1;
  }
  assert_eq!(drained, 3);
}

#[tokio::test]
#[serial]
async fn test_dropping_the_writer_ends_the_stream() {
  setup_tracing();
  let (writer, mut reader) = stage_channel("dropped", 0);
  drop(writer);
  let next = tokio::time::timeout(Duration::from_millis(100), reader.recv()).await;
  assert_eq!(next.unwrap(), None);
}
