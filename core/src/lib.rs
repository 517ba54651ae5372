// sluice/src/lib.rs

//! Sluice: a cancellable, channel-connected stage pipeline for Rust.
//!
//! A generator produces records, transformers rewrite them, and a sink hands them to a
//! downstream transport. Sluice provides:
//!  - A process-wide, idempotent cancellation context (`ShutdownContext`).
//!  - A join group that lets the bootstrap wait for every spawned task.
//!  - Single-owner stage channels, unbuffered by default, closed only by their writer.
//!  - Generator, transformer and sink stages that stop cooperatively and drain in order.
//!  - A bootstrap runner that translates SIGINT/SIGTERM into cancellation, starts stages
//!    in order, fails fast if one cannot start, and blocks until everything has exited.

pub mod bootstrap;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod stage;

// --- Re-exports for the Public API ---

pub use crate::core::channel::{stage_channel, ChannelReader, ChannelWriter, PendingHandoff};
pub use crate::core::context::ShutdownContext;
pub use crate::core::control::{StageReport, StageState, StageStatus};
pub use crate::core::join_group::{JoinGroup, JoinTicket};
pub use crate::core::payload::Payload;

pub use crate::stage::{
  into_handle, stage_handle, Annotator, Generator, Mutator, NoopAnnotator, Passthrough, Publisher, RecordSource, Sink,
  Stage, StageHandle, Transformer,
};

pub use crate::pipeline::{Pipeline, WiredPipeline};

pub use crate::config::PipelineConfig;
pub use crate::error::{SluiceError, SluiceResult};

/*
    Typical wiring:
    1. Implement `RecordSource`, `Mutator` and `Publisher` (and optionally `Annotator`)
       for your record type.
    2. Build a `Pipeline` from a `PipelineConfig`:
       `.source(..)`, zero or more `.transform(..)`, `.sink(..)`.
    3. Create one `ShutdownContext` for the process.
    4. `pipeline.run(ctx).await` starts the stages, waits for SIGINT/SIGTERM, drains the
       channels and returns whether every stage started.
*/
