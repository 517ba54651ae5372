pub mod channel;
pub mod context;
pub mod control;
pub mod join_group;
pub mod payload;

// Re-export key types for easier access from other modules (and lib.rs)
pub use channel::{stage_channel, ChannelReader, ChannelWriter, PendingHandoff};
pub use context::ShutdownContext;
pub use control::{StageReport, StageState, StageStatus};
pub use join_group::{JoinGroup, JoinTicket};
pub use payload::Payload;
