// sluice/src/bootstrap/mod.rs

//! Process bootstrap: turning OS termination signals into cancellation, starting stage
//! handles in order, and waiting until every task has exited.

pub mod runner;
pub mod shutdown;

pub use runner::{init_join_group, run, run_with_signal};
pub use shutdown::{termination_signal, translate_interrupt_to_cancel, translate_to_cancel};
