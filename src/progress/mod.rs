//! Checkpoint progression
//!
//! `state` computes where a group stands from persisted history;
//! `engine` validates location claims and commits them atomically.

pub mod engine;
pub mod state;

pub use engine::{ClaimOutcome, ClaimPolicy, ProgressionEngine};
pub use state::{current_checkpoint, CurrentCheckpoint};
