//! Database schemas for Waymark
//!
//! Defines the document structures for groups, sequences and
//! checkpoints. These records are owned by the persistence layer; the
//! progression engine reads them and appends to `visited_ckpts` only.

mod checkpoint;
mod group;
mod metadata;
mod sequence;

pub use checkpoint::{CheckpointDoc, ClassCoords, CHECKPOINT_COLLECTION};
pub use group::{GroupDoc, GROUP_COLLECTION};
pub use metadata::Metadata;
pub use sequence::{SequenceDoc, SEQUENCE_COLLECTION};
