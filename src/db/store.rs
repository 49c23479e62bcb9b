//! Abstract store contract for the progression core
//!
//! The core depends only on this trait, never on a concrete store.
//! MongoDB backs it in production, a DashMap store backs dev mode and
//! tests. The one non-obvious member is the conditional append: it is
//! the atomic commit primitive that serializes concurrent location
//! claims per group without any in-process locking.

use async_trait::async_trait;

use crate::db::schemas::{CheckpointDoc, GroupDoc, SequenceDoc};
use crate::geo::GeoPoint;
use crate::ident::{CheckpointId, GroupClass};
use crate::types::Result;

/// Result of the conditional append primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The checkpoint was appended to the group's visited list
    Appended,
    /// The visited tail no longer matched (a concurrent claim won) or
    /// the id was already present. The caller may re-read and retry.
    TailMismatch,
}

/// Persistence contract consumed by the progression engine and the
/// catalog routes
#[async_trait]
pub trait HuntStore: Send + Sync {
    /// Fetch a group by its identifier
    async fn get_group(&self, group_no: &str) -> Result<GroupDoc>;

    /// Fetch a sequence by its identifier
    async fn get_sequence(&self, seq_id: &str) -> Result<SequenceDoc>;

    /// Fetch a checkpoint by its identifier
    async fn get_checkpoint(&self, ckpt_no: &CheckpointId) -> Result<CheckpointDoc>;

    /// Atomically append `new_ckpt` to a group's visited list, but only
    /// if the list's tail still equals `expected_tail` (`None` = list
    /// must be empty) and `new_ckpt` is not already present.
    ///
    /// `TailMismatch` is a normal outcome, not an error: it is how the
    /// losing side of a commit race finds out.
    async fn append_visited_if_tail_matches(
        &self,
        group_no: &str,
        expected_tail: Option<&CheckpointId>,
        new_ckpt: &CheckpointId,
    ) -> Result<AppendOutcome>;

    /// All checkpoints in numeric-aware id order ("2" before "10")
    async fn list_checkpoints_ordered(&self) -> Result<Vec<CheckpointDoc>>;

    /// Replace exactly one classification's coordinates on a checkpoint,
    /// leaving the other class slots untouched
    async fn recalibrate_checkpoint(
        &self,
        ckpt_no: &CheckpointId,
        class: GroupClass,
        coords: GeoPoint,
    ) -> Result<()>;

    /// Bulk setup: insert groups, skipping ids that already exist.
    /// Returns the number actually inserted.
    async fn insert_groups(&self, groups: Vec<GroupDoc>) -> Result<usize>;

    /// Bulk setup: insert sequences, skipping ids that already exist
    async fn insert_sequences(&self, sequences: Vec<SequenceDoc>) -> Result<usize>;

    /// Bulk setup: insert checkpoints, skipping ids that already exist
    async fn insert_checkpoints(&self, checkpoints: Vec<CheckpointDoc>) -> Result<usize>;
}
