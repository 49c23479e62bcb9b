//! In-memory hunt store for dev mode and tests
//!
//! Backs the same contract as MongoDB with DashMap. The conditional
//! append does its tail check and push while holding the entry's write
//! guard, which makes it atomic per group just like the server-side
//! document update.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::warn;

use crate::db::schemas::{CheckpointDoc, GroupDoc, SequenceDoc};
use crate::db::store::{AppendOutcome, HuntStore};
use crate::geo::GeoPoint;
use crate::ident::{CheckpointId, GroupClass};
use crate::types::{Result, WaymarkError};

/// DashMap-backed store, used when no MongoDB is reachable (dev mode)
/// and throughout the test suite
#[derive(Default)]
pub struct MemoryHuntStore {
    groups: DashMap<String, GroupDoc>,
    sequences: DashMap<String, SequenceDoc>,
    checkpoints: DashMap<String, CheckpointDoc>,
}

impl MemoryHuntStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HuntStore for MemoryHuntStore {
    async fn get_group(&self, group_no: &str) -> Result<GroupDoc> {
        self.groups
            .get(group_no)
            .filter(|group| !group.metadata.is_deleted)
            .map(|group| group.clone())
            .ok_or_else(|| WaymarkError::NotFound(format!("group '{}'", group_no)))
    }

    async fn get_sequence(&self, seq_id: &str) -> Result<SequenceDoc> {
        self.sequences
            .get(seq_id)
            .filter(|sequence| !sequence.metadata.is_deleted)
            .map(|sequence| sequence.clone())
            .ok_or_else(|| WaymarkError::NotFound(format!("sequence '{}'", seq_id)))
    }

    async fn get_checkpoint(&self, ckpt_no: &CheckpointId) -> Result<CheckpointDoc> {
        self.checkpoints
            .get(ckpt_no.as_str())
            .filter(|checkpoint| !checkpoint.metadata.is_deleted)
            .map(|checkpoint| checkpoint.clone())
            .ok_or_else(|| WaymarkError::NotFound(format!("checkpoint '{}'", ckpt_no)))
    }

    async fn append_visited_if_tail_matches(
        &self,
        group_no: &str,
        expected_tail: Option<&CheckpointId>,
        new_ckpt: &CheckpointId,
    ) -> Result<AppendOutcome> {
        let mut group = self
            .groups
            .get_mut(group_no)
            .filter(|group| !group.metadata.is_deleted)
            .ok_or_else(|| WaymarkError::NotFound(format!("group '{}'", group_no)))?;

        let tail_matches = match expected_tail {
            Some(tail) => group.last_visited() == Some(tail),
            None => group.visited_ckpts.is_empty(),
        };

        if !tail_matches || group.visited_ckpts.contains(new_ckpt) {
            return Ok(AppendOutcome::TailMismatch);
        }

        group.visited_ckpts.push(new_ckpt.clone());
        group.metadata.touch();
        Ok(AppendOutcome::Appended)
    }

    async fn list_checkpoints_ordered(&self) -> Result<Vec<CheckpointDoc>> {
        let mut checkpoints: Vec<CheckpointDoc> = self
            .checkpoints
            .iter()
            .filter(|checkpoint| !checkpoint.metadata.is_deleted)
            .map(|checkpoint| checkpoint.clone())
            .collect();
        checkpoints.sort_by(|a, b| a.ckpt_no.cmp(&b.ckpt_no));
        Ok(checkpoints)
    }

    async fn recalibrate_checkpoint(
        &self,
        ckpt_no: &CheckpointId,
        class: GroupClass,
        coords: GeoPoint,
    ) -> Result<()> {
        let mut checkpoint = self
            .checkpoints
            .get_mut(ckpt_no.as_str())
            .filter(|checkpoint| !checkpoint.metadata.is_deleted)
            .ok_or_else(|| WaymarkError::NotFound(format!("checkpoint '{}'", ckpt_no)))?;

        checkpoint.coords.set(class, coords);
        checkpoint.metadata.touch();
        Ok(())
    }

    async fn insert_groups(&self, groups: Vec<GroupDoc>) -> Result<usize> {
        let mut inserted = 0;
        for mut group in groups {
            group.metadata.stamp_created();
            match self.groups.entry(group.group_no.clone()) {
                Entry::Occupied(_) => {
                    warn!("Group '{}' already exists, skipping", group.group_no);
                }
                Entry::Vacant(slot) => {
                    slot.insert(group);
                    inserted += 1;
                }
            }
        }
        Ok(inserted)
    }

    async fn insert_sequences(&self, sequences: Vec<SequenceDoc>) -> Result<usize> {
        let mut inserted = 0;
        for mut sequence in sequences {
            sequence.metadata.stamp_created();
            match self.sequences.entry(sequence.seq_id.clone()) {
                Entry::Occupied(_) => {
                    warn!("Sequence '{}' already exists, skipping", sequence.seq_id);
                }
                Entry::Vacant(slot) => {
                    slot.insert(sequence);
                    inserted += 1;
                }
            }
        }
        Ok(inserted)
    }

    async fn insert_checkpoints(&self, checkpoints: Vec<CheckpointDoc>) -> Result<usize> {
        let mut inserted = 0;
        for mut checkpoint in checkpoints {
            checkpoint.metadata.stamp_created();
            match self.checkpoints.entry(checkpoint.ckpt_no.as_str().to_string()) {
                Entry::Occupied(_) => {
                    warn!("Checkpoint '{}' already exists, skipping", checkpoint.ckpt_no);
                }
                Entry::Vacant(slot) => {
                    slot.insert(checkpoint);
                    inserted += 1;
                }
            }
        }
        Ok(inserted)
    }
}
