//! Current-checkpoint computation
//!
//! The progression "state machine" is stateless: it is recomputed from
//! the persisted visited history on every call. Hunt completion is a
//! distinguished value, never an error; a history that cannot belong to
//! its sequence is an integrity fault, never silently treated as
//! complete.

use crate::ident::CheckpointId;
use crate::types::{Result, WaymarkError};

/// Where a group currently stands in its sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentCheckpoint {
    /// The next checkpoint the group is expected to reach
    Next(CheckpointId),
    /// Every checkpoint of the sequence has been visited
    Complete,
}

impl CurrentCheckpoint {
    pub fn is_complete(&self) -> bool {
        matches!(self, CurrentCheckpoint::Complete)
    }
}

/// Compute a group's current checkpoint from its visited history and
/// assigned sequence.
///
/// The position of the last visited element decides, not the history
/// length, so a corrupted history (last element absent from the
/// sequence, or more entries than the sequence holds) surfaces as an
/// integrity fault instead of a wrong answer.
pub fn current_checkpoint(
    visited: &[CheckpointId],
    sequence: &[CheckpointId],
) -> Result<CurrentCheckpoint> {
    let Some(first) = sequence.first() else {
        return Err(WaymarkError::Integrity(
            "sequence has no checkpoints".to_string(),
        ));
    };

    let last = match visited.last() {
        None => return Ok(CurrentCheckpoint::Next(first.clone())),
        Some(last) => last,
    };

    if visited.len() > sequence.len() {
        return Err(WaymarkError::Integrity(format!(
            "visited history ({}) is longer than its sequence ({})",
            visited.len(),
            sequence.len()
        )));
    }
    if visited.len() == sequence.len() {
        return Ok(CurrentCheckpoint::Complete);
    }

    let position = sequence
        .iter()
        .position(|ckpt| ckpt == last)
        .ok_or_else(|| {
            WaymarkError::Integrity(format!(
                "last visited checkpoint '{}' is not in the assigned sequence",
                last
            ))
        })?;

    match sequence.get(position + 1) {
        Some(next) => Ok(CurrentCheckpoint::Next(next.clone())),
        // The terminal element is already visited
        None => Ok(CurrentCheckpoint::Complete),
    }
}
