//! Location-claim validation and commit
//!
//! The engine owns the read-validate-append transition: resolve the
//! claimed checkpoint's reference coordinates for the group's class,
//! geofence the claimed position, apply the claim policy, then commit
//! through the store's conditional append pinned to the visited tail
//! it read. Losing a race is a normal outcome the client can retry.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info};

use crate::db::store::{AppendOutcome, HuntStore};
use crate::geo::{self, GeoPoint};
use crate::ident::CheckpointId;
use crate::progress::state::{current_checkpoint, CurrentCheckpoint};
use crate::types::{Result, WaymarkError};

/// Which checkpoint ids a group may claim
///
/// The ordering check is an explicit policy, not an accident of the
/// route layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaimPolicy {
    /// Only the computed current checkpoint may be claimed
    #[default]
    EnforceOrder,
    /// Any unvisited checkpoint of the assigned sequence may be claimed
    Flexible,
}

impl ClaimPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimPolicy::EnforceOrder => "enforce-order",
            ClaimPolicy::Flexible => "flexible",
        }
    }
}

impl fmt::Display for ClaimPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enforce-order" | "enforce_order" => Ok(ClaimPolicy::EnforceOrder),
            "flexible" => Ok(ClaimPolicy::Flexible),
            other => Err(format!(
                "unknown claim policy '{other}' (expected enforce-order or flexible)"
            )),
        }
    }
}

/// Result of a location claim
///
/// Only `Committed` mutates the visited history. The rejections are
/// expected, frequent outcomes, not errors; none of them reveals the
/// measured distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Claim admitted and appended to the visited history
    Committed,
    /// Claimed position is outside the admission radius
    OutOfRange,
    /// Claimed id is not the one the policy allows next
    OutOfOrder,
    /// Claimed id is already in the visited history
    AlreadyVisited,
    /// The hunt is already complete; nothing further may be claimed
    HuntComplete,
    /// A concurrent claim won the commit race; re-read and retry
    Conflict,
}

impl ClaimOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, ClaimOutcome::Committed)
    }
}

/// Validates location claims and commits them atomically per group
#[derive(Clone)]
pub struct ProgressionEngine {
    store: Arc<dyn HuntStore>,
    radius_km: f64,
    policy: ClaimPolicy,
}

impl ProgressionEngine {
    pub fn new(store: Arc<dyn HuntStore>, radius_km: f64, policy: ClaimPolicy) -> Self {
        Self {
            store,
            radius_km,
            policy,
        }
    }

    pub fn policy(&self) -> ClaimPolicy {
        self.policy
    }

    /// Current checkpoint for a group, recomputed from persisted state
    pub async fn current_for_group(&self, group_no: &str) -> Result<CurrentCheckpoint> {
        let group = self.store.get_group(group_no).await?;
        let sequence = self.store.get_sequence(&group.seq_id).await?;
        current_checkpoint(&group.visited_ckpts, &sequence.sequence)
    }

    /// Validate a location claim and, if admitted, append it to the
    /// group's visited history.
    ///
    /// The append is conditional on the visited tail observed here, so
    /// two concurrent claims for the same group can never both commit
    /// against the same snapshot.
    pub async fn commit_claim(
        &self,
        group_no: &str,
        claimed: &CheckpointId,
        position: GeoPoint,
    ) -> Result<ClaimOutcome> {
        let group = self.store.get_group(group_no).await?;
        let checkpoint = self.store.get_checkpoint(claimed).await?;

        let reference = checkpoint.coords.for_class(group.class).ok_or_else(|| {
            WaymarkError::NotFound(format!(
                "checkpoint '{}' has no coordinates for class {}",
                claimed, group.class
            ))
        })?;

        // The measured distance stays server-side; clients only learn
        // pass or fail.
        let distance_km = geo::distance_km(position, reference);
        if !geo::within_radius(distance_km, self.radius_km) {
            debug!(
                "Group '{}' claim on '{}' rejected: {:.4} km outside {:.4} km radius",
                group_no, claimed, distance_km, self.radius_km
            );
            return Ok(ClaimOutcome::OutOfRange);
        }

        if group.visited_ckpts.contains(claimed) {
            return Ok(ClaimOutcome::AlreadyVisited);
        }

        let sequence = self.store.get_sequence(&group.seq_id).await?;
        match self.policy {
            ClaimPolicy::EnforceOrder => {
                match current_checkpoint(&group.visited_ckpts, &sequence.sequence)? {
                    CurrentCheckpoint::Complete => return Ok(ClaimOutcome::HuntComplete),
                    CurrentCheckpoint::Next(expected) if expected != *claimed => {
                        debug!(
                            "Group '{}' claimed '{}' but '{}' is next",
                            group_no, claimed, expected
                        );
                        return Ok(ClaimOutcome::OutOfOrder);
                    }
                    CurrentCheckpoint::Next(_) => {}
                }
            }
            ClaimPolicy::Flexible => {
                if group.visited_ckpts.len() >= sequence.sequence.len() {
                    return Ok(ClaimOutcome::HuntComplete);
                }
                // Claims outside the assigned sequence stay rejected
                // even under the flexible policy; the visited history
                // must remain a subset of the sequence.
                if !sequence.sequence.contains(claimed) {
                    return Ok(ClaimOutcome::OutOfOrder);
                }
            }
        }

        match self
            .store
            .append_visited_if_tail_matches(group_no, group.last_visited(), claimed)
            .await?
        {
            AppendOutcome::Appended => {
                info!("Group '{}' committed checkpoint '{}'", group_no, claimed);
                Ok(ClaimOutcome::Committed)
            }
            AppendOutcome::TailMismatch => {
                debug!(
                    "Group '{}' lost the commit race for '{}'",
                    group_no, claimed
                );
                Ok(ClaimOutcome::Conflict)
            }
        }
    }
}
