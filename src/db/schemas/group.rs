//! Group document schema
//!
//! One document per team. `visited_ckpts` is the group's progression
//! history: append-only, insertion order = visit order. The progression
//! engine only ever reads it and appends to it through the store's
//! conditional primitive; it never rewrites the list wholesale.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::ident::{CheckpointId, GroupClass};

/// Collection name for groups
pub const GROUP_COLLECTION: &str = "groups";

/// Group document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GroupDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Group identifier, unique across the hunt
    pub group_no: String,

    /// Argon2 password hash (PHC string)
    pub password_hash: String,

    /// Classification selecting which checkpoint coordinates apply
    pub class: GroupClass,

    /// Member roster
    #[serde(default)]
    pub members: Vec<String>,

    /// Assigned sequence reference
    pub seq_id: String,

    /// Visited checkpoints, append-only, in visit order
    #[serde(default)]
    pub visited_ckpts: Vec<CheckpointId>,

    /// Completed tasks (free-form, maintained by the task flow)
    #[serde(default)]
    pub done_tasks: Vec<String>,
}

impl GroupDoc {
    /// Create a new group document with an empty history
    pub fn new(
        group_no: String,
        password_hash: String,
        class: GroupClass,
        members: Vec<String>,
        seq_id: String,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            group_no,
            password_hash,
            class,
            members,
            seq_id,
            visited_ckpts: Vec::new(),
            done_tasks: Vec::new(),
        }
    }

    /// Last visited checkpoint, if any
    pub fn last_visited(&self) -> Option<&CheckpointId> {
        self.visited_ckpts.last()
    }
}

impl IntoIndexes for GroupDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "group_no": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("group_no_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "seq_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("seq_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for GroupDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
