//! Sequence document schema
//!
//! A sequence is the required traversal order for every group that
//! references it. Immutable after creation in normal operation and
//! read-only to the progression engine.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::ident::CheckpointId;

/// Collection name for sequences
pub const SEQUENCE_COLLECTION: &str = "sequences";

/// Sequence document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SequenceDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Sequence identifier, unique
    pub seq_id: String,

    /// Ordered checkpoint identifiers defining the traversal
    pub sequence: Vec<CheckpointId>,
}

impl SequenceDoc {
    pub fn new(seq_id: String, sequence: Vec<CheckpointId>) -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            seq_id,
            sequence,
        }
    }
}

impl IntoIndexes for SequenceDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "seq_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("seq_id_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for SequenceDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
