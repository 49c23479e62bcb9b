//! MongoDB client, typed collection wrapper and the Mongo-backed store
//!
//! The collection wrapper applies schema-defined indexes on startup and
//! stamps document metadata on insert. `MongoHuntStore` builds the
//! store contract on top of it; the conditional visited-list append is
//! a single `update_one` whose filter pins the current tail, so the
//! check and the write are one atomic document operation on the server.

use bson::{doc, oid::ObjectId, Document};
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::{error, info, warn};

use async_trait::async_trait;

use crate::db::schemas::{
    CheckpointDoc, ClassCoords, GroupDoc, Metadata, SequenceDoc, CHECKPOINT_COLLECTION,
    GROUP_COLLECTION, SEQUENCE_COLLECTION,
};
use crate::db::store::{AppendOutcome, HuntStore};
use crate::geo::GeoPoint;
use crate::ident::{CheckpointId, GroupClass};
use crate::types::{Result, WaymarkError};

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri).await.map_err(|e| {
            WaymarkError::Unavailable(format!("Failed to connect to MongoDB: {}", e))
        })?;

        // Verify connection with timeout
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| WaymarkError::Unavailable(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(client: &Client, db_name: &str, collection_name: &str) -> Result<Self> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        // Apply indexes
        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<()> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| WaymarkError::Unavailable(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, stamping admission metadata
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId> {
        item.mut_metadata().stamp_created();

        let result = self.inner.insert_one(item).await.map_err(|e| {
            if is_duplicate_key(&e) {
                WaymarkError::DuplicateKey(e.to_string())
            } else {
                WaymarkError::Unavailable(format!("Insert failed: {}", e))
            }
        })?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| WaymarkError::Unavailable("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        // Add is_deleted check
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        self.inner
            .find_one(full_filter)
            .await
            .map_err(|e| WaymarkError::Unavailable(format!("Find failed: {}", e)))
    }

    /// Find many documents by filter
    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>> {
        use futures_util::StreamExt;

        // Add is_deleted check
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        let cursor = self
            .inner
            .find(full_filter)
            .await
            .map_err(|e| WaymarkError::Unavailable(format!("Find failed: {}", e)))?;

        let results: Vec<T> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(results)
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| WaymarkError::Unavailable(format!("Update failed: {}", e)))
    }
}

/// Whether the server rejected a write over a unique-index collision
/// (code 11000), the expected signal when a setup insert replays an id
/// that is already provisioned
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        _ => false,
    }
}

/// MongoDB-backed hunt store
///
/// Typed collections are built once at connect time, which also applies
/// the unique indexes the setup inserts rely on.
#[derive(Clone)]
pub struct MongoHuntStore {
    groups: MongoCollection<GroupDoc>,
    sequences: MongoCollection<SequenceDoc>,
    checkpoints: MongoCollection<CheckpointDoc>,
}

impl MongoHuntStore {
    /// Connect and prepare the hunt collections
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let client = MongoClient::new(uri, db_name).await?;

        Ok(Self {
            groups: client.collection(GROUP_COLLECTION).await?,
            sequences: client.collection(SEQUENCE_COLLECTION).await?,
            checkpoints: client.collection(CHECKPOINT_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl HuntStore for MongoHuntStore {
    async fn get_group(&self, group_no: &str) -> Result<GroupDoc> {
        self.groups
            .find_one(doc! { "group_no": group_no })
            .await?
            .ok_or_else(|| WaymarkError::NotFound(format!("group '{}'", group_no)))
    }

    async fn get_sequence(&self, seq_id: &str) -> Result<SequenceDoc> {
        self.sequences
            .find_one(doc! { "seq_id": seq_id })
            .await?
            .ok_or_else(|| WaymarkError::NotFound(format!("sequence '{}'", seq_id)))
    }

    async fn get_checkpoint(&self, ckpt_no: &CheckpointId) -> Result<CheckpointDoc> {
        self.checkpoints
            .find_one(doc! { "ckpt_no": ckpt_no.as_str() })
            .await?
            .ok_or_else(|| WaymarkError::NotFound(format!("checkpoint '{}'", ckpt_no)))
    }

    async fn append_visited_if_tail_matches(
        &self,
        group_no: &str,
        expected_tail: Option<&CheckpointId>,
        new_ckpt: &CheckpointId,
    ) -> Result<AppendOutcome> {
        // The filter pins the expected tail (or emptiness) and rejects
        // ids already present, so a concurrent claim that slipped in
        // first simply makes this match nothing.
        let filter = match expected_tail {
            Some(tail) => doc! {
                "group_no": group_no,
                "metadata.is_deleted": { "$ne": true },
                "visited_ckpts": { "$ne": new_ckpt.as_str() },
                "$expr": {
                    "$eq": [
                        { "$arrayElemAt": ["$visited_ckpts", -1] },
                        tail.as_str(),
                    ]
                },
            },
            None => doc! {
                "group_no": group_no,
                "metadata.is_deleted": { "$ne": true },
                "visited_ckpts": { "$size": 0 },
            },
        };

        let update = doc! {
            "$push": { "visited_ckpts": new_ckpt.as_str() },
            "$set": Metadata::touch_update(),
        };

        let result = self.groups.update_one(filter, update).await?;
        if result.matched_count == 1 {
            return Ok(AppendOutcome::Appended);
        }

        // Nothing matched: either the group is gone or the tail moved.
        // A follow-up read tells the two apart (and surfaces NotFound).
        self.get_group(group_no).await?;
        Ok(AppendOutcome::TailMismatch)
    }

    async fn list_checkpoints_ordered(&self) -> Result<Vec<CheckpointDoc>> {
        // Ids order numerically ("2" before "10"), which a BSON sort on
        // the string field cannot express, so ordering happens here.
        let mut checkpoints = self.checkpoints.find_many(doc! {}).await?;
        checkpoints.sort_by(|a, b| a.ckpt_no.cmp(&b.ckpt_no));
        Ok(checkpoints)
    }

    async fn recalibrate_checkpoint(
        &self,
        ckpt_no: &CheckpointId,
        class: GroupClass,
        coords: GeoPoint,
    ) -> Result<()> {
        let point = bson::to_bson(&coords)
            .map_err(|e| WaymarkError::Unavailable(format!("Serialize coords failed: {}", e)))?;

        // Targeted $set on one class slot; the other slots stay as-is
        let mut set = Metadata::touch_update();
        set.insert(
            format!("coords.{}", ClassCoords::field_name(class)),
            point,
        );

        let filter = doc! {
            "ckpt_no": ckpt_no.as_str(),
            "metadata.is_deleted": { "$ne": true },
        };

        let result = self.checkpoints.update_one(filter, doc! { "$set": set }).await?;
        if result.matched_count == 0 {
            return Err(WaymarkError::NotFound(format!("checkpoint '{}'", ckpt_no)));
        }

        Ok(())
    }

    async fn insert_groups(&self, groups: Vec<GroupDoc>) -> Result<usize> {
        let mut inserted = 0;
        for group in groups {
            let group_no = group.group_no.clone();
            match self.groups.insert_one(group).await {
                Ok(_) => inserted += 1,
                Err(WaymarkError::DuplicateKey(_)) => {
                    warn!("Group '{}' already exists, skipping", group_no);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(inserted)
    }

    async fn insert_sequences(&self, sequences: Vec<SequenceDoc>) -> Result<usize> {
        let mut inserted = 0;
        for sequence in sequences {
            let seq_id = sequence.seq_id.clone();
            match self.sequences.insert_one(sequence).await {
                Ok(_) => inserted += 1,
                Err(WaymarkError::DuplicateKey(_)) => {
                    warn!("Sequence '{}' already exists, skipping", seq_id);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(inserted)
    }

    async fn insert_checkpoints(&self, checkpoints: Vec<CheckpointDoc>) -> Result<usize> {
        let mut inserted = 0;
        for checkpoint in checkpoints {
            let ckpt_no = checkpoint.ckpt_no.clone();
            match self.checkpoints.insert_one(checkpoint).await {
                Ok(_) => inserted += 1,
                Err(WaymarkError::DuplicateKey(_)) => {
                    warn!("Checkpoint '{}' already exists, skipping", ckpt_no);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::error::{Error as MongoError, WriteError};

    // Store round-trips need a running MongoDB instance; see
    // docker-compose.dev.yml. The write-error classification below is
    // pure and testable without one.

    fn write_failure(code: i32) -> MongoError {
        // WriteError deserializes from the server reply shape; the
        // message rides under both spellings the driver has used
        let write_error: WriteError = bson::from_document(doc! {
            "code": code,
            "errmsg": "write rejected",
            "message": "write rejected",
        })
        .unwrap();
        MongoError::from(ErrorKind::Write(WriteFailure::WriteError(write_error)))
    }

    #[test]
    fn test_unique_index_collision_classifies_as_duplicate() {
        assert!(is_duplicate_key(&write_failure(11000)));
    }

    #[test]
    fn test_other_write_failures_are_not_duplicates() {
        // 121 is the server's document validation failure
        assert!(!is_duplicate_key(&write_failure(121)));
    }

    #[test]
    fn test_non_write_errors_are_not_duplicates() {
        let unrelated = MongoError::custom("connection reset");
        assert!(!is_duplicate_key(&unrelated));
    }
}
