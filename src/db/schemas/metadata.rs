//! Bookkeeping fields embedded in every stored document
//!
//! Hunt records are never hard-deleted: retiring one flips
//! `is_deleted`, and every store read filters on it. Timestamps are the
//! stores' responsibility, stamped at admission and on each mutation;
//! whatever a caller left in these fields is overwritten.

use bson::{doc, DateTime, Document};
use serde::{Deserialize, Serialize};

/// Bookkeeping carried by groups, sequences and checkpoints alike
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    /// Set once, when a store first admits the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    /// Last mutation stamp (visited append, recalibration)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// Soft-delete flag; a missing value reads as live
    #[serde(default)]
    pub is_deleted: bool,

    /// When the document was retired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,
}

impl Metadata {
    /// Stamp a document entering a store: both timestamps set to the
    /// same instant, document marked live.
    pub fn stamp_created(&mut self) {
        let now = DateTime::now();
        self.created_at = Some(now);
        self.updated_at = Some(now);
        self.is_deleted = false;
        self.deleted_at = None;
    }

    /// Stamp a mutation of an already-stored document
    pub fn touch(&mut self) {
        self.updated_at = Some(DateTime::now());
    }

    /// The same mutation stamp as a `$set` fragment, for updates that
    /// never materialize the document on this side of the wire
    pub fn touch_update() -> Document {
        doc! { "metadata.updated_at": DateTime::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_stamp_marks_live_with_equal_timestamps() {
        let mut metadata = Metadata {
            is_deleted: true,
            deleted_at: Some(DateTime::now()),
            ..Default::default()
        };

        metadata.stamp_created();

        assert!(!metadata.is_deleted);
        assert!(metadata.deleted_at.is_none());
        assert!(metadata.created_at.is_some());
        assert_eq!(metadata.created_at, metadata.updated_at);
    }

    #[test]
    fn test_touch_moves_only_the_update_stamp() {
        let mut metadata = Metadata::default();
        metadata.stamp_created();
        let admitted = metadata.created_at;

        metadata.touch();

        assert_eq!(metadata.created_at, admitted);
        assert!(metadata.updated_at >= admitted);
    }

    #[test]
    fn test_touch_update_targets_the_embedded_field() {
        let update = Metadata::touch_update();
        assert!(update.get_datetime("metadata.updated_at").is_ok());
    }

    #[test]
    fn test_bare_document_reads_as_live() {
        let metadata: Metadata = bson::from_document(doc! {}).unwrap();
        assert!(!metadata.is_deleted);
        assert!(metadata.created_at.is_none());
    }
}
