//! Checkpoint document schema
//!
//! Reference data for one geofenced station: per-classification
//! coordinates, clue text, task description and an optional image
//! reference. Read-only to the progression engine; coordinates change
//! only through the explicit recalibration operation, one class slot at
//! a time.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::geo::GeoPoint;
use crate::ident::{CheckpointId, GroupClass};

/// Collection name for checkpoints
pub const CHECKPOINT_COLLECTION: &str = "checkpoints";

/// Reference coordinates per group classification
///
/// Classification-independent checkpoints carry the same pair in every
/// slot; recalibration rewrites exactly one slot and leaves the others
/// untouched.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct ClassCoords {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<GeoPoint>,
}

impl ClassCoords {
    /// Same reference point for every classification
    pub fn shared(point: GeoPoint) -> Self {
        Self {
            y: Some(point),
            f: Some(point),
            e: Some(point),
        }
    }

    /// Coordinates for one classification, if calibrated
    pub fn for_class(&self, class: GroupClass) -> Option<GeoPoint> {
        match class {
            GroupClass::Y => self.y,
            GroupClass::F => self.f,
            GroupClass::E => self.e,
        }
    }

    /// Replace exactly one classification's coordinates
    pub fn set(&mut self, class: GroupClass, point: GeoPoint) {
        match class {
            GroupClass::Y => self.y = Some(point),
            GroupClass::F => self.f = Some(point),
            GroupClass::E => self.e = Some(point),
        }
    }

    /// BSON subfield name for a classification's slot
    pub fn field_name(class: GroupClass) -> &'static str {
        match class {
            GroupClass::Y => "y",
            GroupClass::F => "f",
            GroupClass::E => "e",
        }
    }
}

/// Checkpoint document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CheckpointDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Checkpoint identifier, unique, numeric-aware ordering
    pub ckpt_no: CheckpointId,

    /// Reference coordinates per classification
    pub coords: ClassCoords,

    /// Clue text shown when this checkpoint becomes current
    pub clue: String,

    /// Task to complete at this checkpoint
    pub task: String,

    /// Associated image reference (URL or object key); the image bytes
    /// themselves live elsewhere
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CheckpointDoc {
    pub fn new(
        ckpt_no: CheckpointId,
        coords: ClassCoords,
        clue: String,
        task: String,
        image: Option<String>,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            ckpt_no,
            coords,
            clue,
            task,
            image,
        }
    }
}

impl IntoIndexes for CheckpointDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "ckpt_no": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("ckpt_no_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for CheckpointDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_coords_fill_every_slot() {
        let p = GeoPoint::new(1.0, 2.0);
        let coords = ClassCoords::shared(p);
        assert_eq!(coords.for_class(GroupClass::Y), Some(p));
        assert_eq!(coords.for_class(GroupClass::F), Some(p));
        assert_eq!(coords.for_class(GroupClass::E), Some(p));
    }

    #[test]
    fn test_set_replaces_exactly_one_slot() {
        let original = GeoPoint::new(1.0, 2.0);
        let moved = GeoPoint::new(3.0, 4.0);
        let mut coords = ClassCoords::shared(original);

        coords.set(GroupClass::F, moved);

        assert_eq!(coords.for_class(GroupClass::F), Some(moved));
        assert_eq!(coords.for_class(GroupClass::Y), Some(original));
        assert_eq!(coords.for_class(GroupClass::E), Some(original));
    }

    #[test]
    fn test_uncalibrated_slot_is_none() {
        let coords = ClassCoords {
            y: Some(GeoPoint::new(0.0, 0.0)),
            f: None,
            e: None,
        };
        assert!(coords.for_class(GroupClass::E).is_none());
    }
}
