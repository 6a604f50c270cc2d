//! Directory ("builder") document schema
//!
//! The directory collection is owned by the wider application; this crate only
//! creates minimal records, so unrelated profile fields keep their defaults.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for directory records
pub const BUILDER_COLLECTION: &str = "builders";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BuilderDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Directory key
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// `[longitude, latitude]`; records created elsewhere may lack one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec<f64>>,

    #[serde(default)]
    pub calculating_score: bool,

    #[serde(default)]
    pub human_checkmark: bool,

    #[serde(default)]
    pub verified_nationality: bool,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl BuilderDoc {
    /// Minimal record carrying only a name and a location
    pub fn minimal(name: String, location: Option<[f64; 2]>) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            name,
            display_name: None,
            location: location.map(|l| l.to_vec()),
            calculating_score: false,
            human_checkmark: false,
            verified_nationality: false,
            tags: Vec::new(),
        }
    }
}

impl IntoIndexes for BuilderDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "name": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("name_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for BuilderDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
