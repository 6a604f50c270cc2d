//! Address/name mapping document
//!
//! One document per canonical address; the name is indexed but not unique.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for address/name mappings
pub const ADDRESS_NAME_COLLECTION: &str = "address_names";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AddressNameDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// EIP-55 checksummed address
    pub address: String,

    /// Last resolved human-readable name
    pub name: String,
}

impl IntoIndexes for AddressNameDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "address": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("address_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "name": 1 },
                Some(
                    IndexOptions::builder()
                        .name("name_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "address": 1, "name": 1 },
                Some(
                    IndexOptions::builder()
                        .name("address_name_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for AddressNameDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
