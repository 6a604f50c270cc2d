//! Directory record stores

use bson::doc;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::{DirectoryRecord, DirectoryStore};
use crate::db::schemas::{BuilderDoc, BUILDER_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{NamebridgeError, Result};

/// MongoDB-backed directory store
pub struct MongoDirectoryStore {
    collection: MongoCollection<BuilderDoc>,
}

impl MongoDirectoryStore {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let collection = mongo.collection::<BuilderDoc>(BUILDER_COLLECTION).await?;
        Ok(Self { collection })
    }
}

/// Records written by other parts of the application may carry no location
/// or a malformed one; both surface as `None`.
fn into_record(doc: BuilderDoc) -> DirectoryRecord {
    let location = doc
        .location
        .as_deref()
        .and_then(|l| <[f64; 2]>::try_from(l).ok());
    if location.is_none() && doc.location.is_some() {
        debug!(name = %doc.name, location = ?doc.location, "Ignoring malformed location");
    }

    DirectoryRecord {
        id: doc._id.map(|id| id.to_hex()),
        name: doc.name,
        location,
        created_at: doc.metadata.created(),
    }
}

#[async_trait::async_trait]
impl DirectoryStore for MongoDirectoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<DirectoryRecord>> {
        self.collection
            .find_one(doc! { "name": name })
            .await
            .map(|found| found.map(into_record))
    }

    async fn insert(&self, record: DirectoryRecord) -> Result<DirectoryRecord> {
        let doc = BuilderDoc::minimal(record.name.clone(), record.location);
        let id = self.collection.insert_one(doc).await?;

        Ok(DirectoryRecord {
            id: Some(id.to_hex()),
            ..record
        })
    }
}

/// In-memory directory store (tests and local development)
#[derive(Default)]
pub struct InMemoryDirectoryStore {
    records: DashMap<String, DirectoryRecord>,
}

impl InMemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl DirectoryStore for InMemoryDirectoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<DirectoryRecord>> {
        Ok(self.records.get(name).map(|r| r.clone()))
    }

    async fn insert(&self, record: DirectoryRecord) -> Result<DirectoryRecord> {
        match self.records.entry(record.name.clone()) {
            Entry::Occupied(_) => Err(NamebridgeError::DuplicateKey(format!(
                "directory record '{}' already exists",
                record.name
            ))),
            Entry::Vacant(slot) => {
                let stored = DirectoryRecord {
                    id: Some(format!("mem-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())),
                    ..record
                };
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }
}
