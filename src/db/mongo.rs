//! MongoDB client and collection wrapper
//!
//! Typed collections apply their schema indexes on open and stamp metadata
//! timestamps on insert. Write errors from unique indexes are reported as
//! [`NamebridgeError::DuplicateKey`] so callers can treat them as races.

use bson::{doc, oid::ObjectId, DateTime, Document};
use futures::{TryStream, TryStreamExt};
use mongodb::{
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument, UpdateModifications},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::db::schemas::Metadata;
use crate::types::NamebridgeError;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// Whether a driver error is a unique index violation
pub fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// Collect every document of a cursor; the first read error fails the whole read
async fn drain<T, S>(cursor: S) -> Result<Vec<T>, NamebridgeError>
where
    S: TryStream<Ok = T, Error = MongoError>,
{
    cursor
        .try_collect()
        .await
        .map_err(|e| storage_error("Find failed", e))
}

fn storage_error(context: &str, err: MongoError) -> NamebridgeError {
    if is_duplicate_key(&err) {
        NamebridgeError::DuplicateKey(format!("{}: {}", context, err))
    } else {
        NamebridgeError::Storage(format!("{}: {}", context, err))
    }
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the server answers a ping
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, NamebridgeError> {
        info!("Connecting to MongoDB at {}", uri);

        // Bounded server selection so an unreachable server fails fast
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| NamebridgeError::Storage(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| NamebridgeError::Storage(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, NamebridgeError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
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
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
{
    /// Open a collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, NamebridgeError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), NamebridgeError> {
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
            .map_err(|e| storage_error("Failed to create indexes", e))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, NamebridgeError> {
        let metadata = item.mut_metadata();
        metadata.is_deleted = false;
        metadata.created_at = Some(DateTime::now());
        metadata.updated_at = Some(DateTime::now());

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| storage_error("Insert failed", e))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| NamebridgeError::Storage("Failed to get inserted ID".into()))
    }

    /// Find one live document, newest update first when several match
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, NamebridgeError> {
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        self.inner
            .find_one(full_filter)
            .sort(doc! { "metadata.updated_at": -1 })
            .await
            .map_err(|e| storage_error("Find failed", e))
    }

    /// Find many live documents
    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>, NamebridgeError> {
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        let cursor = self
            .inner
            .find(full_filter)
            .await
            .map_err(|e| storage_error("Find failed", e))?;

        drain(cursor).await
    }

    /// Atomically update-or-insert a single document and return it post-update
    pub async fn upsert_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<Option<T>, NamebridgeError> {
        self.inner
            .find_one_and_update(filter, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| storage_error("Upsert failed", e))
    }

    /// Hard delete one document; returns whether anything was removed
    pub async fn delete_one(&self, filter: Document) -> Result<bool, NamebridgeError> {
        let result = self
            .inner
            .delete_one(filter)
            .await
            .map_err(|e| storage_error("Delete failed", e))?;

        Ok(result.deleted_count > 0)
    }
}
