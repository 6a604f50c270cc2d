//! MongoDB-backed name/address cache

use bson::{doc, DateTime, Document};
use tracing::{debug, info, warn};

use super::{NameAddressCache, NameAddressRecord};
use crate::chain::Address;
use crate::db::schemas::{AddressNameDoc, ADDRESS_NAME_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{NamebridgeError, Result};

pub struct MongoNameAddressCache {
    collection: MongoCollection<AddressNameDoc>,
}

impl MongoNameAddressCache {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let collection = mongo
            .collection::<AddressNameDoc>(ADDRESS_NAME_COLLECTION)
            .await?;
        Ok(Self { collection })
    }

    async fn set_name(&self, address: &str, name: &str) -> Result<Option<AddressNameDoc>> {
        self.collection
            .upsert_one(doc! { "address": address }, name_update(name, DateTime::now()))
            .await
    }
}

/// Update for an upserted mapping; a soft-deleted row for the address is revived
fn name_update(name: &str, now: DateTime) -> Document {
    doc! {
        "$set": {
            "name": name,
            "metadata.is_deleted": false,
            "metadata.updated_at": now,
        },
        "$unset": {
            "metadata.deleted_at": "",
        },
        "$setOnInsert": {
            "metadata.created_at": now,
        }
    }
}

fn into_record(doc: AddressNameDoc) -> Result<NameAddressRecord> {
    let address = Address::parse(&doc.address).map_err(|_| {
        NamebridgeError::Storage(format!("corrupt address in cache: {}", doc.address))
    })?;

    Ok(NameAddressRecord {
        address,
        name: doc.name,
        created_at: doc.metadata.created(),
        updated_at: doc.metadata.updated(),
    })
}

#[async_trait::async_trait]
impl NameAddressCache for MongoNameAddressCache {
    async fn get_address_by_name(&self, name: &str) -> Result<Option<Address>> {
        self.collection
            .find_one(doc! { "name": name })
            .await?
            .map(|d| into_record(d).map(|r| r.address))
            .transpose()
    }

    async fn get_name_by_address(&self, address: &Address) -> Result<Option<String>> {
        Ok(self
            .collection
            .find_one(doc! { "address": address.to_checksum() })
            .await?
            .map(|d| d.name))
    }

    async fn upsert(&self, address: &Address, name: &str) -> Result<NameAddressRecord> {
        let key = address.to_checksum();

        if let Some(existing) = self.collection.find_one(doc! { "address": &key }).await? {
            if existing.name == name {
                debug!(address = %address, name = %name, "Mapping unchanged");
                return into_record(existing);
            }
        }

        // Two concurrent upserts for an unseen address can both miss and race on
        // the unique index; the loser retries as a plain update.
        let updated = match self.set_name(&key, name).await {
            Err(NamebridgeError::DuplicateKey(e)) => {
                warn!(address = %address, error = %e, "Concurrent upsert, retrying");
                self.set_name(&key, name).await?
            }
            other => other?,
        };

        let doc = updated.ok_or_else(|| {
            NamebridgeError::Storage(format!("upsert for {} returned no document", key))
        })?;

        info!(address = %address, name = %name, "Stored address/name mapping");
        into_record(doc)
    }

    async fn delete_by_address(&self, address: &Address) -> Result<bool> {
        self.collection
            .delete_one(doc! { "address": address.to_checksum() })
            .await
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool> {
        self.collection.delete_one(doc! { "name": name }).await
    }

    async fn list_all(&self) -> Result<Vec<NameAddressRecord>> {
        self.collection
            .find_many(doc! {})
            .await?
            .into_iter()
            .map(into_record)
            .collect()
    }
}
