//! In-memory name/address cache (tests and local development)

use chrono::Utc;
use dashmap::DashMap;

use super::{NameAddressCache, NameAddressRecord};
use crate::chain::Address;
use crate::types::Result;

#[derive(Default)]
pub struct InMemoryNameAddressCache {
    records: DashMap<Address, NameAddressRecord>,
}

impl InMemoryNameAddressCache {
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
impl NameAddressCache for InMemoryNameAddressCache {
    async fn get_address_by_name(&self, name: &str) -> Result<Option<Address>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.name == name)
            .max_by_key(|r| r.updated_at)
            .map(|r| r.address))
    }

    async fn get_name_by_address(&self, address: &Address) -> Result<Option<String>> {
        Ok(self.records.get(address).map(|r| r.name.clone()))
    }

    async fn upsert(&self, address: &Address, name: &str) -> Result<NameAddressRecord> {
        let now = Utc::now();
        // entry() holds the shard lock, so this is atomic per address
        let mut entry = self
            .records
            .entry(*address)
            .or_insert_with(|| NameAddressRecord {
                address: *address,
                name: name.to_string(),
                created_at: now,
                updated_at: now,
            });

        if entry.name != name {
            entry.name = name.to_string();
            entry.updated_at = now;
        }

        Ok(entry.clone())
    }

    async fn delete_by_address(&self, address: &Address) -> Result<bool> {
        Ok(self.records.remove(address).is_some())
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool> {
        let victim = self
            .records
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.address);

        Ok(match victim {
            Some(address) => self.records.remove(&address).is_some(),
            None => false,
        })
    }

    async fn list_all(&self) -> Result<Vec<NameAddressRecord>> {
        let mut all: Vec<_> = self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|r| r.created_at);
        Ok(all)
    }
}
