//! Directory provisioning
//!
//! Any newly discovered name gets a minimal directory record so the rest of the
//! application can rely on one existing. Records created here carry a
//! uniformly random but valid `[longitude, latitude]`, which the directory
//! schema requires.

mod store;

pub use store::{InMemoryDirectoryStore, MongoDirectoryStore};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::types::{NamebridgeError, Result};

/// Minimal view of a directory record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryRecord {
    pub id: Option<String>,
    pub name: String,
    /// `[longitude, latitude]`, absent on records created elsewhere without one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 2]>,
    pub created_at: DateTime<Utc>,
}

/// Storage for directory records, unique by name
#[async_trait::async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<DirectoryRecord>>;

    /// Insert a new record; `DuplicateKey` if the name is taken
    async fn insert(&self, record: DirectoryRecord) -> Result<DirectoryRecord>;
}

/// Uniform sample over the valid coordinate domain:
/// longitude in [-180, 180), latitude in [-90, 90]
pub fn random_location<R: Rng + ?Sized>(rng: &mut R) -> [f64; 2] {
    let longitude = rng.gen_range(-180.0..180.0);
    let latitude = rng.gen_range(-90.0..=90.0);
    [longitude, latitude]
}

pub fn is_valid_location(location: &[f64; 2]) -> bool {
    let [lon, lat] = *location;
    (-180.0..180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
}

/// Creates directory records on demand
pub struct DirectoryProvisioner {
    store: Arc<dyn DirectoryStore>,
}

impl DirectoryProvisioner {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    /// Return the record for `name`, creating a minimal one if missing
    pub async fn ensure_record_for_name(&self, name: &str) -> Result<DirectoryRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(NamebridgeError::InvalidInput(
                "directory name must not be empty".to_string(),
            ));
        }

        if let Some(existing) = self.store.find_by_name(name).await? {
            debug!(name = %name, "Directory record exists");
            return Ok(existing);
        }

        // ThreadRng is !Send; keep it out of the await points
        let location = random_location(&mut rand::thread_rng());
        let record = DirectoryRecord {
            id: None,
            name: name.to_string(),
            location: Some(location),
            created_at: Utc::now(),
        };

        match self.store.insert(record).await {
            Ok(created) => {
                info!(name = %name, lon = location[0], lat = location[1], "Provisioned directory record");
                Ok(created)
            }
            Err(NamebridgeError::DuplicateKey(_)) => {
                warn!(name = %name, "Directory record created concurrently, re-fetching");
                self.store.find_by_name(name).await?.ok_or_else(|| {
                    NamebridgeError::Storage(format!(
                        "directory record '{}' vanished after duplicate insert",
                        name
                    ))
                })
            }
            Err(e) => Err(e),
        }
    }
}
