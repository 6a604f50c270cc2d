//! Common document metadata
//!
//! Creation/update timestamps plus the soft-delete marker the collection
//! wrapper filters on.

use bson::DateTime;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    #[serde(default)]
    pub is_deleted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Fresh metadata stamped with the current time
    pub fn new() -> Self {
        let now = DateTime::now();
        Self {
            is_deleted: false,
            deleted_at: None,
            updated_at: Some(now),
            created_at: Some(now),
        }
    }

    /// Creation time, falling back to now for legacy documents without one
    pub fn created(&self) -> chrono::DateTime<Utc> {
        self.created_at
            .map(|d| d.to_chrono())
            .unwrap_or_else(Utc::now)
    }

    /// Last update time, falling back to the creation time
    pub fn updated(&self) -> chrono::DateTime<Utc> {
        self.updated_at
            .map(|d| d.to_chrono())
            .unwrap_or_else(|| self.created())
    }
}
