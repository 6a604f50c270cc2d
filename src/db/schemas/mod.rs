//! Database schemas
//!
//! MongoDB document structures for the name/address cache and the
//! directory ("builder") records it provisions.

mod address_name;
mod builder;
mod metadata;

pub use address_name::{AddressNameDoc, ADDRESS_NAME_COLLECTION};
pub use builder::{BuilderDoc, BUILDER_COLLECTION};
pub use metadata::Metadata;
