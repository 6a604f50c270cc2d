//! External identity resolvers
//!
//! - **Naming**: ENS forward/reverse lookups over Ethereum JSON-RPC
//! - **ProfileSearch**: advisory address → name fallback via a profile-search API
//!
//! Resolvers return `Result<Lookup<T>>`: `Ok(Found)` stops the chain,
//! `Ok(NotFound)` lets the caller try the next strategy and `Err` propagates.

pub mod naming;
pub mod profile_search;

pub use naming::{dns_encode, normalize_name, EnsConfig, EnsResolver, NamingService};
pub use profile_search::{ProfileMatch, ProfileSearch, ProfileSearchConfig, TalentProfileSearch};

/// Outcome of a single lookup that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(v) => Lookup::Found(f(v)),
            Lookup::NotFound => Lookup::NotFound,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Lookup::Found(v),
            None => Lookup::NotFound,
        }
    }
}
