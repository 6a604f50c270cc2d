//! Profile-search resolver
//!
//! Advisory address → name fallback backed by the Talent Protocol advanced
//! profile search. It never fails: a missing API key, HTTP errors and
//! undecodable bodies all come back as [`ProfileMatch::NoMatch`].

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::chain::Address;

/// Configuration for the profile-search client
#[derive(Debug, Clone)]
pub struct ProfileSearchConfig {
    /// API base URL
    pub base_url: String,
    /// API key; `None` disables the resolver
    pub api_key: Option<String>,
    /// Timeout for HTTP requests
    pub request_timeout: Duration,
}

impl Default for ProfileSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.talentprotocol.com".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Result of a profile search for one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileMatch {
    /// First profile with a non-empty name
    Named(String),
    /// The API answered but no profile carries a usable name
    Unnamed,
    /// Disabled, or the API could not be consulted
    NoMatch,
}

#[async_trait::async_trait]
pub trait ProfileSearch: Send + Sync {
    /// Whether lookups can produce anything at all
    fn is_enabled(&self) -> bool;

    async fn resolve_name_by_address(&self, address: &Address) -> ProfileMatch;
}

#[derive(Debug, Deserialize)]
struct ProfilesResponse {
    #[serde(default)]
    profiles: Vec<Profile>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(default)]
    name: Option<String>,
}

fn pick_name(response: ProfilesResponse) -> ProfileMatch {
    response
        .profiles
        .into_iter()
        .filter_map(|p| p.name)
        .map(|n| n.trim().to_string())
        .find(|n| !n.is_empty())
        .map(ProfileMatch::Named)
        .unwrap_or(ProfileMatch::Unnamed)
}

/// Talent Protocol profile-search client
pub struct TalentProfileSearch {
    config: ProfileSearchConfig,
    http_client: reqwest::Client,
}

impl TalentProfileSearch {
    pub fn new(config: ProfileSearchConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent("namebridge/0.1")
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
        }
    }

    fn search_url(&self) -> String {
        format!(
            "{}/search/advanced/profiles",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl ProfileSearch for TalentProfileSearch {
    fn is_enabled(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    async fn resolve_name_by_address(&self, address: &Address) -> ProfileMatch {
        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            return ProfileMatch::NoMatch;
        };

        let query = json!({ "identity": address.to_checksum(), "exactMatch": false }).to_string();
        debug!(address = %address, "Searching profiles");

        let response = match self
            .http_client
            .get(self.search_url())
            .header("X-API-KEY", api_key)
            .header("Accept", "application/json")
            .query(&[("query", query)])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(address = %address, error = %e, "Profile search request failed");
                return ProfileMatch::NoMatch;
            }
        };

        if !response.status().is_success() {
            warn!(address = %address, status = %response.status(), "Profile search returned error status");
            return ProfileMatch::NoMatch;
        }

        match response.json::<ProfilesResponse>().await {
            Ok(body) => pick_name(body),
            Err(e) => {
                warn!(address = %address, error = %e, "Profile search returned undecodable body");
                ProfileMatch::NoMatch
            }
        }
    }
}
