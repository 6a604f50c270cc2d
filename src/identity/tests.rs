use super::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cache::InMemoryNameAddressCache;
use crate::directory::InMemoryDirectoryStore;

const ALICE: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
const BOB: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
const CAROL: &str = "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB";

fn addr(s: &str) -> Address {
    Address::parse(s).unwrap()
}

/// Naming service backed by two maps, counting every lookup
#[derive(Default)]
struct CountingNaming {
    forward: HashMap<String, Address>,
    reverse: HashMap<Address, String>,
    forward_calls: AtomicUsize,
    reverse_calls: AtomicUsize,
    down: bool,
}

impl CountingNaming {
    fn calls(&self) -> usize {
        self.forward_calls.load(Ordering::SeqCst) + self.reverse_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NamingService for CountingNaming {
    async fn resolve_name_to_address(&self, input: &str) -> Result<Lookup<Address>> {
        self.forward_calls.fetch_add(1, Ordering::SeqCst);
        if self.down {
            return Err(NamebridgeError::ResolverUnavailable("rpc timeout".into()));
        }
        Ok(self.forward.get(input).copied().into())
    }

    async fn resolve_address_to_name(&self, address: &Address) -> Result<Lookup<String>> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        if self.down {
            return Err(NamebridgeError::ResolverUnavailable("rpc timeout".into()));
        }
        Ok(self.reverse.get(address).cloned().into())
    }
}

/// Profile search answering the same outcome for every address
struct StubProfiles {
    enabled: bool,
    outcome: ProfileMatch,
    calls: AtomicUsize,
}

impl StubProfiles {
    fn answering(outcome: ProfileMatch) -> Self {
        Self {
            enabled: true,
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    fn disabled() -> Self {
        Self {
            enabled: false,
            outcome: ProfileMatch::NoMatch,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl ProfileSearch for StubProfiles {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn resolve_name_by_address(&self, _address: &Address) -> ProfileMatch {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Cache whose backing store is down
struct BrokenCache;

#[async_trait::async_trait]
impl NameAddressCache for BrokenCache {
    async fn get_address_by_name(&self, _name: &str) -> Result<Option<Address>> {
        Err(NamebridgeError::Storage("server selection timeout".into()))
    }

    async fn get_name_by_address(&self, _address: &Address) -> Result<Option<String>> {
        Err(NamebridgeError::Storage("server selection timeout".into()))
    }

    async fn upsert(&self, _address: &Address, _name: &str) -> Result<NameAddressRecord> {
        Err(NamebridgeError::Storage("server selection timeout".into()))
    }

    async fn delete_by_address(&self, _address: &Address) -> Result<bool> {
        Err(NamebridgeError::Storage("server selection timeout".into()))
    }

    async fn delete_by_name(&self, _name: &str) -> Result<bool> {
        Err(NamebridgeError::Storage("server selection timeout".into()))
    }

    async fn list_all(&self) -> Result<Vec<NameAddressRecord>> {
        Err(NamebridgeError::Storage("server selection timeout".into()))
    }
}

/// Fixed relationship sets
#[derive(Default)]
struct StubGraph {
    friends: Vec<Address>,
    pending_sent: Vec<Address>,
    pending_received: Vec<Address>,
}

#[async_trait::async_trait]
impl SocialGraph for StubGraph {
    async fn are_friends(&self, a: &Address, b: &Address) -> Result<bool> {
        Ok(a != b && self.friends.contains(b))
    }

    async fn friends_count(&self, _user: &Address) -> Result<u64> {
        Ok(self.friends.len() as u64)
    }

    async fn get_friends(&self, _user: &Address) -> Result<Vec<Address>> {
        Ok(self.friends.clone())
    }

    async fn pending_sent_count(&self, _user: &Address) -> Result<u64> {
        Ok(self.pending_sent.len() as u64)
    }

    async fn get_pending_sent(&self, _user: &Address) -> Result<Vec<Address>> {
        Ok(self.pending_sent.clone())
    }

    async fn pending_recv_count(&self, _user: &Address) -> Result<u64> {
        Ok(self.pending_received.len() as u64)
    }

    async fn get_pending_received(&self, _user: &Address) -> Result<Vec<Address>> {
        Ok(self.pending_received.clone())
    }
}

struct Harness {
    cache: Arc<InMemoryNameAddressCache>,
    directory: Arc<InMemoryDirectoryStore>,
    naming: Arc<CountingNaming>,
    profiles: Arc<StubProfiles>,
    service: IdentityResolutionService,
}

fn harness(naming: CountingNaming, profiles: StubProfiles) -> Harness {
    let cache = Arc::new(InMemoryNameAddressCache::new());
    let directory = Arc::new(InMemoryDirectoryStore::new());
    let naming = Arc::new(naming);
    let profiles = Arc::new(profiles);

    let service = IdentityResolutionService::new(
        cache.clone(),
        naming.clone(),
        profiles.clone(),
        DirectoryProvisioner::new(directory.clone()),
        ResolutionConfig::default(),
    );

    Harness {
        cache,
        directory,
        naming,
        profiles,
        service,
    }
}

fn alice_naming() -> CountingNaming {
    let mut naming = CountingNaming::default();
    naming.forward.insert("alice.eth".to_string(), addr(ALICE));
    naming
}

// =============================================================================
// Address → name
// =============================================================================

#[tokio::test]
async fn test_cache_hit_skips_resolvers() {
    let h = harness(CountingNaming::default(), StubProfiles::answering(ProfileMatch::Unnamed));
    h.cache.upsert(&addr(ALICE), "alice.eth").await.unwrap();

    let got = h.service.address_to_name(ALICE).await.unwrap();

    assert_eq!(got, Lookup::Found("alice.eth".to_string()));
    assert_eq!(h.naming.calls(), 0);
    assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_naming_service_wins_over_profile_search() {
    let mut naming = CountingNaming::default();
    naming.reverse.insert(addr(BOB), "bob.eth".to_string());
    let h = harness(naming, StubProfiles::answering(ProfileMatch::Named("robert".into())));

    let got = h.service.address_to_name(BOB).await.unwrap();

    assert_eq!(got, Lookup::Found("bob.eth".to_string()));
    assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        h.cache.get_name_by_address(&addr(BOB)).await.unwrap(),
        Some("bob.eth".to_string())
    );
    // naming-service reverse hits are not provisioned here
    assert!(h.directory.is_empty());
}

#[tokio::test]
async fn test_profile_search_fallback_writes_back_and_provisions() {
    let h = harness(
        CountingNaming::default(),
        StubProfiles::answering(ProfileMatch::Named("robert".into())),
    );

    let got = h.service.address_to_name(BOB).await.unwrap();

    assert_eq!(got, Lookup::Found("robert".to_string()));
    assert_eq!(
        h.cache.get_name_by_address(&addr(BOB)).await.unwrap(),
        Some("robert".to_string())
    );
    assert_eq!(h.directory.len(), 1);
}

#[tokio::test]
async fn test_self_mapping_when_profile_has_no_name() {
    let h = harness(CountingNaming::default(), StubProfiles::answering(ProfileMatch::Unnamed));

    let got = h.service.address_to_name(&CAROL.to_lowercase()).await.unwrap();

    assert_eq!(got, Lookup::Found(CAROL.to_string()));
    assert_eq!(
        h.cache.get_name_by_address(&addr(CAROL)).await.unwrap(),
        Some(CAROL.to_string())
    );

    // second call is served from the cache
    h.service.address_to_name(CAROL).await.unwrap();
    assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disabled_profile_search_is_not_found() {
    let h = harness(CountingNaming::default(), StubProfiles::disabled());

    let got = h.service.address_to_name(BOB).await.unwrap();

    assert_eq!(got, Lookup::NotFound);
    assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 0);
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_profile_search_failure_is_not_found() {
    let h = harness(CountingNaming::default(), StubProfiles::answering(ProfileMatch::NoMatch));

    assert_eq!(h.service.address_to_name(BOB).await.unwrap(), Lookup::NotFound);
    assert!(h.cache.is_empty());
    assert!(h.directory.is_empty());
}

#[tokio::test]
async fn test_malformed_address_is_invalid_input() {
    let h = harness(CountingNaming::default(), StubProfiles::answering(ProfileMatch::Unnamed));

    for bad in ["", "0x1234", "not-an-address", "0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"] {
        let result = h.service.address_to_name(bad).await;
        assert!(matches!(result, Err(NamebridgeError::InvalidInput(_))), "{}", bad);
    }
    assert_eq!(h.naming.calls(), 0);
}

#[tokio::test]
async fn test_naming_outage_propagates() {
    let naming = CountingNaming {
        down: true,
        ..Default::default()
    };
    let h = harness(naming, StubProfiles::answering(ProfileMatch::Named("robert".into())));

    assert!(matches!(
        h.service.address_to_name(BOB).await,
        Err(NamebridgeError::ResolverUnavailable(_))
    ));
    // an outage is not a miss: the fallback is not consulted
    assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_storage_failure_is_not_a_miss() {
    let service = IdentityResolutionService::new(
        Arc::new(BrokenCache),
        Arc::new(alice_naming()),
        Arc::new(StubProfiles::disabled()),
        DirectoryProvisioner::new(Arc::new(InMemoryDirectoryStore::new())),
        ResolutionConfig::default(),
    );

    assert!(matches!(
        service.address_to_name(ALICE).await,
        Err(NamebridgeError::Storage(_))
    ));
    assert!(matches!(
        service.name_to_address("alice").await,
        Err(NamebridgeError::Storage(_))
    ));
}

// =============================================================================
// Name → address
// =============================================================================

#[tokio::test]
async fn test_name_to_address_is_idempotent() {
    let h = harness(alice_naming(), StubProfiles::disabled());

    let first = h.service.name_to_address("alice").await.unwrap();
    let calls_after_first = h.naming.calls();
    let second = h.service.name_to_address("Alice.ETH").await.unwrap();

    assert_eq!(first, Lookup::Found(addr(ALICE)));
    assert_eq!(first, second);
    assert_eq!(calls_after_first, 1);
    assert_eq!(h.naming.calls(), 1);
}

#[tokio::test]
async fn test_round_trip_needs_no_reverse_record() {
    let h = harness(alice_naming(), StubProfiles::disabled());

    let address = h.service.name_to_address("alice").await.unwrap().found().unwrap();
    let name = h.service.resolve_address(&address).await.unwrap();

    assert_eq!(name, Lookup::Found("alice.eth".to_string()));
    assert_eq!(h.naming.reverse_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_profile_name_resolves_back_from_cache() {
    let h = harness(
        CountingNaming::default(),
        StubProfiles::answering(ProfileMatch::Named("Robert".into())),
    );

    assert_eq!(
        h.service.address_to_name(BOB).await.unwrap(),
        Lookup::Found("Robert".to_string())
    );

    let got = h.service.name_to_address("Robert").await.unwrap();
    assert_eq!(got, Lookup::Found(addr(BOB)));
    assert_eq!(h.naming.forward_calls.load(Ordering::SeqCst), 0);

    // surrounding whitespace is not part of the name
    let got = h.service.name_to_address("  Robert ").await.unwrap();
    assert_eq!(got, Lookup::Found(addr(BOB)));
    assert_eq!(h.naming.forward_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unregistered_name_is_not_found() {
    let h = harness(CountingNaming::default(), StubProfiles::answering(ProfileMatch::Unnamed));

    assert_eq!(h.service.name_to_address("ghost").await.unwrap(), Lookup::NotFound);
    // no profile-search fallback in this direction
    assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 0);
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_address_input_passes_through() {
    let h = harness(CountingNaming::default(), StubProfiles::disabled());

    let got = h.service.name_to_address(&ALICE.to_lowercase()).await.unwrap();

    assert_eq!(got, Lookup::Found(addr(ALICE)));
    assert_eq!(h.naming.calls(), 0);
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_empty_name_is_invalid_input() {
    let h = harness(CountingNaming::default(), StubProfiles::disabled());
    assert!(matches!(
        h.service.name_to_address("   ").await,
        Err(NamebridgeError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_name_to_address_does_not_provision() {
    let h = harness(alice_naming(), StubProfiles::disabled());
    h.service.name_to_address("alice").await.unwrap();
    assert!(h.directory.is_empty());
}

#[tokio::test]
async fn test_resolve_and_cache_provisions_new_identity_once() {
    let h = harness(alice_naming(), StubProfiles::disabled());

    let got = h.service.resolve_and_cache("alice").await.unwrap();
    assert_eq!(got, Lookup::Found(addr(ALICE)));
    assert_eq!(h.directory.len(), 1);

    // cache hit: nothing new established, nothing provisioned
    let again = h.service.resolve_and_cache("alice.eth").await.unwrap();
    assert_eq!(again, got);
    assert_eq!(h.directory.len(), 1);
}

#[tokio::test]
async fn test_resolve_and_cache_skips_provisioning_on_miss() {
    let h = harness(CountingNaming::default(), StubProfiles::disabled());

    assert_eq!(h.service.resolve_and_cache("ghost").await.unwrap(), Lookup::NotFound);
    assert!(h.directory.is_empty());
}

#[tokio::test]
async fn test_ensure_directory_record_delegates() {
    let h = harness(CountingNaming::default(), StubProfiles::disabled());

    let record = h.service.ensure_directory_record("dave.eth").await.unwrap();
    assert_eq!(record.name, "dave.eth");
    assert_eq!(h.directory.len(), 1);
}

// =============================================================================
// Social graph
// =============================================================================

fn graph_harness() -> Harness {
    let mut naming = CountingNaming::default();
    naming.reverse.insert(addr(BOB), "bob.eth".to_string());
    let mut h = harness(naming, StubProfiles::disabled());

    let graph = StubGraph {
        friends: vec![addr(BOB)],
        pending_sent: vec![],
        pending_received: vec![addr(ALICE), addr(BOB), addr(CAROL)],
    };
    h.service = IdentityResolutionService::new(
        h.cache.clone(),
        h.naming.clone(),
        h.profiles.clone(),
        DirectoryProvisioner::new(h.directory.clone()),
        ResolutionConfig::default(),
    )
    .with_graph(Arc::new(graph));
    h
}

#[tokio::test]
async fn test_batch_reconciliation_preserves_order() {
    let h = graph_harness();

    let members = h
        .service
        .resolve_and_cache_friends_of(CAROL, RelationshipKind::PendingReceived)
        .await
        .unwrap();

    assert_eq!(
        members,
        vec![
            ResolvedMember { address: addr(ALICE), name: None },
            ResolvedMember { address: addr(BOB), name: Some("bob.eth".to_string()) },
            ResolvedMember { address: addr(CAROL), name: None },
        ]
    );
}

#[tokio::test]
async fn test_relationship_view_resolves_every_set() {
    let h = graph_harness();

    let view = h.service.relationship_view(ALICE).await.unwrap();

    assert_eq!(view.address, addr(ALICE));
    assert_eq!(view.friends[0].name.as_deref(), Some("bob.eth"));
    assert!(view.pending_sent.is_empty());
    assert_eq!(view.pending_received.len(), 3);
}

#[tokio::test]
async fn test_batch_propagates_resolver_outage() {
    let naming = CountingNaming {
        down: true,
        ..Default::default()
    };
    let service = IdentityResolutionService::new(
        Arc::new(InMemoryNameAddressCache::new()),
        Arc::new(naming),
        Arc::new(StubProfiles::disabled()),
        DirectoryProvisioner::new(Arc::new(InMemoryDirectoryStore::new())),
        ResolutionConfig::default(),
    )
    .with_graph(Arc::new(StubGraph {
        friends: vec![addr(BOB)],
        ..Default::default()
    }));

    assert!(matches!(
        service
            .resolve_and_cache_friends_of(ALICE, RelationshipKind::Friends)
            .await,
        Err(NamebridgeError::ResolverUnavailable(_))
    ));
}

#[tokio::test]
async fn test_graph_operations_validate_input() {
    let h = graph_harness();

    assert!(matches!(
        h.service
            .resolve_and_cache_friends_of("0xnope", RelationshipKind::Friends)
            .await,
        Err(NamebridgeError::InvalidInput(_))
    ));
    assert!(matches!(
        h.service.are_friends(ALICE, "bob").await,
        Err(NamebridgeError::InvalidInput(_))
    ));
    assert!(h.service.are_friends(ALICE, BOB).await.unwrap());
}

#[tokio::test]
async fn test_relationship_counts() {
    let h = graph_harness();

    let counts = h.service.relationship_counts(ALICE).await.unwrap();

    assert_eq!(counts.address, addr(ALICE));
    assert_eq!((counts.friends, counts.pending_sent, counts.pending_received), (1, 0, 3));
    assert!(matches!(
        h.service.relationship_counts("alice.eth").await,
        Err(NamebridgeError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_graph_operations_need_a_graph_client() {
    let h = harness(CountingNaming::default(), StubProfiles::disabled());

    assert!(matches!(
        h.service.relationship_view(ALICE).await,
        Err(NamebridgeError::Config(_))
    ));
    assert!(matches!(
        h.service.relationship_counts(ALICE).await,
        Err(NamebridgeError::Config(_))
    ));
}

// =============================================================================
// Administration
// =============================================================================

#[tokio::test]
async fn test_purge_then_list() {
    let h = harness(alice_naming(), StubProfiles::disabled());
    h.service.name_to_address("alice").await.unwrap();
    h.cache.upsert(&addr(BOB), "bob.eth").await.unwrap();

    assert_eq!(h.service.list_mappings().await.unwrap().len(), 2);
    assert!(h.service.purge_address(ALICE).await.unwrap());
    assert!(!h.service.purge_address(ALICE).await.unwrap());
    assert!(h.service.purge_name("bob.eth").await.unwrap());
    assert!(h.service.list_mappings().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_purge_name_matches_lookup_rules() {
    let h = harness(alice_naming(), StubProfiles::disabled());
    h.service.name_to_address("alice").await.unwrap();
    h.cache.upsert(&addr(BOB), "Robert").await.unwrap();

    // bare label removes the qualified mapping
    assert!(h.service.purge_name(" alice ").await.unwrap());
    assert_eq!(h.cache.get_address_by_name("alice.eth").await.unwrap(), None);

    // verbatim names are removed as stored
    assert!(h.service.purge_name("Robert").await.unwrap());
    assert!(!h.service.purge_name("Robert").await.unwrap());
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_purge_name_rejects_blank() {
    let h = harness(CountingNaming::default(), StubProfiles::disabled());
    assert!(matches!(
        h.service.purge_name(" ").await,
        Err(NamebridgeError::InvalidInput(_))
    ));
}
