//! namebridge - name/address identity resolution CLI

use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use namebridge::{
    cache::MongoNameAddressCache,
    chain::ProviderCaller,
    config::{Args, Command},
    db::MongoClient,
    directory::{DirectoryProvisioner, MongoDirectoryStore},
    identity::IdentityResolutionService,
    onchain::FriendManagerClient,
    resolvers::{EnsResolver, TalentProfileSearch},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("namebridge={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let profile_config = args.profile_search_config();
    info!("======================================");
    info!("  namebridge");
    info!("======================================");
    info!("MongoDB: {} / {}", args.mongodb_uri, args.mongodb_db);
    info!("ENS RPC: {}", args.eth_rpc_url);
    info!("Graph RPC: {}", args.graph_rpc_url());
    info!(
        "Profile search: {}",
        if profile_config.api_key.is_some() { "enabled" } else { "disabled" }
    );
    info!("Resolve concurrency: {}", args.resolve_concurrency);
    info!("======================================");

    let mongo = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
    info!("MongoDB connected successfully");

    let cache = Arc::new(MongoNameAddressCache::new(&mongo).await?);
    let directory = Arc::new(MongoDirectoryStore::new(&mongo).await?);
    let naming = Arc::new(EnsResolver::new(
        args.ens_config()?,
        Arc::new(ProviderCaller::new(&args.ens_rpc())?),
    )?);
    let profiles = Arc::new(TalentProfileSearch::new(profile_config));

    let mut service = IdentityResolutionService::new(
        cache,
        naming,
        profiles,
        DirectoryProvisioner::new(directory),
        args.resolution_config(),
    );

    if args.contract_address.is_some() {
        let graph = FriendManagerClient::new(
            &args.friend_graph_config()?,
            Arc::new(ProviderCaller::new(&args.graph_rpc())?),
        )?;
        info!("FriendManager: {}", graph.contract());
        service = service.with_graph(Arc::new(graph));
    }

    match args.command {
        Command::AddressToName { address } => {
            let name = service.address_to_name(&address).await?.found();
            print_json(&serde_json::json!({ "address": address, "name": name }))
        }
        Command::NameToAddress { name } => {
            let address = service.name_to_address(&name).await?.found();
            print_json(&serde_json::json!({ "name": name, "address": address }))
        }
        Command::Resolve { name } => {
            let address = service.resolve_and_cache(&name).await?.found();
            print_json(&serde_json::json!({ "name": name, "address": address }))
        }
        Command::EnsureDirectory { name } => {
            print_json(&service.ensure_directory_record(&name).await?)
        }
        Command::Friends { address, kind } => {
            print_json(&service.resolve_and_cache_friends_of(&address, kind).await?)
        }
        Command::View { address } => print_json(&service.relationship_view(&address).await?),
        Command::Counts { address } => print_json(&service.relationship_counts(&address).await?),
        Command::AreFriends { a, b } => {
            let friends = service.are_friends(&a, &b).await?;
            print_json(&serde_json::json!({ "a": a, "b": b, "areFriends": friends }))
        }
        Command::List => print_json(&service.list_mappings().await?),
        Command::PurgeAddress { address } => {
            let deleted = service.purge_address(&address).await?;
            print_json(&serde_json::json!({ "address": address, "deleted": deleted }))
        }
        Command::PurgeName { name } => {
            let deleted = service.purge_name(&name).await?;
            print_json(&serde_json::json!({ "name": name, "deleted": deleted }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
