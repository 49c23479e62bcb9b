//! Waymark - Location-claim progression service for scavenger hunts

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waymark::{
    config::Args,
    db::{HuntStore, MemoryHuntStore, MongoHuntStore},
    server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("waymark={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Waymark - Hunt Progression Service");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("Claim policy: {}", args.claim_policy);
    info!("Admission radius: {} km", args.admission_radius_km);
    info!("MongoDB: {}", args.mongodb_uri);
    info!("======================================");

    // Connect the hunt store (MongoDB; in-memory fallback in dev mode)
    let (store, mongo_backed): (Arc<dyn HuntStore>, bool) =
        match MongoHuntStore::connect(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(store) => {
                info!("MongoDB connected successfully");
                (Arc::new(store), true)
            }
            Err(e) => {
                if args.dev_mode {
                    warn!(
                        "MongoDB connection failed (dev mode, using in-memory store): {}",
                        e
                    );
                    (Arc::new(MemoryHuntStore::new()), false)
                } else {
                    error!("MongoDB connection failed: {}", e);
                    std::process::exit(1);
                }
            }
        };

    let state = Arc::new(server::AppState::new(args, store, mongo_backed));

    server::run(state).await?;

    Ok(())
}
