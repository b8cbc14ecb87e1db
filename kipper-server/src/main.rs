//! HTTP server that allocates waste-collection vehicles to district clusters.

mod data;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use reqwest::Client;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kipper_core::{
    cache::InMemoryCoordinateCache,
    model::{ClusterLimits, ProviderId},
    plugin::PluginRegistry,
    service::AllocationService,
};
use kipper_provider_google::GoogleConfig;
use kipper_provider_osm::OsmConfig;

use crate::routes::AppState;

/// Command-line configuration.
#[derive(Debug, Parser)]
#[command(name = "kipper-server", about = "Waste-collection vehicle allocation service")]
struct Args {
    /// Address to bind the HTTP listener to.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// JSON file holding the ordered district registry.
    #[arg(long, default_value = "data/districts.json")]
    districts_file: PathBuf,

    /// CSV file holding the bin weighing records.
    #[arg(long, default_value = "data/bin_data.csv")]
    weights_file: PathBuf,

    /// Directory rendered vehicle maps are written to.
    #[arg(long, default_value = "static/vehicle_maps")]
    maps_dir: PathBuf,

    /// Provider used for geocoding and route rendering.
    #[arg(long, default_value = "osm")]
    provider: String,

    /// Google Maps API key; registering the google provider needs one.
    #[arg(long, env = "GOOGLE_MAPS_API_KEY")]
    google_api_key: Option<String>,

    /// Depot address routes start from (google provider).
    #[arg(
        long,
        default_value = "No.35, Third Floor, Apoorva Louis Apartment, Reddiarpalayam, Puducherry, 605010"
    )]
    route_origin: String,

    /// Dump-yard address routes end at (google provider).
    #[arg(
        long,
        default_value = "WQM6+XWX Kurumbapet Dumpyard, VIP's Residential Area, Marie Oulgaret, Puducherry, 605111"
    )]
    route_destination: String,

    /// Maximum chained distance between clustered districts, in kilometres.
    #[arg(long, default_value_t = 5.0)]
    max_distance_km: f64,

    /// Maximum districts per cluster.
    #[arg(long, default_value_t = 2)]
    max_stops: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // HTTP + service setup; Nominatim asks for an identifying User-Agent.
    let client = Client::builder().user_agent("kipper/0.1").build()?;

    let mut plugins = vec![kipper_provider_osm::plugin(
        client.clone(),
        OsmConfig::new(args.maps_dir.clone()),
    )];
    if let Some(api_key) = args.google_api_key.clone() {
        plugins.push(kipper_provider_google::plugin(
            client.clone(),
            GoogleConfig::new(
                api_key,
                args.route_origin.clone(),
                args.route_destination.clone(),
                args.maps_dir.clone(),
            ),
        ));
    }

    let registry = Arc::new(PluginRegistry::new(plugins));
    for meta in registry.providers() {
        tracing::info!(provider = %meta.id, name = %meta.name, "provider registered");
    }

    let service = AllocationService::new(registry, Arc::new(InMemoryCoordinateCache::new()));

    let state = Arc::new(AppState {
        service,
        districts_file: args.districts_file,
        weights_file: args.weights_file,
        provider: ProviderId(args.provider),
        limits: ClusterLimits {
            max_distance_km: args.max_distance_km,
            max_stops: args.max_stops,
        },
    });

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!(bind = %args.bind, "kipper server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
