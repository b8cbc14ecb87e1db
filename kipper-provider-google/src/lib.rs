//! Provider implementation backed by the Google Maps Geocoding and
//! Directions APIs.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use kipper_core::{
    model::{Coordinate, ProviderId, ProviderMeta, RouteArtifact, RouteStop, VehicleId},
    plugin::ProviderPlugin,
    ports::{GeocodePort, PortError, RoutePort},
};
use kipper_maps::{
    leaflet::{VehicleMap, write_map},
    polyline,
};

const BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Settings for the Google provider.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// API key used for both the Geocoding and Directions APIs.
    pub api_key: String,
    /// Depot address every route starts from.
    pub origin: String,
    /// Dump-yard address every route ends at.
    pub destination: String,
    /// Directory map artifacts are written to.
    pub maps_dir: PathBuf,
    /// API base URL; overridable so tests can point at a local server.
    pub base_url: String,
}

impl GoogleConfig {
    /// Config against the official API endpoints.
    #[must_use]
    pub fn new(api_key: String, origin: String, destination: String, maps_dir: PathBuf) -> Self {
        Self {
            api_key,
            origin,
            destination,
            maps_dir,
            base_url: BASE_URL.to_owned(),
        }
    }
}

/// Response from /geocode/json
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

/// Response from /directions/json
#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    overview_polyline: OverviewPolyline,
}

#[derive(Debug, Deserialize)]
struct OverviewPolyline {
    points: String,
}

/// Coordinate resolution via the Geocoding API.
pub struct GoogleGeocodePort {
    client: Client,
    config: GoogleConfig,
    meta: ProviderMeta,
}

impl GoogleGeocodePort {
    /// Create a new geocode port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, config: GoogleConfig) -> Self {
        Self {
            client,
            config,
            meta: provider_meta(),
        }
    }
}

#[async_trait]
impl GeocodePort for GoogleGeocodePort {
    fn provider(&self) -> &ProviderMeta {
        &self.meta
    }

    async fn resolve(&self, district: &str) -> Result<Option<Coordinate>, PortError> {
        let req = self
            .client
            .get(format!("{}/geocode/json", self.config.base_url))
            .query(&[("address", district), ("key", &self.config.api_key)]);

        let resp = fetch_json::<GeocodeResponse>(req).await?;

        // An unknown place comes back as an empty result list, not an error.
        Ok(resp
            .results
            .into_iter()
            .next()
            .map(|result| Coordinate::new(result.geometry.location.lat, result.geometry.location.lng)))
    }
}

/// Route rendering via the Directions API plus a local Leaflet artifact.
pub struct GoogleRoutePort {
    client: Client,
    config: GoogleConfig,
    meta: ProviderMeta,
}

impl GoogleRoutePort {
    /// Create a new route port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, config: GoogleConfig) -> Self {
        Self {
            client,
            config,
            meta: provider_meta(),
        }
    }
}

#[async_trait]
impl RoutePort for GoogleRoutePort {
    fn provider(&self) -> &ProviderMeta {
        &self.meta
    }

    async fn render(
        &self,
        vehicle: &VehicleId,
        stops: &[RouteStop],
    ) -> Result<RouteArtifact, PortError> {
        if stops.is_empty() {
            return Err(PortError::NoRoute(vehicle.clone()));
        }

        // Checkpoints travel as a pipe-separated waypoint list between the
        // fixed depot origin and dump-yard destination.
        let waypoints = stops
            .iter()
            .map(|stop| stop.district.as_str())
            .collect::<Vec<_>>()
            .join("|");

        let req = self
            .client
            .get(format!("{}/directions/json", self.config.base_url))
            .query(&[
                ("origin", self.config.origin.as_str()),
                ("destination", self.config.destination.as_str()),
                ("waypoints", waypoints.as_str()),
                ("key", self.config.api_key.as_str()),
            ]);

        let directions = fetch_json::<DirectionsResponse>(req).await?;
        let route = directions
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| PortError::NoRoute(vehicle.clone()))?;

        let path = polyline::decode(&route.overview_polyline.points)
            .map_err(|err| PortError::MalformedResponse(err.to_string()))?;
        let (Some(&start), Some(&end)) = (path.first(), path.last()) else {
            return Err(PortError::NoRoute(vehicle.clone()));
        };

        let map = VehicleMap {
            vehicle: &vehicle.0,
            path: &path,
            stops,
            start,
            end,
        };
        let artifact = write_map(&self.config.maps_dir, &map)?;

        Ok(RouteArtifact(artifact.display().to_string()))
    }
}

/// Build the plugin bundle for the Google provider.
#[must_use]
pub fn plugin(client: Client, config: GoogleConfig) -> ProviderPlugin {
    let geocode_port = Arc::new(GoogleGeocodePort::new(client.clone(), config.clone()));
    let route_port = Arc::new(GoogleRoutePort::new(client, config));

    ProviderPlugin {
        meta: provider_meta(),
        geocode_port,
        route_port,
    }
}

fn provider_meta() -> ProviderMeta {
    ProviderMeta {
        id: ProviderId(String::from("google")),
        name: String::from("Google Maps"),
    }
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    req.send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .json()
        .await
        .map_err(PortError::from)
}
