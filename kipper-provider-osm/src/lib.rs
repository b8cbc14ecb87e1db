//! Provider implementation backed by Nominatim geocoding and OSRM routing.
//!
//! Works without an API key, which makes it the default provider. Nominatim
//! asks clients to send a descriptive User-Agent; the shared HTTP client is
//! built with one.

use std::fmt::Write as _;
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

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const OSRM_URL: &str = "https://router.project-osrm.org";

/// Settings for the OpenStreetMap provider.
#[derive(Debug, Clone)]
pub struct OsmConfig {
    /// Directory map artifacts are written to.
    pub maps_dir: PathBuf,
    /// Nominatim base URL; overridable so tests can point at a local server.
    pub nominatim_url: String,
    /// OSRM base URL; overridable so tests can point at a local server.
    pub osrm_url: String,
}

impl OsmConfig {
    /// Config against the public Nominatim and OSRM instances.
    #[must_use]
    pub fn new(maps_dir: PathBuf) -> Self {
        Self {
            maps_dir,
            nominatim_url: NOMINATIM_URL.to_owned(),
            osrm_url: OSRM_URL.to_owned(),
        }
    }
}

/// Single hit from Nominatim /search; lat/lon arrive as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// Response from OSRM /route/v1/driving
#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Encoded polyline (`geometries=polyline`, 1e-5 precision).
    geometry: String,
}

/// Coordinate resolution via Nominatim.
pub struct NominatimGeocodePort {
    client: Client,
    config: OsmConfig,
    meta: ProviderMeta,
}

impl NominatimGeocodePort {
    /// Create a new geocode port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, config: OsmConfig) -> Self {
        Self {
            client,
            config,
            meta: provider_meta(),
        }
    }
}

#[async_trait]
impl GeocodePort for NominatimGeocodePort {
    fn provider(&self) -> &ProviderMeta {
        &self.meta
    }

    async fn resolve(&self, district: &str) -> Result<Option<Coordinate>, PortError> {
        let req = self
            .client
            .get(format!("{}/search", self.config.nominatim_url))
            .query(&[("q", district), ("format", "json"), ("limit", "1")]);

        let hits = fetch_json::<Vec<SearchHit>>(req).await?;

        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };

        let lat = hit
            .lat
            .parse::<f64>()
            .map_err(|_err| PortError::MalformedResponse(format!("bad latitude: {}", hit.lat)))?;
        let lng = hit
            .lon
            .parse::<f64>()
            .map_err(|_err| PortError::MalformedResponse(format!("bad longitude: {}", hit.lon)))?;

        Ok(Some(Coordinate::new(lat, lng)))
    }
}

/// Route rendering via OSRM plus a local Leaflet artifact.
pub struct OsrmRoutePort {
    client: Client,
    config: OsmConfig,
    meta: ProviderMeta,
}

impl OsrmRoutePort {
    /// Create a new route port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, config: OsmConfig) -> Self {
        Self {
            client,
            config,
            meta: provider_meta(),
        }
    }
}

#[async_trait]
impl RoutePort for OsrmRoutePort {
    fn provider(&self) -> &ProviderMeta {
        &self.meta
    }

    async fn render(
        &self,
        vehicle: &VehicleId,
        stops: &[RouteStop],
    ) -> Result<RouteArtifact, PortError> {
        let Some(first) = stops.first() else {
            return Err(PortError::NoRoute(vehicle.clone()));
        };

        // OSRM wants at least two waypoints; a single-stop route goes out
        // and back to the same district.
        let mut waypoints = String::new();
        for stop in stops {
            let _unused = write!(
                waypoints,
                "{:.6},{:.6};",
                stop.coordinate.lng, stop.coordinate.lat
            );
        }
        if stops.len() == 1 {
            let _unused = write!(
                waypoints,
                "{:.6},{:.6};",
                first.coordinate.lng, first.coordinate.lat
            );
        }
        waypoints.pop();

        let req = self
            .client
            .get(format!(
                "{}/route/v1/driving/{waypoints}",
                self.config.osrm_url
            ))
            .query(&[("overview", "full"), ("geometries", "polyline")]);

        let response = fetch_json::<RouteResponse>(req).await?;
        if response.code != "Ok" {
            return Err(PortError::MalformedResponse(format!(
                "OSRM code {}",
                response.code
            )));
        }
        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| PortError::NoRoute(vehicle.clone()))?;

        let path = polyline::decode(&route.geometry)
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

/// Build the plugin bundle for the OpenStreetMap provider.
#[must_use]
pub fn plugin(client: Client, config: OsmConfig) -> ProviderPlugin {
    let geocode_port = Arc::new(NominatimGeocodePort::new(client.clone(), config.clone()));
    let route_port = Arc::new(OsrmRoutePort::new(client, config));

    ProviderPlugin {
        meta: provider_meta(),
        geocode_port,
        route_port,
    }
}

fn provider_meta() -> ProviderMeta {
    ProviderMeta {
        id: ProviderId(String::from("osm")),
        name: String::from("OpenStreetMap"),
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
