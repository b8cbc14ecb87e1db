//! Domain data structures for districts, clusters, and vehicle allocations.

use std::collections::HashMap;
use std::fmt;

use geo::{Point, point};
use serde::{Deserialize, Serialize};

/// Built-in providers shipped with the application.
pub enum Providers {
    /// Google Maps (Geocoding + Directions).
    Google,
    /// OpenStreetMap (Nominatim + OSRM).
    Osm,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a routing provider known to Kipper.
pub struct ProviderId(pub String);

impl fmt::Display for Providers {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            Providers::Google => "google",
            Providers::Osm => "osm",
        };
        write!(formatter, "{slug}")
    }
}

impl From<Providers> for ProviderId {
    fn from(provider: Providers) -> Self {
        ProviderId(provider.to_string())
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Metadata describing a provider and its human-friendly name.
pub struct ProviderMeta {
    /// Unique identifier.
    pub id: ProviderId,
    /// Localized display name.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Name of a collection district; the unique identifier used throughout.
pub struct DistrictName(pub String);

impl DistrictName {
    /// Borrow the raw name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DistrictName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<&str> for DistrictName {
    fn from(name: &str) -> Self {
        DistrictName(name.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// WGS84 latitude/longitude pair.
pub struct Coordinate {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

impl Coordinate {
    /// Construct a coordinate from decimal degrees.
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Convert to a `geo` point (x = longitude, y = latitude).
    #[must_use]
    pub fn point(self) -> Point<f64> {
        point! { x: self.lng, y: self.lat }
    }
}

/// Mapping from district name to resolved coordinate, built once per request.
pub type CoordinateTable = HashMap<DistrictName, Coordinate>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for an allocated vehicle, e.g. `Vehicle 3`.
pub struct VehicleId(pub String);

impl VehicleId {
    /// Identifier for the vehicle at the given 1-indexed position.
    #[must_use]
    pub fn numbered(position: usize) -> Self {
        Self(format!("Vehicle {position}"))
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Ordered group of districts intended to be served by one vehicle in one route.
pub struct Cluster {
    /// Districts in the order they were added during expansion.
    pub stops: Vec<DistrictName>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
/// Limits that bound cluster growth during depth-first expansion.
pub struct ClusterLimits {
    /// Maximum chained distance between a district and the one that pulled it in.
    pub max_distance_km: f64,
    /// Maximum number of districts per cluster.
    pub max_stops: usize,
}

impl Default for ClusterLimits {
    fn default() -> Self {
        Self {
            max_distance_km: 5.0,
            max_stops: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One weighing record from the bin data source.
pub struct WeightRecord {
    /// District the weighing belongs to.
    pub district: DistrictName,
    /// Raw timestamp string; date comparisons are prefix matches on this.
    pub timestamp: String,
    /// Recorded weight in kilograms; `None` when the source value was
    /// missing or unparseable.
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A stop handed to the route renderer: district plus resolved coordinate.
pub struct RouteStop {
    /// District acting as a waypoint.
    pub district: DistrictName,
    /// Its resolved coordinate.
    pub coordinate: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Reference to a rendered map artifact (file path or URL), passed through
/// to clients unmodified.
pub struct RouteArtifact(pub String);

impl fmt::Display for RouteArtifact {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
