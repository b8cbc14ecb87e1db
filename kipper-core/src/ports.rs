//! Traits describing provider capabilities and shared helper types.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{Coordinate, ProviderMeta, RouteArtifact, RouteStop, VehicleId};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to provider backends.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Writing a map artifact failed.
    #[error("Artifact error: {0}")]
    Artifact(#[from] std::io::Error),
    /// Provider response did not match the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// The provider could not build a route for the requested stops.
    #[error("No route for {0}")]
    NoRoute(VehicleId),
    /// The provider has no registered plugin.
    #[error("Unsupported provider")]
    UnsupportedProvider,
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
/// Trait for provider-specific coordinate resolution backends.
pub trait GeocodePort: Send + Sync {
    /// Metadata describing the provider behind this port.
    fn provider(&self) -> &ProviderMeta;

    /// Resolve a district name to a coordinate.
    ///
    /// `Ok(None)` means the provider knows no such place; callers exclude
    /// the district from clustering and warn.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the provider request fails.
    async fn resolve(&self, district: &str) -> Result<Option<Coordinate>, PortError>;
}

#[async_trait]
/// Trait for provider-specific route rendering backends.
pub trait RoutePort: Send + Sync {
    /// Metadata describing the provider behind this port.
    fn provider(&self) -> &ProviderMeta;

    /// Turn one vehicle's ordered stops into a routable path and a map
    /// artifact, returning a reference to the artifact.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the provider request fails or no route
    /// exists for the stops.
    async fn render(
        &self,
        vehicle: &VehicleId,
        stops: &[RouteStop],
    ) -> Result<RouteArtifact, PortError>;
}
