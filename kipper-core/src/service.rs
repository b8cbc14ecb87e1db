//! High-level allocation service combining cache, engine, and providers.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use tracing::{debug, info, warn};

use crate::allocate::{VehicleAssignment, allocate_vehicles};
use crate::cache::CoordinateCache;
use crate::cluster::build_clusters;
use crate::model::{
    ClusterLimits, CoordinateTable, DistrictName, ProviderId, RouteArtifact, RouteStop, VehicleId,
    WeightRecord,
};
use crate::plugin::{PluginRegistry, ProviderPlugin};
use crate::ports::PortError;
use crate::weights::{WeightError, aggregate_weights};

/// How many render calls may be in flight at once for a single request.
const RENDER_CONCURRENCY: usize = 4;

#[derive(thiserror::Error, Debug)]
/// Failure that dooms a whole allocation request.
pub enum AllocationError {
    /// Weight aggregation hit a malformed record.
    #[error(transparent)]
    Weights(#[from] WeightError),
    /// Provider lookup failed.
    #[error(transparent)]
    Port(#[from] PortError),
}

#[derive(Debug, Clone)]
/// Parameters of one allocation run.
pub struct AllocationRequest {
    /// Provider used for geocoding and route rendering.
    pub provider: ProviderId,
    /// Date the allocation covers, in the timestamp field's prefix format.
    pub selected_date: String,
    /// Bounds for cluster growth.
    pub limits: ClusterLimits,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome of rendering one vehicle's route map.
pub enum RenderOutcome {
    /// The provider produced a map artifact.
    Rendered(RouteArtifact),
    /// Rendering failed; the rest of the allocation is unaffected.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One vehicle's slice of the allocation result.
pub struct VehicleRoute {
    /// Assigned vehicle.
    pub vehicle: VehicleId,
    /// Districts the vehicle serves, in route order.
    pub districts: Vec<DistrictName>,
    /// Result of the map render for this vehicle.
    pub outcome: RenderOutcome,
}

#[derive(Debug, Clone, PartialEq)]
/// Full result of an allocation run.
pub struct AllocationReport {
    /// Vehicle routes in vehicle-identifier order.
    pub vehicles: Vec<VehicleRoute>,
    /// Summed weight per district for the selected date; informational,
    /// never fed back into clustering.
    pub weights: BTreeMap<DistrictName, f64>,
    /// Districts that could not be resolved to a coordinate.
    pub unresolved: Vec<DistrictName>,
}

/// Public entry point for running allocations.
pub struct AllocationService {
    registry: Arc<PluginRegistry>,
    cache: Arc<dyn CoordinateCache>,
}

impl AllocationService {
    /// Create a new service bound to the provided registry and cache.
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>, cache: Arc<dyn CoordinateCache>) -> Self {
        Self { registry, cache }
    }

    /// Run one allocation: resolve coordinates, aggregate weights, build
    /// clusters, assign vehicles, and render one map per vehicle.
    ///
    /// A district that fails to geocode is excluded and reported in
    /// [`AllocationReport::unresolved`]; a failed render becomes a
    /// [`RenderOutcome::Failed`] for that vehicle alone.
    ///
    /// # Errors
    ///
    /// Returns an [`AllocationError`] when the provider is unknown or a
    /// weight record is malformed for the selected date.
    pub async fn allocate(
        &self,
        request: &AllocationRequest,
        districts: &[DistrictName],
        records: &[WeightRecord],
    ) -> Result<AllocationReport, AllocationError> {
        let plugin = self.registry.plugin(&request.provider)?;

        let coordinates = self.resolve_coordinates(plugin, districts).await;

        let weights = aggregate_weights(records, districts, &request.selected_date)?;
        let collected: f64 = weights.values().sum();
        debug!(date = %request.selected_date, total_kg = collected, "weights aggregated");

        let clustering = build_clusters(districts, &coordinates, request.limits);
        let assignments = allocate_vehicles(clustering.clusters);

        // Renders are independent per vehicle; issue them with bounded
        // parallelism and join in vehicle-identifier order.
        let vehicles = stream::iter(assignments)
            .map(|assignment| self.render(plugin, assignment, &coordinates))
            .buffered(RENDER_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;

        info!(
            date = %request.selected_date,
            vehicles = vehicles.len(),
            unresolved = clustering.unresolved.len(),
            "allocation complete"
        );

        Ok(AllocationReport {
            vehicles,
            weights,
            unresolved: clustering.unresolved,
        })
    }

    /// Resolve each district through the cache or the provider, in input
    /// order. Failures are contained: the district is simply left out of
    /// the table.
    async fn resolve_coordinates(
        &self,
        plugin: &ProviderPlugin,
        districts: &[DistrictName],
    ) -> CoordinateTable {
        let mut coordinates = CoordinateTable::new();

        for district in districts {
            if let Some(cached) = self.cache.get(district) {
                coordinates.insert(district.clone(), cached);
                continue;
            }
            match plugin.geocode_port.resolve(district.as_str()).await {
                Ok(Some(coordinate)) => {
                    self.cache.put(district.clone(), coordinate);
                    coordinates.insert(district.clone(), coordinate);
                }
                Ok(None) => {
                    warn!(district = %district, "geocoder found no coordinate");
                }
                Err(err) => {
                    warn!(district = %district, error = %err, "geocoding failed");
                }
            }
        }

        coordinates
    }

    async fn render(
        &self,
        plugin: &ProviderPlugin,
        assignment: VehicleAssignment,
        coordinates: &CoordinateTable,
    ) -> VehicleRoute {
        let stops: Vec<RouteStop> = assignment
            .cluster
            .stops
            .iter()
            .filter_map(|district| {
                coordinates.get(district).map(|&coordinate| RouteStop {
                    district: district.clone(),
                    coordinate,
                })
            })
            .collect();

        let outcome = match plugin.route_port.render(&assignment.vehicle, &stops).await {
            Ok(artifact) => RenderOutcome::Rendered(artifact),
            Err(err) => {
                warn!(vehicle = %assignment.vehicle, error = %err, "route rendering failed");
                RenderOutcome::Failed(err.to_string())
            }
        };

        VehicleRoute {
            vehicle: assignment.vehicle,
            districts: assignment.cluster.stops,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::cache::InMemoryCoordinateCache;
    use crate::model::{Coordinate, ProviderMeta};
    use crate::ports::{GeocodePort, RoutePort};

    const LAT_KM: f64 = 1.0 / 110.574;
    const LNG_KM: f64 = 1.0 / 111.320;

    fn stub_meta() -> ProviderMeta {
        ProviderMeta {
            id: ProviderId("stub".to_owned()),
            name: "Stub provider".to_owned(),
        }
    }

    struct StubGeocodePort {
        meta: ProviderMeta,
        coordinates: HashMap<String, Coordinate>,
        calls: AtomicUsize,
    }

    impl StubGeocodePort {
        fn new(entries: &[(&str, Coordinate)]) -> Self {
            Self {
                meta: stub_meta(),
                coordinates: entries
                    .iter()
                    .map(|(name, coordinate)| ((*name).to_owned(), *coordinate))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GeocodePort for StubGeocodePort {
        fn provider(&self) -> &ProviderMeta {
            &self.meta
        }

        async fn resolve(&self, district: &str) -> Result<Option<Coordinate>, PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.coordinates.get(district).copied())
        }
    }

    struct StubRoutePort {
        meta: ProviderMeta,
        fail_for: Option<VehicleId>,
    }

    impl StubRoutePort {
        fn new(fail_for: Option<VehicleId>) -> Self {
            Self {
                meta: stub_meta(),
                fail_for,
            }
        }
    }

    #[async_trait]
    impl RoutePort for StubRoutePort {
        fn provider(&self) -> &ProviderMeta {
            &self.meta
        }

        async fn render(
            &self,
            vehicle: &VehicleId,
            stops: &[RouteStop],
        ) -> Result<RouteArtifact, PortError> {
            if self.fail_for.as_ref() == Some(vehicle) {
                return Err(PortError::Internal("stub render failure".to_owned()));
            }
            Ok(RouteArtifact(format!(
                "maps/{}_{}.html",
                vehicle.0.replace(' ', "_"),
                stops.len()
            )))
        }
    }

    fn service_with(
        geocode: Arc<StubGeocodePort>,
        route: Arc<StubRoutePort>,
    ) -> AllocationService {
        let plugin = ProviderPlugin {
            meta: stub_meta(),
            geocode_port: geocode,
            route_port: route,
        };
        AllocationService::new(
            Arc::new(PluginRegistry::new(vec![plugin])),
            Arc::new(InMemoryCoordinateCache::new()),
        )
    }

    fn request() -> AllocationRequest {
        AllocationRequest {
            provider: ProviderId("stub".to_owned()),
            selected_date: "2024-01-01".to_owned(),
            limits: ClusterLimits::default(),
        }
    }

    fn triangle() -> Vec<(&'static str, Coordinate)> {
        vec![
            ("X", Coordinate::new(0.0, 0.0)),
            ("Y", Coordinate::new(0.0, 3.0 * LNG_KM)),
            ("Z", Coordinate::new(9.887 * LAT_KM, 1.5 * LNG_KM)),
        ]
    }

    fn names(raw: &[&str]) -> Vec<DistrictName> {
        raw.iter().copied().map(DistrictName::from).collect()
    }

    #[tokio::test]
    async fn allocates_vehicles_in_cluster_order_and_renders_each() {
        let geocode = Arc::new(StubGeocodePort::new(&triangle()));
        let route = Arc::new(StubRoutePort::new(None));
        let service = service_with(Arc::clone(&geocode), route);

        let report = service
            .allocate(&request(), &names(&["X", "Y", "Z"]), &[])
            .await
            .expect("allocation");

        let ids: Vec<&str> = report
            .vehicles
            .iter()
            .map(|vehicle| vehicle.vehicle.0.as_str())
            .collect();
        assert_eq!(ids, vec!["Vehicle 1", "Vehicle 2"]);
        assert_eq!(report.vehicles[0].districts, names(&["X", "Y"]));
        assert_eq!(report.vehicles[1].districts, names(&["Z"]));
        assert_eq!(
            report.vehicles[0].outcome,
            RenderOutcome::Rendered(RouteArtifact("maps/Vehicle_1_2.html".to_owned()))
        );
        assert!(report.unresolved.is_empty());
    }

    #[tokio::test]
    async fn unresolved_district_is_reported_and_the_rest_completes() {
        let geocode = Arc::new(StubGeocodePort::new(&triangle()));
        let route = Arc::new(StubRoutePort::new(None));
        let service = service_with(geocode, route);

        let report = service
            .allocate(&request(), &names(&["X", "Nowhere", "Z"]), &[])
            .await
            .expect("allocation");

        assert_eq!(report.unresolved, names(&["Nowhere"]));
        let assigned: Vec<&DistrictName> = report
            .vehicles
            .iter()
            .flat_map(|vehicle| vehicle.districts.iter())
            .collect();
        assert_eq!(assigned.len(), 2);
        assert!(!assigned.contains(&&DistrictName::from("Nowhere")));
    }

    #[tokio::test]
    async fn failed_render_is_contained_to_its_vehicle() {
        let geocode = Arc::new(StubGeocodePort::new(&triangle()));
        let route = Arc::new(StubRoutePort::new(Some(VehicleId::numbered(2))));
        let service = service_with(geocode, route);

        let report = service
            .allocate(&request(), &names(&["X", "Y", "Z"]), &[])
            .await
            .expect("allocation");

        assert!(matches!(
            report.vehicles[0].outcome,
            RenderOutcome::Rendered(_)
        ));
        assert!(matches!(
            report.vehicles[1].outcome,
            RenderOutcome::Failed(_)
        ));
    }

    #[tokio::test]
    async fn second_run_hits_the_cache_instead_of_the_geocoder() {
        let geocode = Arc::new(StubGeocodePort::new(&triangle()));
        let route = Arc::new(StubRoutePort::new(None));
        let service = service_with(Arc::clone(&geocode), route);
        let districts = names(&["X", "Y", "Z"]);

        service
            .allocate(&request(), &districts, &[])
            .await
            .expect("first run");
        service
            .allocate(&request(), &districts, &[])
            .await
            .expect("second run");

        assert_eq!(geocode.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn malformed_weight_record_fails_the_request() {
        let geocode = Arc::new(StubGeocodePort::new(&triangle()));
        let route = Arc::new(StubRoutePort::new(None));
        let service = service_with(geocode, route);
        let records = vec![WeightRecord {
            district: DistrictName::from("X"),
            timestamp: "2024-01-01T08:00".to_owned(),
            weight_kg: None,
        }];

        let result = service
            .allocate(&request(), &names(&["X"]), &records)
            .await;

        assert!(matches!(result, Err(AllocationError::Weights(_))));
    }

    #[tokio::test]
    async fn unknown_provider_rejects_the_request() {
        let geocode = Arc::new(StubGeocodePort::new(&[]));
        let route = Arc::new(StubRoutePort::new(None));
        let service = service_with(geocode, route);
        let bad_request = AllocationRequest {
            provider: ProviderId("elsewhere".to_owned()),
            ..request()
        };

        let result = service.allocate(&bad_request, &[], &[]).await;

        assert!(matches!(
            result,
            Err(AllocationError::Port(PortError::UnsupportedProvider))
        ));
    }

    #[tokio::test]
    async fn weights_flow_through_to_the_report() {
        let geocode = Arc::new(StubGeocodePort::new(&triangle()));
        let route = Arc::new(StubRoutePort::new(None));
        let service = service_with(geocode, route);
        let records = vec![
            WeightRecord {
                district: DistrictName::from("X"),
                timestamp: "2024-01-01T10:00".to_owned(),
                weight_kg: Some(3.0),
            },
            WeightRecord {
                district: DistrictName::from("X"),
                timestamp: "2024-01-01T15:00".to_owned(),
                weight_kg: Some(2.0),
            },
        ];

        let report = service
            .allocate(&request(), &names(&["X", "Y"]), &records)
            .await
            .expect("allocation");

        assert!((report.weights[&DistrictName::from("X")] - 5.0).abs() < f64::EPSILON);
        assert!(report.weights[&DistrictName::from("Y")].abs() < f64::EPSILON);
    }
}
