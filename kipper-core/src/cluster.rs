//! Proximity-bounded grouping of districts into route clusters.

use std::collections::HashSet;

use tracing::warn;

use crate::distance::distance_km;
use crate::model::{Cluster, ClusterLimits, Coordinate, CoordinateTable, DistrictName};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of one clustering run.
pub struct Clustering {
    /// Clusters in creation order.
    pub clusters: Vec<Cluster>,
    /// Districts excluded because the coordinate table has no entry for them.
    pub unresolved: Vec<DistrictName>,
}

/// Group districts into bounded clusters via depth-first proximity expansion.
///
/// Districts are visited in input order. Each unvisited district seeds a new
/// cluster; a worklist stack then pulls in unvisited districts within
/// `max_distance_km` of the most recently added member until the cluster
/// holds `max_stops` districts or no eligible neighbour remains. Proximity
/// is chained through the expansion, so two members of the same cluster may
/// be further apart than `max_distance_km`.
///
/// Ties between eligible neighbours are broken by input iteration order of
/// the scan, not by distance. Districts without a coordinate are dropped
/// before traversal and reported in [`Clustering::unresolved`].
#[must_use]
pub fn build_clusters(
    districts: &[DistrictName],
    coordinates: &CoordinateTable,
    limits: ClusterLimits,
) -> Clustering {
    // Snapshot the candidates with their coordinates up front; the scan
    // below iterates this list while the stack grows.
    let mut unresolved = Vec::new();
    let mut candidates: Vec<(DistrictName, Coordinate)> = Vec::with_capacity(districts.len());
    for district in districts {
        if let Some(&coordinate) = coordinates.get(district) {
            candidates.push((district.clone(), coordinate));
        } else {
            warn!(district = %district, "district has no coordinate, excluded from clustering");
            unresolved.push(district.clone());
        }
    }

    let mut clusters = Vec::new();
    let mut visited: HashSet<DistrictName> = HashSet::new();

    for (seed, seed_coordinate) in &candidates {
        if visited.contains(seed) {
            continue;
        }

        let mut stack = vec![(seed.clone(), *seed_coordinate)];
        let mut stops: Vec<DistrictName> = Vec::new();

        while stops.len() < limits.max_stops {
            let Some((current, origin)) = stack.pop() else {
                break;
            };
            // The stack may hold duplicates; only the first pop counts.
            if visited.contains(&current) {
                continue;
            }
            visited.insert(current.clone());
            stops.push(current);

            for (neighbour, location) in &candidates {
                if stops.len() >= limits.max_stops || visited.contains(neighbour) {
                    continue;
                }
                if distance_km(origin, *location) <= limits.max_distance_km {
                    stack.push((neighbour.clone(), *location));
                }
            }
        }

        if !stops.is_empty() {
            clusters.push(Cluster { stops });
        }
    }

    Clustering {
        clusters,
        unresolved,
    }
}
