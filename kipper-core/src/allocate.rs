//! Positional assignment of vehicles to route clusters.

use serde::{Deserialize, Serialize};

use crate::model::{Cluster, VehicleId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A cluster paired with the vehicle that will serve it.
pub struct VehicleAssignment {
    /// Assigned vehicle.
    pub vehicle: VehicleId,
    /// The cluster it serves, district order preserved.
    pub cluster: Cluster,
}

/// Assign vehicle identifiers to clusters in creation order.
///
/// Allocation is purely positional: `Vehicle 1` takes the first cluster,
/// `Vehicle 2` the second, and so on. Cluster size and weight play no role.
#[must_use]
pub fn allocate_vehicles(clusters: Vec<Cluster>) -> Vec<VehicleAssignment> {
    clusters
        .into_iter()
        .enumerate()
        .map(|(position, cluster)| VehicleAssignment {
            vehicle: VehicleId::numbered(position + 1),
            cluster,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DistrictName;

    fn cluster(members: &[&str]) -> Cluster {
        Cluster {
            stops: members.iter().copied().map(DistrictName::from).collect(),
        }
    }

    #[test]
    fn vehicles_are_numbered_in_cluster_order() {
        let clusters = vec![cluster(&["X", "Y"]), cluster(&["Z"]), cluster(&["W"])];

        let assignments = allocate_vehicles(clusters);

        let ids: Vec<&str> = assignments
            .iter()
            .map(|assignment| assignment.vehicle.0.as_str())
            .collect();
        assert_eq!(ids, vec!["Vehicle 1", "Vehicle 2", "Vehicle 3"]);
        assert_eq!(
            assignments[0].cluster.stops,
            vec![DistrictName::from("X"), DistrictName::from("Y")]
        );
    }

    #[test]
    fn no_clusters_means_no_vehicles() {
        assert!(allocate_vehicles(Vec::new()).is_empty());
    }
}
