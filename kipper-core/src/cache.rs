//! Injectable coordinate cache shared across allocation requests.

use dashmap::DashMap;

use crate::model::{Coordinate, DistrictName};

/// Cache of resolved district coordinates.
///
/// Geocoding dominates request latency, so resolved coordinates are kept
/// across requests. Implementations must tolerate concurrent population;
/// last writer wins on a racing insert.
pub trait CoordinateCache: Send + Sync {
    /// Look up a previously resolved coordinate.
    fn get(&self, district: &DistrictName) -> Option<Coordinate>;

    /// Record a resolved coordinate.
    fn put(&self, district: DistrictName, coordinate: Coordinate);
}

/// Unbounded in-memory cache backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryCoordinateCache {
    entries: DashMap<DistrictName, Coordinate>,
}

impl InMemoryCoordinateCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached districts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CoordinateCache for InMemoryCoordinateCache {
    fn get(&self, district: &DistrictName) -> Option<Coordinate> {
        self.entries.get(district).map(|entry| *entry.value())
    }

    fn put(&self, district: DistrictName, coordinate: Coordinate) {
        self.entries.insert(district, coordinate);
    }
}
