//! Core types and engine for the Kipper waste-collection vehicle allocator.

/// Positional assignment of vehicles to route clusters.
pub mod allocate;
/// Injectable coordinate cache shared across allocation requests.
pub mod cache;
/// Proximity-bounded grouping of districts into route clusters.
pub mod cluster;
/// Great-circle distance between district coordinates.
pub mod distance;
/// Domain models and identifiers shared by all providers.
pub mod model;
/// Registry and helpers for plugging routing providers into the service.
pub mod plugin;
/// Traits describing the provider interfaces.
pub mod ports;
/// High-level service facade used by clients.
pub mod service;
/// Weight aggregation for bin records on a selected date.
pub mod weights;

pub use allocate::*;
pub use cache::*;
pub use cluster::*;
pub use distance::*;
pub use model::*;
pub use plugin::*;
pub use ports::*;
pub use service::*;
pub use weights::*;
