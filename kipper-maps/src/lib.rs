//! Map artifact support shared by Kipper's routing providers.

/// Self-contained Leaflet HTML map artifacts, one file per vehicle.
pub mod leaflet;
/// Decoder for the Google encoded polyline format.
pub mod polyline;

pub use leaflet::*;
pub use polyline::*;
