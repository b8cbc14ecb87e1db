//! Self-contained Leaflet HTML map artifacts, one file per vehicle.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use kipper_core::model::{Coordinate, RouteStop};

/// Everything that goes onto one vehicle's map.
#[derive(Debug, Clone)]
pub struct VehicleMap<'route> {
    /// Vehicle identifier; also determines the artifact file name.
    pub vehicle: &'route str,
    /// Decoded route path drawn as a polyline.
    pub path: &'route [Coordinate],
    /// Checkpoints marked with the district name as tooltip.
    pub stops: &'route [RouteStop],
    /// Start of the route (green marker).
    pub start: Coordinate,
    /// End of the route (red marker).
    pub end: Coordinate,
}

/// Render the map into `dir` and return the path of the written file.
///
/// The artifact is a standalone HTML page pulling Leaflet from its CDN; it
/// carries no state beyond what is embedded, so it can be served as a
/// static file.
///
/// # Errors
///
/// Returns an [`io::Error`] when the directory cannot be created or the
/// file cannot be written.
pub fn write_map(dir: &Path, map: &VehicleMap<'_>) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let file_name = format!("{}_map.html", map.vehicle.replace(' ', "_"));
    let target = dir.join(file_name);
    fs::write(&target, render_html(map))?;
    Ok(target)
}

fn render_html(map: &VehicleMap<'_>) -> String {
    let path_js = map
        .path
        .iter()
        .map(|point| format!("[{:.5},{:.5}]", point.lat, point.lng))
        .collect::<Vec<_>>()
        .join(",");

    let mut markers: Vec<String> = Vec::with_capacity(map.stops.len() + 2);
    markers.push(marker_js(map.start, "Start", Some("green")));
    for stop in map.stops {
        markers.push(marker_js(stop.coordinate, stop.district.as_str(), None));
    }
    markers.push(marker_js(map.end, "End", Some("red")));
    let markers_js = markers.join("\n");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map('map').setView([{center_lat:.5}, {center_lng:.5}], 13);
L.tileLayer('https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
    attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);
var route = L.polyline([{path_js}], {{color: 'blue', weight: 2.5, opacity: 1}}).addTo(map);
{markers_js}
if (route.getLatLngs().length > 0) {{ map.fitBounds(route.getBounds()); }}
</script>
</body>
</html>
"#,
        title = escape_html(map.vehicle),
        center_lat = map.start.lat,
        center_lng = map.start.lng,
    )
}

fn marker_js(at: Coordinate, tooltip: &str, colour: Option<&str>) -> String {
    let base = format!(
        "L.marker([{:.5},{:.5}]).addTo(map).bindTooltip('{}');",
        at.lat,
        at.lng,
        escape_js(tooltip)
    );
    match colour {
        // Leaflet's default icon has no colour option; tag the tooltip so
        // start and end stay distinguishable without custom icon assets.
        Some(colour) => base.replace("bindTooltip('", &format!("bindTooltip('[{colour}] ")),
        None => base,
    }
}

fn escape_js(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
