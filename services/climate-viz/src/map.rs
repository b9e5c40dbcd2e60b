//! Static Leaflet page for browsing the overlays by band and year.
//!
//! Nothing is rendered here. The page holds the map settings and, when the
//! user picks a band and year, requests
//! `<base_url>/<Location>_<Band>_<Year>.png` and
//! `<base_url>/colorbar_<Band>.png` and pins them at the configured bounds.

use raster_common::{Band, RasterError, RasterResult, YearSpan};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing::info;

use crate::config::MapConfig;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

#[derive(Serialize)]
struct BandOption<'a> {
    value: &'a str,
    label: String,
}

/// Escape text for HTML element content and attribute values.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build the map page.
pub fn render_map(map: &MapConfig, location: &str, bands: &[&Band], years: YearSpan) -> RasterResult<String> {
    let options: Vec<BandOption> = bands
        .iter()
        .map(|b| BandOption {
            value: &b.display_name,
            label: map
                .band_labels
                .get(&b.display_name)
                .cloned()
                .unwrap_or_else(|| b.display_name.replace('_', " ")),
        })
        .collect();

    let settings = json!({
        "center": map.center,
        "zoom": map.zoom,
        "regionCenter": map.region_center,
        "regionZoom": map.region_zoom,
        "baseUrl": map.base_url.trim_end_matches('/'),
        "prefix": location,
        "overlayBounds": map.overlay_bounds,
        "overlayOpacity": map.overlay_opacity,
        "colorbarBounds": map.colorbar_bounds,
        "markers": map.markers,
    });
    // Keep "</script>" out of the inline script
    let settings = serde_json::to_string(&settings)?.replace("</", "<\\/");

    let initial_year = map.initial_year.clamp(years.first, years.last);
    let select: String = options
        .iter()
        .map(|o| {
            format!(
                "        <option value=\"{}\">{}</option>\n",
                escape_html(o.value),
                escape_html(&o.label)
            )
        })
        .collect();
    let region = escape_html(location);

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{region} climate overlays</title>
<link rel="stylesheet" href="{LEAFLET_CSS}">
<script src="{LEAFLET_JS}"></script>
<style>
    html, body, #map {{ height: 100%; margin: 0; }}
    .zoom-button {{
        background-color: #b6c1ff; border: none; color: white; padding: 10px 24px;
        font-size: 16px; margin: 4px 2px; cursor: pointer; border-radius: 8px;
    }}
    .zoom-button:hover {{ background-color: white; color: black; }}
    .popup-content {{ font-family: Arial, sans-serif; font-size: 14px; color: #333; padding: 10px; }}
    .popup-content label {{ font-weight: bold; margin-bottom: 5px; display: block; }}
    .popup-content select, .popup-content input {{ width: 100%; margin-bottom: 10px; }}
    .popup-content output {{ display: block; margin-top: 5px; font-weight: bold; }}
</style>
</head>
<body>
<div id="map"></div>
<template id="region-popup">
<div class="popup-content">
    <button class="zoom-button" onclick="zoomToRegion()">Zoom to {region}</button>
    <label for="bandSelect">Select Band:</label>
    <select id="bandSelect">
{select}    </select>
    <label for="yearSlider">Select Year:</label>
    <input type="range" id="yearSlider" min="{first}" max="{last}" value="{initial_year}" oninput="this.nextElementSibling.value = this.value">
    <output>{initial_year}</output>
</div>
</template>
<script>
    var settings = {settings};
    var map = L.map('map').setView(settings.center, settings.zoom);
    L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
        attribution: '&copy; OpenStreetMap contributors'
    }}).addTo(map);

    var popupHtml = document.getElementById('region-popup').innerHTML;
    L.marker(settings.regionCenter).bindPopup(popupHtml, {{ maxWidth: 300 }}).addTo(map);
    settings.markers.forEach(function (m) {{
        L.marker([m.lat, m.lon], {{ title: m.name }}).bindPopup(m.name).addTo(map);
    }});

    var overlayLayer;
    var colorbarLayer;

    function overlayUrl(band, year) {{
        return settings.baseUrl + '/' + settings.prefix + '_' + band + '_' + year + '.png';
    }}

    function colorbarUrl(band) {{
        return settings.baseUrl + '/colorbar_' + band + '.png';
    }}

    function zoomToRegion() {{
        map.setView(settings.regionCenter, settings.regionZoom);
        document.getElementById('bandSelect').addEventListener('change', updateMap);
        document.getElementById('yearSlider').addEventListener('input', updateMap);
    }}

    function updateMap() {{
        var band = document.getElementById('bandSelect').value;
        var year = document.getElementById('yearSlider').value;
        if (overlayLayer) {{ map.removeLayer(overlayLayer); }}
        overlayLayer = L.imageOverlay(overlayUrl(band, year), settings.overlayBounds,
            {{ opacity: settings.overlayOpacity }}).addTo(map);
        if (colorbarLayer) {{ map.removeLayer(colorbarLayer); }}
        colorbarLayer = L.imageOverlay(colorbarUrl(band), settings.colorbarBounds,
            {{ opacity: 1.0 }}).addTo(map);
    }}
</script>
</body>
</html>
"#,
        first = years.first,
        last = years.last,
    ))
}

/// Write the map page to `path`.
pub fn write_map(
    path: &Path,
    map: &MapConfig,
    location: &str,
    bands: &[&Band],
    years: YearSpan,
) -> RasterResult<()> {
    let html = render_map(map, location, bands, years)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RasterError::write(parent, e))?;
    }
    std::fs::write(path, html).map_err(|e| RasterError::write(path, e))?;
    info!(path = %path.display(), bands = bands.len(), "Saved map");
    Ok(())
}
