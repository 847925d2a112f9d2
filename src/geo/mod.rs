//! Static ABS boundary geometry loaded from GeoJSON.
//!
//! The file is read once at startup and keyed by the same region code the CSV
//! uses, compared through `code_key`. Only outer rings are kept.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{AppError, ErrorKind};

/// A closed ring of `(lon, lat)` points.
pub type Ring = Vec<(f64, f64)>;

#[derive(Debug, Clone, PartialEq)]
pub struct RegionShape {
    pub code: String,
    pub rings: Vec<Ring>,
}

#[derive(Debug, Clone, Default)]
pub struct GeoReference {
    regions: BTreeMap<String, RegionShape>,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: serde_json::Map<String, Value>,
    #[serde(default)]
    geometry: Value,
}

type PolygonCoords = Vec<Vec<[f64; 2]>>;

impl GeoReference {
    pub fn load(path: &Path, code_property: &str) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(ErrorKind::Geo, format!("Failed to open GeoJSON '{}': {e}", path.display()))
        })?;
        let geo = Self::from_geojson_str(&text, code_property)
            .map_err(|e| AppError::new(ErrorKind::Geo, format!("{e} ({})", path.display())))?;

        info!(path = %path.display(), regions = geo.len(), "loaded region boundaries");
        Ok(geo)
    }

    pub fn from_geojson_str(text: &str, code_property: &str) -> Result<Self, AppError> {
        let collection: FeatureCollection = serde_json::from_str(text)
            .map_err(|e| AppError::new(ErrorKind::Geo, format!("Invalid GeoJSON: {e}")))?;
        Ok(Self::from_collection(collection, code_property))
    }

    fn from_collection(collection: FeatureCollection, code_property: &str) -> Self {
        let mut regions = BTreeMap::new();
        let mut skipped = 0usize;

        for feature in collection.features {
            let Some(code) = feature.properties.get(code_property).and_then(code_string) else {
                skipped += 1;
                continue;
            };
            let rings = geometry_rings(&feature.geometry);
            if rings.is_empty() {
                skipped += 1;
                continue;
            }
            regions
                .entry(code.clone())
                .or_insert_with(|| RegionShape { code, rings: Vec::new() })
                .rings
                .extend(rings);
        }

        if skipped > 0 {
            warn!(skipped, property = code_property, "skipped GeoJSON features without code or polygon geometry");
        }

        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> impl Iterator<Item = &RegionShape> {
        self.regions.values()
    }

    /// `([lon_min, lon_max], [lat_min, lat_max])` over every ring.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut lon = [f64::INFINITY, f64::NEG_INFINITY];
        let mut lat = [f64::INFINITY, f64::NEG_INFINITY];
        for &(x, y) in self.regions().flat_map(|r| r.rings.iter()).flatten() {
            lon = [lon[0].min(x), lon[1].max(x)];
            lat = [lat[0].min(y), lat[1].max(y)];
        }
        if lon[0].is_finite() && lat[0].is_finite() && lon[1] > lon[0] && lat[1] > lat[0] {
            Some((lon, lat))
        } else {
            None
        }
    }
}

/// Lookup key for a region code: all-digit codes drop their zero padding, so
/// `2`, `"2"` and `"002"` name the same ABS.
pub fn code_key(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return code.to_string();
    }
    match code.trim_start_matches('0') {
        "" => "0".to_string(),
        digits => digits.to_string(),
    }
}

fn code_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(code_key(s)),
        Value::Number(n) => Some(code_key(&n.to_string())),
        _ => None,
    }
}

fn geometry_rings(geometry: &Value) -> Vec<Ring> {
    let coords = geometry.get("coordinates").cloned().unwrap_or(Value::Null);
    match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") => serde_json::from_value::<PolygonCoords>(coords)
            .ok()
            .and_then(outer_ring)
            .into_iter()
            .collect(),
        Some("MultiPolygon") => serde_json::from_value::<Vec<PolygonCoords>>(coords)
            .map(|polys| polys.into_iter().filter_map(outer_ring).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn outer_ring(polygon: PolygonCoords) -> Option<Ring> {
    let ring = polygon.into_iter().next()?;
    if ring.len() < 3 {
        return None;
    }
    Some(ring.into_iter().map(|[x, y]| (x, y)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"ABSCodi": "001", "NOMABS": "Alpha"},
                "geometry": {"type": "Polygon", "coordinates": [[[2.0, 41.0], [2.5, 41.0], [2.5, 41.5], [2.0, 41.0]]]}
            },
            {
                "type": "Feature",
                "properties": {"ABSCodi": 2},
                "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[1.0, 40.5], [1.5, 40.5], [1.5, 41.0], [1.0, 40.5]]],
                    [[[3.0, 42.0], [3.2, 42.0], [3.2, 42.4], [3.0, 42.0]]]
                ]}
            },
            {
                "type": "Feature",
                "properties": {"OTHER": "x"},
                "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}
            },
            {
                "type": "Feature",
                "properties": {"ABSCodi": "003"},
                "geometry": {"type": "Point", "coordinates": [2.0, 41.0]}
            }
        ]
    }"#;

    fn rings_for(geo: &GeoReference, code: &str) -> Option<usize> {
        geo.regions.get(&code_key(code)).map(|r| r.rings.len())
    }

    #[test]
    fn keys_polygons_by_code_property() {
        let geo = GeoReference::from_geojson_str(SAMPLE, "ABSCodi").unwrap();
        assert_eq!(geo.len(), 2);
        assert_eq!(rings_for(&geo, "001"), Some(1));
        assert_eq!(rings_for(&geo, "2"), Some(2));
        assert_eq!(rings_for(&geo, "003"), None);
    }

    #[test]
    fn numeric_and_padded_codes_share_a_key() {
        assert_eq!(code_key("002"), "2");
        assert_eq!(code_key(" 2 "), "2");
        assert_eq!(code_key("000"), "0");
        assert_eq!(code_key("B01"), "B01");
        assert_eq!(code_key(""), "");

        // The numeric `2` in the sample matches the CSV's `"002"`.
        let geo = GeoReference::from_geojson_str(SAMPLE, "ABSCodi").unwrap();
        assert_eq!(rings_for(&geo, "002"), Some(2));
    }

    #[test]
    fn load_reports_the_path() {
        let err = GeoReference::load(Path::new("does-not-exist.geojson"), "ABSCodi").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Geo);
        assert!(err.to_string().contains("does-not-exist.geojson"));
    }

    #[test]
    fn bounds_cover_all_rings() {
        let geo = GeoReference::from_geojson_str(SAMPLE, "ABSCodi").unwrap();
        let (lon, lat) = geo.bounds().unwrap();
        assert_eq!(lon, [1.0, 3.2]);
        assert_eq!(lat, [40.5, 42.4]);
    }

    #[test]
    fn invalid_json_is_a_geo_error() {
        let err = GeoReference::from_geojson_str("{", "ABSCodi").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Geo);
    }
}
