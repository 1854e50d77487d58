//! Point-in-polygon classification against named region collections.
//!
//! Collections come from GeoJSON-like FeatureCollection documents whose
//! features carry a region-name property and a Polygon (or MultiPolygon)
//! geometry. Only outer rings are tested; holes are not supported.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::{SolumError, SolumResult};

/// Property keys tried, in order, when extracting a feature's region name.
/// The list is the union of the keys observed across biome, state, and
/// municipality boundary files.
pub const NAME_KEYS: &[&str] = &[
    "Estado",
    "Bioma",
    "NM_MUNICIP",
    "NM_MUNICIPIO",
    "NOME",
    "municipio",
    "Municipio",
    "name",
    "Name",
    "SIGLA",
];

/// One named region: outer ring(s) of lon/lat vertices.
#[derive(Clone, Debug)]
pub struct RegionPolygon {
    pub name: String,
    outer_rings: Vec<Vec<(f64, f64)>>,
}

impl RegionPolygon {
    pub fn new(name: impl Into<String>, ring: Vec<(f64, f64)>) -> Self {
        Self {
            name: name.into(),
            outer_rings: vec![ring],
        }
    }

    /// Ray-casting containment test against any outer ring.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.outer_rings
            .iter()
            .any(|ring| point_in_ring(lon, lat, ring))
    }
}

/// Horizontal-ray crossing count: odd ⇒ inside.
fn point_in_ring(lon: f64, lat: f64, ring: &[(f64, f64)]) -> bool {
    if ring.is_empty() {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        let crosses =
            ((yi > lat) != (yj > lat)) && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi);
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// A named set of region polygons, tested in input order.
#[derive(Clone, Debug)]
pub struct PolygonCollection {
    pub name: String,
    features: Vec<RegionPolygon>,
}

impl PolygonCollection {
    pub fn new(name: impl Into<String>, features: Vec<RegionPolygon>) -> Self {
        Self {
            name: name.into(),
            features,
        }
    }

    /// Parse a GeoJSON-like FeatureCollection.
    ///
    /// Features with no resolvable name or an unsupported geometry type are
    /// skipped rather than failing the whole collection.
    pub fn from_geojson(name: impl Into<String>, doc: &Value) -> SolumResult<Self> {
        let name = name.into();
        let features = doc
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SolumError::Geometry(format!("{name}: missing features array"))
            })?;

        let mut parsed = Vec::with_capacity(features.len());
        for feature in features {
            let Some(region) = feature_name(feature) else {
                debug!(collection = %name, "skipping feature without a region name");
                continue;
            };
            let Some(rings) = feature_outer_rings(feature) else {
                debug!(collection = %name, region, "skipping feature with unsupported geometry");
                continue;
            };
            parsed.push(RegionPolygon {
                name: region,
                outer_rings: rings,
            });
        }
        Ok(Self::new(name, parsed))
    }

    /// Load and parse a boundary file from disk.
    pub fn from_path(name: impl Into<String>, path: impl AsRef<Path>) -> SolumResult<Self> {
        let name = name.into();
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| SolumError::Geometry(format!("{name}: {e}")))?;
        let doc: Value = serde_json::from_slice(&bytes)
            .map_err(|e| SolumError::Geometry(format!("{name}: {e}")))?;
        Self::from_geojson(name, &doc)
    }

    /// Region containing `(lon, lat)`, if any. Features are tested in input
    /// order and the first match wins; collections are assumed
    /// non-overlapping.
    pub fn classify(&self, lon: f64, lat: f64) -> Option<&str> {
        self.features
            .iter()
            .find(|feature| feature.contains(lon, lat))
            .map(|feature| feature.name.as_str())
    }

    /// Distinct region names, sorted.
    pub fn region_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.features.iter().map(|f| f.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Built-in coarse biome bounding boxes, for environments without the
    /// full boundary file. Boxes overlap; input order decides ties.
    pub fn builtin_biomes() -> Self {
        let boxed = |name: &str, w: f64, s: f64, e: f64, n: f64| {
            RegionPolygon::new(name, vec![(w, s), (w, n), (e, n), (e, s), (w, s)])
        };
        Self::new(
            "biomes-builtin",
            vec![
                boxed("Amazônia", -73.9, -18.0, -44.0, 5.3),
                boxed("Cerrado", -60.0, -24.0, -41.0, -2.0),
                boxed("Mata Atlântica", -54.0, -33.8, -34.8, -5.0),
                boxed("Caatinga", -48.0, -17.0, -34.8, -2.8),
                boxed("Pampa", -57.6, -33.8, -49.7, -28.0),
                boxed("Pantanal", -58.5, -22.0, -55.0, -15.0),
            ],
        )
    }
}

fn feature_name(feature: &Value) -> Option<String> {
    let properties = feature.get("properties")?;
    NAME_KEYS
        .iter()
        .find_map(|key| properties.get(key).and_then(Value::as_str))
        .map(String::from)
}

fn feature_outer_rings(feature: &Value) -> Option<Vec<Vec<(f64, f64)>>> {
    let geometry = feature.get("geometry")?;
    let coordinates = geometry.get("coordinates")?;
    match geometry.get("type").and_then(Value::as_str)? {
        "Polygon" => parse_ring(coordinates.get(0)?).map(|ring| vec![ring]),
        "MultiPolygon" => {
            let polygons = coordinates.as_array()?;
            let rings: Vec<Vec<(f64, f64)>> = polygons
                .iter()
                .filter_map(|polygon| parse_ring(polygon.get(0)?))
                .collect();
            (!rings.is_empty()).then_some(rings)
        }
        _ => None,
    }
}

fn parse_ring(value: &Value) -> Option<Vec<(f64, f64)>> {
    let vertices = value.as_array()?;
    let ring: Vec<(f64, f64)> = vertices
        .iter()
        .filter_map(|vertex| {
            let pair = vertex.as_array()?;
            Some((pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
        })
        .collect();
    (ring.len() >= 3).then_some(ring)
}
