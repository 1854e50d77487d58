//! Geospatial classification of observation coordinates.
//!
//! Bundles the biome, state, and municipality polygon collections and
//! derives the macro-region from the classified state. A collection that
//! failed to load is simply absent: its layer classifies to `None`, which is
//! a valid domain outcome (a coordinate may fall in international waters),
//! not an error.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geo::polygon::PolygonCollection;
use crate::geo::regions::macro_region_of;

/// Per-point classification across every loaded layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteClassification {
    pub biome: Option<String>,
    pub state: Option<String>,
    pub municipality: Option<String>,
    pub region: Option<String>,
}

/// Point classifier over optional boundary layers.
#[derive(Default)]
pub struct GeoClassifier {
    biomes: Option<PolygonCollection>,
    states: Option<PolygonCollection>,
    municipalities: Option<PolygonCollection>,
}

impl GeoClassifier {
    /// Classifier with no layers loaded; every lookup yields `None`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_biomes(mut self, collection: PolygonCollection) -> Self {
        self.biomes = Some(collection);
        self
    }

    pub fn with_states(mut self, collection: PolygonCollection) -> Self {
        self.states = Some(collection);
        self
    }

    pub fn with_municipalities(mut self, collection: PolygonCollection) -> Self {
        self.municipalities = Some(collection);
        self
    }

    /// Attach a layer from a load attempt, logging and dropping the layer on
    /// failure instead of propagating it.
    pub fn with_layer(
        self,
        layer: Layer,
        loaded: crate::errors::SolumResult<PolygonCollection>,
    ) -> Self {
        match loaded {
            Ok(collection) => match layer {
                Layer::Biomes => self.with_biomes(collection),
                Layer::States => self.with_states(collection),
                Layer::Municipalities => self.with_municipalities(collection),
            },
            Err(err) => {
                warn!(layer = ?layer, error = %err, "boundary layer unavailable");
                self
            }
        }
    }

    pub fn biome_of(&self, lon: f64, lat: f64) -> Option<&str> {
        self.biomes.as_ref().and_then(|c| c.classify(lon, lat))
    }

    pub fn state_of(&self, lon: f64, lat: f64) -> Option<&str> {
        self.states.as_ref().and_then(|c| c.classify(lon, lat))
    }

    pub fn municipality_of(&self, lon: f64, lat: f64) -> Option<&str> {
        self.municipalities
            .as_ref()
            .and_then(|c| c.classify(lon, lat))
    }

    /// Classify one coordinate pair against every loaded layer.
    ///
    /// The macro-region comes from the classified state name, never from
    /// geometry.
    pub fn classify(&self, lon: f64, lat: f64) -> SiteClassification {
        let state = self.state_of(lon, lat).map(String::from);
        let region = state
            .as_deref()
            .and_then(macro_region_of)
            .map(String::from);
        SiteClassification {
            biome: self.biome_of(lon, lat).map(String::from),
            municipality: self.municipality_of(lon, lat).map(String::from),
            state,
            region,
        }
    }

    /// Classify a batch of coordinates in parallel.
    ///
    /// Used by corpus construction, where a run covers tens of thousands of
    /// points against thousands of municipality polygons. Falls back to a
    /// sequential pass when the thread pool cannot be built.
    pub fn classify_many(&self, coords: &[(f64, f64)], workers: usize) -> Vec<SiteClassification> {
        if coords.is_empty() {
            return Vec::new();
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build();
        match pool {
            Ok(pool) => pool.install(|| {
                coords
                    .par_iter()
                    .map(|&(lon, lat)| self.classify(lon, lat))
                    .collect()
            }),
            Err(_) => coords
                .iter()
                .map(|&(lon, lat)| self.classify(lon, lat))
                .collect(),
        }
    }
}

/// Boundary layer identifiers, mostly for log lines.
#[derive(Clone, Copy, Debug)]
pub enum Layer {
    Biomes,
    States,
    Municipalities,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SolumError;
    use crate::geo::polygon::RegionPolygon;

    fn square(name: &str, x: f64, y: f64) -> RegionPolygon {
        RegionPolygon::new(
            name,
            vec![(x, y), (x, y + 1.0), (x + 1.0, y + 1.0), (x + 1.0, y)],
        )
    }

    fn classifier() -> GeoClassifier {
        GeoClassifier::new()
            .with_biomes(PolygonCollection::new("biomes", vec![square("Cerrado", 0.0, 0.0)]))
            .with_states(PolygonCollection::new("states", vec![square("Goiás", 0.0, 0.0)]))
            .with_municipalities(PolygonCollection::new(
                "municipalities",
                vec![square("Goiânia", 0.0, 0.0)],
            ))
    }

    #[test]
    fn classifies_every_layer_and_derives_region() {
        let result = classifier().classify(0.5, 0.5);
        assert_eq!(
            result,
            SiteClassification {
                biome: Some("Cerrado".to_string()),
                state: Some("Goiás".to_string()),
                municipality: Some("Goiânia".to_string()),
                region: Some("Centro-Oeste".to_string()),
            }
        );
    }

    #[test]
    fn outside_every_polygon_is_all_none() {
        let result = classifier().classify(5.0, 5.0);
        assert_eq!(result, SiteClassification::default());
    }

    #[test]
    fn missing_layer_classifies_to_none() {
        let partial = GeoClassifier::new()
            .with_biomes(PolygonCollection::new("biomes", vec![square("Pampa", 0.0, 0.0)]));
        let result = partial.classify(0.5, 0.5);
        assert_eq!(result.biome.as_deref(), Some("Pampa"));
        assert!(result.state.is_none());
        assert!(result.region.is_none());
        assert!(result.municipality.is_none());
    }

    #[test]
    fn failed_layer_load_degrades_silently() {
        let classifier = GeoClassifier::new().with_layer(
            Layer::States,
            Err(SolumError::Geometry("file missing".to_string())),
        );
        assert!(classifier.state_of(0.5, 0.5).is_none());
    }

    #[test]
    fn unmapped_state_leaves_region_unset() {
        let classifier = GeoClassifier::new()
            .with_states(PolygonCollection::new("states", vec![square("Terra Incognita", 0.0, 0.0)]));
        let result = classifier.classify(0.5, 0.5);
        assert_eq!(result.state.as_deref(), Some("Terra Incognita"));
        assert!(result.region.is_none());
    }

    #[test]
    fn batch_classification_matches_single_calls() {
        let classifier = classifier();
        let coords = vec![(0.5, 0.5), (5.0, 5.0), (0.1, 0.9)];
        let batch = classifier.classify_many(&coords, 2);
        let single: Vec<SiteClassification> = coords
            .iter()
            .map(|&(lon, lat)| classifier.classify(lon, lat))
            .collect();
        assert_eq!(batch, single);
    }

    #[test]
    fn empty_batch_is_empty() {
        assert!(classifier().classify_many(&[], 4).is_empty());
    }
}
