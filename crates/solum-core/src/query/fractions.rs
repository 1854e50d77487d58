//! Granulometric fraction analysis.
//!
//! A derived view over the granulometry dataset: pick one fraction column,
//! filter by the usual categorical keys, report its distribution, and page
//! through the contributing records. The whole result is memoized — it is
//! the one query in the system that routinely touches the full corpus.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::{GranulometrySample, Query};
use crate::query::cache::{cache_key, ResultCache};
use crate::query::filter::filter_positions;
use crate::query::guards::{clamp_offset, MAX_PAGE_LIMIT};
use crate::query::stats::{distribution, Distribution};
use crate::store::corpus::Snapshot;

/// The four granulometric fraction columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fraction {
    Clay,
    Silt,
    Sand,
    Coarse,
}

impl Fraction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "clay" => Some(Fraction::Clay),
            "silt" => Some(Fraction::Silt),
            "sand" => Some(Fraction::Sand),
            "coarse" => Some(Fraction::Coarse),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Fraction::Clay => "clay",
            Fraction::Silt => "silt",
            Fraction::Sand => "sand",
            Fraction::Coarse => "coarse",
        }
    }

    /// Display label, as published by the platform.
    pub fn label(&self) -> &'static str {
        match self {
            Fraction::Clay => "Fração Argila (g/kg)",
            Fraction::Silt => "Fração Silte (g/kg)",
            Fraction::Sand => "Fração Areia (g/kg)",
            Fraction::Coarse => "Fração Grossa (g/kg)",
        }
    }

    fn value_of(&self, sample: &GranulometrySample) -> Option<f64> {
        match self {
            Fraction::Clay => sample.clay_fraction,
            Fraction::Silt => sample.silt_fraction,
            Fraction::Sand => sample.sand_fraction,
            Fraction::Coarse => sample.coarse_fraction,
        }
    }
}

/// Filter set for a fraction analysis request.
#[derive(Clone, Debug)]
pub struct FractionQuery {
    pub fraction: Fraction,
    pub biome: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    pub municipality: Option<String>,
}

impl FractionQuery {
    pub fn new(fraction: Fraction) -> Self {
        Self {
            fraction,
            biome: None,
            region: None,
            state: None,
            municipality: None,
        }
    }
}

/// Optional pagination for the sample listing; `limit: None` returns every
/// contributing record.
#[derive(Clone, Copy, Debug, Default)]
pub struct FractionPage {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One contributing record, projected flat.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FractionSample {
    pub observation_id: String,
    pub longitude: f64,
    pub latitude: f64,
    pub layer_id: i64,
    pub depth_initial: f64,
    pub depth_final: f64,
    pub fraction_value: f64,
    pub biome: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub municipality: Option<String>,
}

/// Echo of the resolved categorical filters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FractionFilters {
    pub biome: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    pub municipality: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FractionPagination {
    pub limit: usize,
    pub offset: usize,
}

/// Complete fraction analysis result; owned, so it caches safely.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FractionAnalysis {
    pub fraction: String,
    pub fraction_label: String,
    pub total: usize,
    pub returned: usize,
    pub filters: FractionFilters,
    pub statistics: Distribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<FractionPagination>,
    pub data: Vec<FractionSample>,
}

/// Run (or recall) a fraction analysis.
///
/// Records with a null or non-finite fraction value are excluded from both
/// the statistics and the listing. `total` counts the contributing records
/// before pagination.
pub fn fraction_analysis(
    snapshot: &Snapshot<GranulometrySample>,
    query: &FractionQuery,
    page: FractionPage,
    cache: &ResultCache<FractionAnalysis>,
) -> FractionAnalysis {
    let key = fraction_cache_key(query, page);
    if let Some(hit) = cache.get(&key) {
        return hit;
    }

    let mut filter = Query::new();
    for (field, value) in [
        ("biome", &query.biome),
        ("region", &query.region),
        ("state", &query.state),
        ("municipality", &query.municipality),
    ] {
        if let Some(value) = value {
            filter = filter.equals(field, value);
        }
    }
    let positions = filter_positions(snapshot, &filter);

    let mut values = Vec::new();
    let mut contributing: Vec<usize> = Vec::new();
    for &p in &positions {
        if let Some(v) = query.fraction.value_of(&snapshot.records[p]) {
            if v.is_finite() {
                values.push(v);
                contributing.push(p);
            }
        }
    }
    let statistics = distribution(&values);

    let offset = clamp_offset(page.offset);
    let limit = page
        .limit
        .map(|l| l.clamp(1, MAX_PAGE_LIMIT) as usize)
        .unwrap_or(contributing.len());
    let start = offset.min(contributing.len());
    let end = start.saturating_add(limit).min(contributing.len());

    let data: Vec<FractionSample> = contributing[start..end]
        .iter()
        .map(|&p| {
            let sample = &snapshot.records[p];
            FractionSample {
                observation_id: sample.observation_id.clone(),
                longitude: sample.longitude,
                latitude: sample.latitude,
                layer_id: sample.layer_id,
                depth_initial: sample.depth_initial,
                depth_final: sample.depth_final,
                fraction_value: query.fraction.value_of(sample).unwrap_or_default(),
                biome: sample.biome.clone(),
                state: sample.state.clone(),
                region: sample.region.clone(),
                municipality: sample.municipality.clone(),
            }
        })
        .collect();

    let analysis = FractionAnalysis {
        fraction: query.fraction.name().to_string(),
        fraction_label: query.fraction.label().to_string(),
        total: contributing.len(),
        returned: data.len(),
        filters: FractionFilters {
            biome: query.biome.clone(),
            region: query.region.clone(),
            state: query.state.clone(),
            municipality: query.municipality.clone(),
        },
        statistics,
        pagination: page.limit.map(|_| FractionPagination { limit, offset }),
        data,
    };
    cache.set(key, analysis.clone());
    analysis
}

fn fraction_cache_key(query: &FractionQuery, page: FractionPage) -> String {
    let mut pairs = vec![("fraction".to_string(), json!(query.fraction.name()))];
    for (name, value) in [
        ("biome", &query.biome),
        ("region", &query.region),
        ("state", &query.state),
        ("municipality", &query.municipality),
    ] {
        if let Some(value) = value {
            pairs.push((name.to_string(), json!(value)));
        }
    }
    if let Some(limit) = page.limit {
        pairs.push(("limit".to_string(), json!(limit)));
    }
    if let Some(offset) = page.offset {
        pairs.push(("offset".to_string(), json!(offset)));
    }
    cache_key(&pairs)
}
