//! Shared typed models used across the store, query, and geo layers.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field schema description
// ---------------------------------------------------------------------------

/// Value class of a record field, as seen by filters and sorts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Numeric,
}

/// One queryable field of a record shape.
///
/// `index` names the categorical index (e.g. `"byDataset"`) the corpus file
/// may carry for this field; `None` means the field is never indexed and
/// every predicate on it is a linear scan.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub index: Option<&'static str>,
}

impl FieldSpec {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            index: None,
        }
    }

    const fn text_indexed(name: &'static str, index: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            index: Some(index),
        }
    }

    const fn numeric(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Numeric,
            index: None,
        }
    }

    const fn numeric_indexed(name: &'static str, index: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Numeric,
            index: Some(index),
        }
    }
}

/// A record field value surfaced to the generic engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Null,
}

impl<'a> FieldValue<'a> {
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    fn from_opt_text(value: &'a Option<String>) -> Self {
        match value {
            Some(s) => FieldValue::Text(s),
            None => FieldValue::Null,
        }
    }

    fn from_opt_number(value: &Option<f64>) -> Self {
        match value {
            Some(n) => FieldValue::Number(*n),
            None => FieldValue::Null,
        }
    }
}

/// Structural contract shared by the three dataset record shapes.
///
/// The filter, sort, pagination, and statistics engines are generic over
/// this trait: a record declares its queryable fields once and exposes them
/// dynamically by name.
pub trait CorpusRecord:
    Clone + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Queryable fields of this shape, in declaration order.
    fn schema() -> &'static [FieldSpec];

    /// Look up a field by its schema name. Unknown names yield `Null`.
    fn field(&self, name: &str) -> FieldValue<'_>;

    /// Schema entry for `name`, if any.
    fn field_spec(name: &str) -> Option<&'static FieldSpec> {
        Self::schema().iter().find(|spec| spec.name == name)
    }

    /// Corpus index name backing `field`, if the schema declares one.
    fn index_name(field: &str) -> Option<&'static str> {
        Self::field_spec(field).and_then(|spec| spec.index)
    }
}

// ---------------------------------------------------------------------------
// 1. SoilPoint
// ---------------------------------------------------------------------------

/// One enriched soil observation point (compact-key corpus shape).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SoilPoint {
    pub id: String,
    #[serde(rename = "lon")]
    pub longitude: f64,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "d")]
    pub depth: Option<f64>,
    #[serde(rename = "lcs")]
    pub log_clay_sand: Option<f64>,
    #[serde(rename = "lss")]
    pub log_silt_sand: Option<f64>,
    #[serde(rename = "dc")]
    pub dataset_code: String,
    #[serde(rename = "st")]
    pub state: Option<String>,
    #[serde(rename = "mu")]
    pub municipality: Option<String>,
    #[serde(rename = "bi")]
    pub biome: Option<String>,
    #[serde(rename = "ti")]
    pub title: String,
    pub doi: Option<String>,
    pub url: String,
    #[serde(rename = "csv")]
    pub csv_uri: String,
}

const SOIL_POINT_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("id"),
    FieldSpec::text_indexed("datasetCode", "byDataset"),
    FieldSpec::text_indexed("state", "byState"),
    FieldSpec::text_indexed("municipality", "byMunicipality"),
    FieldSpec::text_indexed("biome", "byBiome"),
    FieldSpec::text("title"),
    FieldSpec::numeric("longitude"),
    FieldSpec::numeric("latitude"),
    FieldSpec::numeric("depth"),
    FieldSpec::numeric("logClaySand"),
    FieldSpec::numeric("logSiltSand"),
];

impl CorpusRecord for SoilPoint {
    fn schema() -> &'static [FieldSpec] {
        SOIL_POINT_FIELDS
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => FieldValue::Text(&self.id),
            "datasetCode" => FieldValue::Text(&self.dataset_code),
            "state" => FieldValue::from_opt_text(&self.state),
            "municipality" => FieldValue::from_opt_text(&self.municipality),
            "biome" => FieldValue::from_opt_text(&self.biome),
            "title" => FieldValue::Text(&self.title),
            "longitude" => FieldValue::Number(self.longitude),
            "latitude" => FieldValue::Number(self.latitude),
            "depth" => FieldValue::from_opt_number(&self.depth),
            "logClaySand" => FieldValue::from_opt_number(&self.log_clay_sand),
            "logSiltSand" => FieldValue::from_opt_number(&self.log_silt_sand),
            _ => FieldValue::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// 2. GranulometrySample
// ---------------------------------------------------------------------------

/// One granulometric laboratory sample (camelCase corpus shape).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GranulometrySample {
    pub dataset_id: String,
    pub observation_id: String,
    pub longitude: f64,
    pub latitude: f64,
    pub layer_id: i64,
    pub depth_initial: f64,
    pub depth_final: f64,
    pub coarse_fraction: Option<f64>,
    pub clay_fraction: Option<f64>,
    pub silt_fraction: Option<f64>,
    pub sand_fraction: Option<f64>,
    pub biome: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub municipality: Option<String>,
}

const GRANULOMETRY_FIELDS: &[FieldSpec] = &[
    FieldSpec::text_indexed("datasetId", "byDataset"),
    FieldSpec::text("observationId"),
    FieldSpec::text_indexed("biome", "byBiome"),
    FieldSpec::text_indexed("state", "byState"),
    FieldSpec::text_indexed("region", "byRegion"),
    FieldSpec::text_indexed("municipality", "byMunicipality"),
    FieldSpec::numeric_indexed("layerId", "byLayer"),
    FieldSpec::numeric("longitude"),
    FieldSpec::numeric("latitude"),
    FieldSpec::numeric("depthInitial"),
    FieldSpec::numeric("depthFinal"),
    FieldSpec::numeric("coarseFraction"),
    FieldSpec::numeric("clayFraction"),
    FieldSpec::numeric("siltFraction"),
    FieldSpec::numeric("sandFraction"),
];

impl CorpusRecord for GranulometrySample {
    fn schema() -> &'static [FieldSpec] {
        GRANULOMETRY_FIELDS
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "datasetId" => FieldValue::Text(&self.dataset_id),
            "observationId" => FieldValue::Text(&self.observation_id),
            "biome" => FieldValue::from_opt_text(&self.biome),
            "state" => FieldValue::from_opt_text(&self.state),
            "region" => FieldValue::from_opt_text(&self.region),
            "municipality" => FieldValue::from_opt_text(&self.municipality),
            "layerId" => FieldValue::Number(self.layer_id as f64),
            "longitude" => FieldValue::Number(self.longitude),
            "latitude" => FieldValue::Number(self.latitude),
            "depthInitial" => FieldValue::Number(self.depth_initial),
            "depthFinal" => FieldValue::Number(self.depth_final),
            "coarseFraction" => FieldValue::from_opt_number(&self.coarse_fraction),
            "clayFraction" => FieldValue::from_opt_number(&self.clay_fraction),
            "siltFraction" => FieldValue::from_opt_number(&self.silt_fraction),
            "sandFraction" => FieldValue::from_opt_number(&self.sand_fraction),
            _ => FieldValue::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// 3. PsdRecord
// ---------------------------------------------------------------------------

/// One particle-size-distribution row.
///
/// The corpus file keeps the upstream Portuguese column names; queries use
/// the English schema names.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PsdRecord {
    pub dataset_id: String,
    #[serde(rename = "observacao_id")]
    pub observation_id: String,
    #[serde(rename = "longitude_grau")]
    pub longitude: f64,
    #[serde(rename = "latitude_grau")]
    pub latitude: f64,
    #[serde(rename = "ano")]
    pub year: i64,
    #[serde(rename = "camada_id")]
    pub layer_id: i64,
    #[serde(rename = "profundidade_inicial_cm")]
    pub depth_initial: f64,
    #[serde(rename = "profundidade_final_cm")]
    pub depth_final: f64,
    #[serde(rename = "fracao_grossa_gkg")]
    pub coarse_fraction: f64,
    #[serde(rename = "fracao_argila_gkg")]
    pub clay_fraction: f64,
    #[serde(rename = "fracao_silte_gkg")]
    pub silt_fraction: f64,
    #[serde(rename = "fracao_areia_gkg")]
    pub sand_fraction: f64,
    pub biome: Option<String>,
}

const PSD_FIELDS: &[FieldSpec] = &[
    FieldSpec::text_indexed("datasetId", "byDataset"),
    FieldSpec::text("observationId"),
    FieldSpec::text_indexed("biome", "byBiome"),
    FieldSpec::numeric_indexed("year", "byYear"),
    FieldSpec::numeric("layerId"),
    FieldSpec::numeric("longitude"),
    FieldSpec::numeric("latitude"),
    FieldSpec::numeric("depthInitial"),
    FieldSpec::numeric("depthFinal"),
    FieldSpec::numeric("coarseFraction"),
    FieldSpec::numeric("clayFraction"),
    FieldSpec::numeric("siltFraction"),
    FieldSpec::numeric("sandFraction"),
];

impl CorpusRecord for PsdRecord {
    fn schema() -> &'static [FieldSpec] {
        PSD_FIELDS
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "datasetId" => FieldValue::Text(&self.dataset_id),
            "observationId" => FieldValue::Text(&self.observation_id),
            "biome" => FieldValue::from_opt_text(&self.biome),
            "year" => FieldValue::Number(self.year as f64),
            "layerId" => FieldValue::Number(self.layer_id as f64),
            "longitude" => FieldValue::Number(self.longitude),
            "latitude" => FieldValue::Number(self.latitude),
            "depthInitial" => FieldValue::Number(self.depth_initial),
            "depthFinal" => FieldValue::Number(self.depth_final),
            "coarseFraction" => FieldValue::Number(self.coarse_fraction),
            "clayFraction" => FieldValue::Number(self.clay_fraction),
            "siltFraction" => FieldValue::Number(self.silt_fraction),
            "sandFraction" => FieldValue::Number(self.sand_fraction),
            _ => FieldValue::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Query model
// ---------------------------------------------------------------------------

/// Sort direction; ascending when unspecified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Single-key sort declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub by: String,
    pub order: SortOrder,
}

/// Inclusive numeric bounds on one field; either side may be open.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeBound {
    pub field: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// A filter/sort/pagination request against one dataset.
///
/// Categorical `equals` predicates apply in their declared order — the first
/// one is eligible for the index fast path. All values arrive as strings;
/// canonicalization (case folding) happens inside the pipeline.
#[derive(Clone, Debug, Default)]
pub struct Query {
    pub equals: Vec<(String, String)>,
    pub contains: Vec<(String, String)>,
    pub ranges: Vec<RangeBound>,
    pub sort: Option<SortSpec>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: &str, value: &str) -> Self {
        self.equals.push((field.to_string(), value.to_string()));
        self
    }

    pub fn contains(mut self, field: &str, needle: &str) -> Self {
        self.contains.push((field.to_string(), needle.to_string()));
        self
    }

    pub fn range(mut self, field: &str, min: Option<f64>, max: Option<f64>) -> Self {
        self.ranges.push(RangeBound {
            field: field.to_string(),
            min,
            max,
        });
        self
    }

    pub fn sort_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort = Some(SortSpec {
            by: field.to_string(),
            order,
        });
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// One paginated result window borrowed from a snapshot.
///
/// `total` counts the post-filter, pre-pagination subset; `returned` is the
/// window length.
#[derive(Debug, Serialize)]
pub struct Page<'a, R> {
    pub total: usize,
    pub returned: usize,
    pub limit: usize,
    pub offset: usize,
    pub records: Vec<&'a R>,
}

/// An owned page, suitable for memoization — cache entries hold values,
/// never snapshot positions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OwnedPage<R> {
    pub total: usize,
    pub returned: usize,
    pub limit: usize,
    pub offset: usize,
    pub records: Vec<R>,
}

impl<'a, R: Clone> Page<'a, R> {
    pub fn to_owned(&self) -> OwnedPage<R> {
        OwnedPage {
            total: self.total,
            returned: self.returned,
            limit: self.limit,
            offset: self.offset,
            records: self.records.iter().map(|r| (*r).clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_point_json() -> &'static str {
        r#"{
            "id": "ctb0003-P-01",
            "lon": -47.53, "lat": -15.61, "d": 20.0,
            "lcs": -0.12, "lss": null,
            "dc": "ctb0003", "st": "GO", "mu": "Goiânia", "bi": "Cerrado",
            "ti": "Conjunto de dados", "doi": null,
            "url": "https://soildata.example/ctb0003",
            "csv": "data:text/csv;base64,"
        }"#
    }

    #[test]
    fn soil_point_parses_compact_keys() {
        let point: SoilPoint = serde_json::from_str(sample_point_json()).unwrap();
        assert_eq!(point.dataset_code, "ctb0003");
        assert_eq!(point.state.as_deref(), Some("GO"));
        assert_eq!(point.depth, Some(20.0));
        assert!(point.doi.is_none());
    }

    #[test]
    fn field_accessor_matches_schema_names() {
        let point: SoilPoint = serde_json::from_str(sample_point_json()).unwrap();
        assert_eq!(point.field("biome").as_text(), Some("Cerrado"));
        assert_eq!(point.field("latitude").as_number(), Some(-15.61));
        assert!(point.field("logSiltSand").is_null());
        assert!(point.field("noSuchField").is_null());
    }

    #[test]
    fn schema_declares_index_names() {
        assert_eq!(SoilPoint::index_name("biome"), Some("byBiome"));
        assert_eq!(GranulometrySample::index_name("layerId"), Some("byLayer"));
        assert_eq!(PsdRecord::index_name("year"), Some("byYear"));
        assert_eq!(GranulometrySample::index_name("depthFinal"), None);
        assert_eq!(SoilPoint::index_name("unknown"), None);
    }

    #[test]
    fn psd_record_uses_upstream_column_names() {
        let raw = r#"{
            "dataset_id": "ctb0030", "observacao_id": "obs-1",
            "longitude_grau": -51.2, "latitude_grau": -29.9,
            "ano": 2011, "camada_id": 1,
            "profundidade_inicial_cm": 0, "profundidade_final_cm": 20,
            "fracao_grossa_gkg": 10, "fracao_argila_gkg": 320,
            "fracao_silte_gkg": 280, "fracao_areia_gkg": 400,
            "biome": "Pampa"
        }"#;
        let record: PsdRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.year, 2011);
        assert_eq!(record.field("year").as_number(), Some(2011.0));
        assert_eq!(record.field("datasetId").as_text(), Some("ctb0030"));
    }
}
