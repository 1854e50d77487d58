//! Grouped counts and distributional statistics.

use indexmap::IndexMap;

use crate::models::{CorpusRecord, FieldKind, FieldValue};
use crate::query::filter::format_number;
use crate::store::corpus::Snapshot;

/// Min/max/mean/median of one numeric column, rounded to two decimals.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Distribution {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// Distribution over `values`.
///
/// Min, max, and the mean come from a single pass; the exact median needs a
/// full sort, which is acceptable on bounded per-query result sets. Empty
/// input yields all zeros.
pub fn distribution(values: &[f64]) -> Distribution {
    if values.is_empty() {
        return Distribution::default();
    }

    let mut min = values[0];
    let mut max = values[0];
    let mut sum = 0.0;
    for &v in values {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
        sum += v;
    }
    let mean = sum / values.len() as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    Distribution {
        min: round2(min),
        max: round2(max),
        mean: round2(mean),
        median: round2(median),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Count records per value of `field`, sorted by count descending.
///
/// Null values are skipped; ties keep first-seen order. Numeric labels render
/// without a trailing `.0`.
pub fn group_count<'a, R: CorpusRecord + 'a>(
    records: impl IntoIterator<Item = &'a R>,
    field: &str,
) -> Vec<(String, usize)> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for record in records {
        match record.field(field) {
            FieldValue::Text(s) => *counts.entry(s.to_string()).or_insert(0) += 1,
            FieldValue::Number(n) => *counts.entry(format_number(n)).or_insert(0) += 1,
            FieldValue::Null => {}
        }
    }
    let mut groups: Vec<(String, usize)> = counts.into_iter().collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1));
    groups
}

/// Distinct values of `field`, sorted; numeric fields sort by value.
pub fn distinct_values<'a, R: CorpusRecord + 'a>(
    records: impl IntoIterator<Item = &'a R>,
    field: &str,
) -> Vec<String> {
    let numeric = matches!(
        R::field_spec(field).map(|spec| spec.kind),
        Some(FieldKind::Numeric)
    );
    let mut seen: Vec<(Option<f64>, String)> = Vec::new();
    for record in records {
        let entry = match record.field(field) {
            FieldValue::Text(s) => (None, s.to_string()),
            FieldValue::Number(n) => (numeric.then_some(n), format_number(n)),
            FieldValue::Null => continue,
        };
        if !seen.iter().any(|(_, label)| *label == entry.1) {
            seen.push(entry);
        }
    }
    seen.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.1.cmp(&b.1),
    });
    seen.into_iter().map(|(_, label)| label).collect()
}

/// Per-field available filter values: the `summary` payload.
#[derive(Clone, Debug, serde::Serialize)]
pub struct DatasetSummary {
    pub total: usize,
    /// Categorical field name → distinct sorted values.
    pub filters: IndexMap<String, Vec<String>>,
}

/// Distinct values for every indexed categorical field of the shape.
pub fn dataset_summary<R: CorpusRecord>(snapshot: &Snapshot<R>) -> DatasetSummary {
    let mut filters = IndexMap::new();
    for spec in R::schema().iter().filter(|spec| spec.index.is_some()) {
        filters.insert(
            spec.name.to_string(),
            distinct_values(&snapshot.records, spec.name),
        );
    }
    DatasetSummary {
        total: snapshot.len(),
        filters,
    }
}

/// Group counts for every indexed categorical field of the shape.
///
/// Text fields order by count descending; numeric categorical fields (layer,
/// year) order by value ascending, matching the shape of the published
/// statistics payloads.
pub fn dataset_stats<R: CorpusRecord>(
    snapshot: &Snapshot<R>,
) -> IndexMap<String, Vec<(String, usize)>> {
    let mut stats = IndexMap::new();
    for spec in R::schema().iter().filter(|spec| spec.index.is_some()) {
        let mut groups = group_count(&snapshot.records, spec.name);
        if spec.kind == FieldKind::Numeric {
            groups.sort_by(|a, b| {
                let x: f64 = a.0.parse().unwrap_or(f64::MAX);
                let y: f64 = b.0.parse().unwrap_or(f64::MAX);
                x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        stats.insert(spec.name.to_string(), groups);
    }
    stats
}
